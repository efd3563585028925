// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use crate::stack::types::ChainFamily;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumAccount {
    pub address: String,
    pub private_key: String,

    // only present when the stack runs a private transaction manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptm_public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TezosAccount {
    pub address: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardanoAccount {
    pub address: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricAccount {
    pub name: String,
    pub org_name: String,
}

/// Chain specific identity of a member.
///
/// Serialised without a tag so the on-disk `stack.json` stays readable by other tooling.
/// Because of that, it can only be deserialised through [Account::parse] which takes the
/// chain family of the owning stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Account {
    Ethereum(EthereumAccount),
    Tezos(TezosAccount),
    Cardano(CardanoAccount),
    Fabric(FabricAccount),
}

fn required_string(
    family: ChainFamily,
    map: &Map<String, Value>,
    key: &str,
) -> Result<String, OrchestratorError> {
    match map.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(OrchestratorError::MalformedAccount {
            family: family.to_string(),
            reason: format!("'{key}' is not a string"),
        }),
        None => Err(OrchestratorError::MalformedAccount {
            family: family.to_string(),
            reason: format!("'{key}' is missing"),
        }),
    }
}

impl Account {
    pub fn parse(family: ChainFamily, raw: &Value) -> Result<Account, OrchestratorError> {
        let Value::Object(map) = raw else {
            return Err(OrchestratorError::MalformedAccount {
                family: family.to_string(),
                reason: "account is not a JSON object".to_string(),
            });
        };

        let account = match family {
            ChainFamily::Ethereum => {
                let ptm_public_key = match map.get("ptmPublicKey") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(key)) if key.is_empty() => None,
                    Some(Value::String(key)) => Some(key.clone()),
                    Some(_) => {
                        return Err(OrchestratorError::MalformedAccount {
                            family: family.to_string(),
                            reason: "'ptmPublicKey' is not a string".to_string(),
                        })
                    }
                };
                Account::Ethereum(EthereumAccount {
                    address: required_string(family, map, "address")?,
                    private_key: required_string(family, map, "privateKey")?,
                    ptm_public_key,
                })
            }
            ChainFamily::Tezos => Account::Tezos(TezosAccount {
                address: required_string(family, map, "address")?,
                private_key: required_string(family, map, "privateKey")?,
            }),
            ChainFamily::Cardano => Account::Cardano(CardanoAccount {
                address: required_string(family, map, "address")?,
                private_key: required_string(family, map, "privateKey")?,
            }),
            ChainFamily::Fabric => Account::Fabric(FabricAccount {
                name: required_string(family, map, "name")?,
                org_name: required_string(family, map, "orgName")?,
            }),
        };
        Ok(account)
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            Account::Ethereum(_) => ChainFamily::Ethereum,
            Account::Tezos(_) => ChainFamily::Tezos,
            Account::Cardano(_) => ChainFamily::Cardano,
            Account::Fabric(_) => ChainFamily::Fabric,
        }
    }

    /// Address (or identity name for Fabric) the account is known by on chain.
    pub fn identifier(&self) -> &str {
        match self {
            Account::Ethereum(account) => &account.address,
            Account::Tezos(account) => &account.address,
            Account::Cardano(account) => &account.address,
            Account::Fabric(account) => &account.name,
        }
    }

    fn mismatch(&self, expected: ChainFamily) -> OrchestratorError {
        OrchestratorError::AccountTypeMismatch {
            expected: expected.to_string(),
            actual: self.family().to_string(),
        }
    }

    pub fn as_ethereum(&self) -> Result<&EthereumAccount, OrchestratorError> {
        match self {
            Account::Ethereum(account) => Ok(account),
            other => Err(other.mismatch(ChainFamily::Ethereum)),
        }
    }

    pub fn as_fabric(&self) -> Result<&FabricAccount, OrchestratorError> {
        match self {
            Account::Fabric(account) => Ok(account),
            other => Err(other.mismatch(ChainFamily::Fabric)),
        }
    }

    pub fn as_tezos(&self) -> Result<&TezosAccount, OrchestratorError> {
        match self {
            Account::Tezos(account) => Ok(account),
            other => Err(other.mismatch(ChainFamily::Tezos)),
        }
    }

    pub fn as_cardano(&self) -> Result<&CardanoAccount, OrchestratorError> {
        match self {
            Account::Cardano(account) => Ok(account),
            other => Err(other.mismatch(ChainFamily::Cardano)),
        }
    }
}
