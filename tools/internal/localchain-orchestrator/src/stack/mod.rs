// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use crate::helpers::{path_exists, read_file, write_file};
use crate::stack::account::Account;
use crate::stack::naming::{MemberPorts, ResourceNames};
use crate::stack::types::{
    ChainFamily, ConnectorKind, Consensus, Database, NodeProvider, PrivateTransactionManager,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod account;
pub mod manager;
pub mod naming;
pub mod types;

pub const STACK_FILENAME: &str = "stack.json";
pub const STACK_STATE_FILENAME: &str = "stackState.json";
pub const INIT_DIR: &str = "init";
pub const RUNTIME_DIR: &str = "runtime";

// the original default, before the chain id could be customised
pub const DEFAULT_CHAIN_ID: i64 = 2021;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub index: usize,

    // resolved through `Account::parse` once the owning stack (and thus chain family) is known
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,

    #[serde(flatten)]
    pub ports: MemberPorts,

    #[serde(default)]
    pub external: bool,

    pub org_name: String,
    pub node_name: String,
}

impl Member {
    pub fn account(&self) -> Result<&Account, OrchestratorError> {
        self.account
            .as_ref()
            .ok_or_else(|| OrchestratorError::InvalidStack {
                message: format!("member {} has no account", self.id),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: String,
    pub location: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDeploymentResult {
    pub message: Option<String>,
    pub deployed_contract: DeployedContract,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackState {
    pub deployed_contracts: Vec<DeployedContract>,
    pub accounts: Vec<Account>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStackState {
    #[serde(default)]
    deployed_contracts: Vec<DeployedContract>,
    #[serde(default)]
    accounts: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: String,
    pub members: Vec<Member>,
    pub exposed_blockchain_port: u16,

    #[serde(default)]
    pub exposed_ptm_port: u16,

    #[serde(default)]
    pub database: Database,

    pub blockchain_provider: ChainFamily,
    pub blockchain_connector: ConnectorKind,
    pub blockchain_node_provider: NodeProvider,

    #[serde(default)]
    pub consensus: Consensus,

    #[serde(default)]
    pub private_transaction_manager: PrivateTransactionManager,

    #[serde(default)]
    pub prometheus_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    #[serde(rename = "chainID", default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<i64>,

    #[serde(rename = "remoteNodeURL", default, skip_serializing_if = "Option::is_none")]
    pub remote_node_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockfrost_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockfrost_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,

    #[serde(skip)]
    pub stack_dir: PathBuf,

    #[serde(skip)]
    pub init_dir: PathBuf,

    #[serde(skip)]
    pub runtime_dir: PathBuf,

    #[serde(skip)]
    pub state: StackState,
}

impl Stack {
    /// Assigns the on-disk locations of this stack under the provided stacks directory.
    pub fn with_paths<P: AsRef<Path>>(mut self, stacks_dir: P) -> Self {
        self.stack_dir = stacks_dir.as_ref().join(&self.name);
        self.init_dir = self.stack_dir.join(INIT_DIR);
        self.runtime_dir = self.stack_dir.join(RUNTIME_DIR);
        self
    }

    pub fn chain_id(&self) -> i64 {
        self.chain_id.unwrap_or(DEFAULT_CHAIN_ID)
    }

    pub fn names(&self) -> ResourceNames<'_> {
        ResourceNames::new(&self.name)
    }

    /// A stack has run before once its init directory got promoted to the runtime directory.
    pub fn has_run_before(&self) -> Result<bool, OrchestratorError> {
        path_exists(&self.runtime_dir)
    }

    /// Directory new artifacts should be written to given the current lifecycle stage.
    pub fn active_dir(&self) -> Result<&Path, OrchestratorError> {
        if self.has_run_before()? {
            Ok(&self.runtime_dir)
        } else {
            Ok(&self.init_dir)
        }
    }

    pub fn member_by_org(&self, org_name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.org_name == org_name)
    }

    pub fn member_index_by_address(&self, address: &str) -> Option<usize> {
        self.members
            .iter()
            .find(|m| {
                m.account
                    .as_ref()
                    .is_some_and(|account| account.identifier().eq_ignore_ascii_case(address))
            })
            .map(|m| m.index)
    }

    pub fn first_local_member(&self) -> Option<&Member> {
        self.members.iter().find(|m| !m.external)
    }

    pub fn save(&self) -> Result<(), OrchestratorError> {
        let path = self.stack_dir.join(STACK_FILENAME);
        write_file(&path, serde_json::to_vec_pretty(self)?)?;
        debug!("saved stack definition to {}", path.display());
        Ok(())
    }

    pub fn save_state(&self) -> Result<(), OrchestratorError> {
        let path = self.stack_dir.join(STACK_STATE_FILENAME);
        write_file(&path, serde_json::to_vec_pretty(&self.state)?)
    }

    pub fn load<P: AsRef<Path>>(stacks_dir: P, name: &str) -> Result<Stack, OrchestratorError> {
        let stack_dir = stacks_dir.as_ref().join(name);
        let stack_file = stack_dir.join(STACK_FILENAME);
        if !path_exists(&stack_file)? {
            return Err(OrchestratorError::StackNotFound {
                name: name.to_string(),
            });
        }

        let raw: Value = serde_json::from_slice(&read_file(&stack_file)?)?;
        let mut stack: Stack = serde_json::from_value(raw.clone())?;
        let family = stack.blockchain_provider;

        let raw_members = raw
            .get("members")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for (member, raw_member) in stack.members.iter_mut().zip(raw_members) {
            member.account = match raw_member.get("account") {
                Some(raw_account) => Some(Account::parse(family, raw_account)?),
                None => None,
            };
        }

        let mut stack = stack.with_paths(stacks_dir);
        let state_file = stack.stack_dir.join(STACK_STATE_FILENAME);
        if path_exists(&state_file)? {
            let raw_state: RawStackState = serde_json::from_slice(&read_file(&state_file)?)?;
            stack.state = StackState {
                deployed_contracts: raw_state.deployed_contracts,
                accounts: raw_state
                    .accounts
                    .iter()
                    .map(|raw| Account::parse(family, raw))
                    .collect::<Result<_, _>>()?,
            };
        }
        debug!("loaded stack '{name}' from {}", stack_dir.display());
        Ok(stack)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::stack::account::EthereumAccount;

    pub(crate) fn ethereum_member(index: usize, address: &str) -> Member {
        Member {
            id: index.to_string(),
            index,
            account: Some(Account::Ethereum(EthereumAccount {
                address: address.to_string(),
                private_key: format!("0x{}", "11".repeat(32)),
                ptm_public_key: None,
            })),
            ports: MemberPorts::compute(5100, 5000, index, false).unwrap(),
            external: false,
            org_name: format!("org_{index}"),
            node_name: format!("node_{index}"),
        }
    }

    pub(crate) fn stack(
        stacks_dir: &Path,
        family: ChainFamily,
        connector: ConnectorKind,
        node_provider: NodeProvider,
        members: Vec<Member>,
    ) -> Stack {
        Stack {
            name: "dev".to_string(),
            members,
            exposed_blockchain_port: 5100,
            exposed_ptm_port: 4100,
            database: Database::Sqlite3,
            blockchain_provider: family,
            blockchain_connector: connector,
            blockchain_node_provider: node_provider,
            consensus: Consensus::Clique,
            private_transaction_manager: PrivateTransactionManager::None,
            prometheus_enabled: false,
            contract_address: None,
            chain_id: None,
            remote_node_url: None,
            request_timeout: None,
            network: None,
            blockfrost_key: None,
            blockfrost_base_url: None,
            socket: None,
            stack_dir: PathBuf::new(),
            init_dir: PathBuf::new(),
            runtime_dir: PathBuf::new(),
            state: StackState::default(),
        }
        .with_paths(stacks_dir)
    }
}
