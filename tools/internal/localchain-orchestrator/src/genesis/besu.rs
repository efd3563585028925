// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::genesis::{
    extra_data, resolve_block_period, PREFUNDED_BALANCE, ZERO_ADDRESS, ZERO_HASH,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BESU_DEFAULT_BLOCK_PERIOD: i64 = 5;
pub const CLIQUE_EPOCH_LENGTH: u64 = 30000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueConfig {
    pub epochlength: u64,
    pub blockperiodseconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(rename = "chainId")]
    pub chain_id: i64,
    pub constantinoplefixblock: u64,
    pub clique: CliqueConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alloc {
    pub balance: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BTreeMap<String, String>>,
}

/// Genesis document in the schema understood by Hyperledger Besu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    pub config: GenesisConfig,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    pub alloc: BTreeMap<String, Alloc>,
    pub number: String,
    pub gas_used: String,
    pub parent_hash: String,
}

impl Genesis {
    pub fn new<S: AsRef<str>>(addresses: &[S], block_period: i64, chain_id: i64) -> Self {
        let alloc = addresses
            .iter()
            .map(|address| {
                (
                    address.as_ref().to_string(),
                    Alloc {
                        balance: PREFUNDED_BALANCE.to_string(),
                        code: None,
                        storage: None,
                    },
                )
            })
            .collect();

        Genesis {
            config: GenesisConfig {
                chain_id,
                constantinoplefixblock: 0,
                clique: CliqueConfig {
                    epochlength: CLIQUE_EPOCH_LENGTH,
                    blockperiodseconds: resolve_block_period(
                        block_period,
                        BESU_DEFAULT_BLOCK_PERIOD,
                    ),
                },
            },
            nonce: "0x0".to_string(),
            timestamp: "0x5c51a607".to_string(),
            extra_data: extra_data(addresses),
            gas_limit: "0xffffffff".to_string(),
            difficulty: "0x1".to_string(),
            mix_hash: ZERO_HASH.to_string(),
            coinbase: ZERO_ADDRESS.to_string(),
            alloc,
            number: "0x0".to_string(),
            gas_used: "0x0".to_string(),
            parent_hash: ZERO_HASH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::EXTRA_DATA_WIDTH;

    #[test]
    fn unset_period_defaults_to_five_seconds() {
        let genesis = Genesis::new(&["c".repeat(40)], -1, 2021);
        assert_eq!(genesis.config.clique.blockperiodseconds, 5);
        assert_eq!(genesis.extra_data.len(), EXTRA_DATA_WIDTH);
    }

    #[test]
    fn uses_the_besu_field_names() {
        let genesis = Genesis::new(&["c".repeat(40)], 2, 99);
        let value = serde_json::to_value(&genesis).unwrap();
        assert_eq!(value["config"]["chainId"], 99);
        assert_eq!(value["config"]["constantinoplefixblock"], 0);
        assert_eq!(value["config"]["clique"]["blockperiodseconds"], 2);
        assert_eq!(value["config"]["clique"]["epochlength"], 30000);
        assert_eq!(value["gasLimit"], "0xffffffff");
        // optional alloc fields are omitted entirely
        assert!(value["alloc"]["c".repeat(40)].get("code").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let mut genesis = Genesis::new(&["d".repeat(40)], 1, 7);
        if let Some(alloc) = genesis.alloc.get_mut(&"d".repeat(40)) {
            alloc.code = Some("0x6000".to_string());
            alloc.storage = Some(BTreeMap::from([(ZERO_HASH.to_string(), "0x01".to_string())]));
        }
        let parsed: Genesis =
            serde_json::from_str(&serde_json::to_string(&genesis).unwrap()).unwrap();
        assert_eq!(parsed, genesis);
    }
}
