// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::genesis::{
    extra_data, resolve_block_period, PREFUNDED_BALANCE, ZERO_ADDRESS, ZERO_HASH,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GETH_DEFAULT_BLOCK_PERIOD: i64 = 0;
pub const QUORUM_DEFAULT_BLOCK_PERIOD: i64 = 5;
pub const CLIQUE_EPOCH: u64 = 30000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueConfig {
    pub period: i64,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisConfig {
    pub chain_id: i64,
    pub homestead_block: u64,
    pub eip150_block: u64,
    pub eip150_hash: String,
    pub eip155_block: u64,
    pub eip158_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub petersburg_block: u64,
    pub istanbul_block: u64,
    pub clique: CliqueConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alloc {
    pub balance: String,
}

/// Genesis document in the schema understood by geth and GoQuorum.
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
    /// Dev chain genesis: an unset block period means instant sealing.
    pub fn geth<S: AsRef<str>>(addresses: &[S], block_period: i64, chain_id: i64) -> Self {
        Self::build(
            addresses,
            resolve_block_period(block_period, GETH_DEFAULT_BLOCK_PERIOD),
            chain_id,
        )
    }

    pub fn quorum<S: AsRef<str>>(addresses: &[S], block_period: i64, chain_id: i64) -> Self {
        Self::build(
            addresses,
            resolve_block_period(block_period, QUORUM_DEFAULT_BLOCK_PERIOD),
            chain_id,
        )
    }

    fn build<S: AsRef<str>>(addresses: &[S], period: i64, chain_id: i64) -> Self {
        let alloc = addresses
            .iter()
            .map(|address| {
                (
                    address.as_ref().to_string(),
                    Alloc {
                        balance: PREFUNDED_BALANCE.to_string(),
                    },
                )
            })
            .collect();

        Genesis {
            config: GenesisConfig {
                chain_id,
                homestead_block: 0,
                eip150_block: 0,
                eip150_hash: ZERO_HASH.to_string(),
                eip155_block: 0,
                eip158_block: 0,
                byzantium_block: 0,
                constantinople_block: 0,
                petersburg_block: 0,
                istanbul_block: 0,
                clique: CliqueConfig {
                    period,
                    epoch: CLIQUE_EPOCH,
                },
            },
            nonce: "0x0".to_string(),
            timestamp: "0x60edb1c7".to_string(),
            extra_data: extra_data(addresses),
            gas_limit: "0xffffff".to_string(),
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
