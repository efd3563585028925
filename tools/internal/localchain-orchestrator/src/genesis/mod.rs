// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Clique genesis documents for the Ethereum family of node providers.

use crate::error::OrchestratorError;
use crate::helpers::write_file;
use serde::Serialize;
use std::path::Path;

pub mod besu;
pub mod geth;

pub const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Vanity prefix the validator list gets appended to.
pub const EXTRA_DATA_PREFIX: &str = ZERO_HASH;

/// Total width of the extra data field: vanity, signers and the trailing seal space.
pub const EXTRA_DATA_WIDTH: usize = 236;

/// Starting balance of every validator account.
pub const PREFUNDED_BALANCE: &str =
    "0x200000000000000000000000000000000000000000000000000000000000000";

/// Value requesting the provider specific default block period.
pub const BLOCK_PERIOD_UNSET: i64 = -1;

pub fn resolve_block_period(requested: i64, provider_default: i64) -> i64 {
    if requested <= BLOCK_PERIOD_UNSET {
        provider_default
    } else {
        requested
    }
}

/// Concatenates the validator addresses (no `0x`, in the provided order) after the vanity
/// prefix and right-pads the result with `0` up to [EXTRA_DATA_WIDTH].
pub fn extra_data<S: AsRef<str>>(addresses: &[S]) -> String {
    let mut extra = String::from(EXTRA_DATA_PREFIX);
    for address in addresses {
        extra.push_str(address.as_ref());
    }
    while extra.len() < EXTRA_DATA_WIDTH {
        extra.push('0');
    }
    extra
}

/// Serialises the document with single space indentation, matching what the node clients ship.
pub fn to_genesis_json<T: Serialize>(genesis: &T) -> Result<Vec<u8>, OrchestratorError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    genesis.serialize(&mut serializer)?;
    Ok(out)
}

pub fn write_genesis_json<T: Serialize, P: AsRef<Path>>(
    genesis: &T,
    path: P,
) -> Result<(), OrchestratorError> {
    write_file(path, to_genesis_json(genesis)?)
}
