// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::container::ContainerBackend;
use crate::error::OrchestratorError;
use crate::helpers::read_file;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub const FIREFLY_CONTRACT_NAME: &str = "FireFly";
pub const CONTRACTS_DIR: &str = "contracts";

const CORE_CONTRACTS_PATH: &str = "/firefly/contracts";
const FIREFLY_CONTRACT_FILE: &str = "Firefly.json";
const FIREFLY_CONTRACT_KEYS: [&str; 2] = ["Firefly.sol:Firefly", FIREFLY_CONTRACT_NAME];

/// Output of `solc --combined-json abi,bin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledContracts {
    pub contracts: BTreeMap<String, CompiledContract>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledContract {
    #[serde(default)]
    pub name: String,
    pub abi: Value,
    pub bin: String,
}

impl CompiledContracts {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let raw = read_file(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn names(&self) -> Vec<String> {
        self.contracts.keys().cloned().collect()
    }

    pub fn get(&self, name: &str, path: &Path) -> Result<&CompiledContract, OrchestratorError> {
        self.contracts
            .get(name)
            .ok_or_else(|| OrchestratorError::ContractNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    }

    fn firefly(&self, path: &Path) -> Result<&CompiledContract, OrchestratorError> {
        FIREFLY_CONTRACT_KEYS
            .iter()
            .find_map(|key| self.contracts.get(*key))
            .ok_or_else(|| OrchestratorError::ContractNotFound {
                name: FIREFLY_CONTRACT_NAME.to_string(),
                path: path.to_path_buf(),
            })
    }
}

/// Copies the contracts bundled in the first locally managed core container into the runtime
/// directory and returns the compiled FireFly contract.
pub async fn extract_firefly_contract(
    stack: &Stack,
    backend: &dyn ContainerBackend,
) -> Result<CompiledContract, OrchestratorError> {
    let member = stack
        .first_local_member()
        .ok_or_else(|| OrchestratorError::InvalidStack {
            message: "unable to extract contracts from container - no valid firefly core containers found in stack".to_string(),
        })?;
    let container = stack.names().firefly_core_container(&member.id);

    info!("extracting smart contracts from {container}");
    backend
        .copy_from_container(&container, CORE_CONTRACTS_PATH, &stack.runtime_dir)
        .await?;

    let path = stack
        .runtime_dir
        .join(CONTRACTS_DIR)
        .join(FIREFLY_CONTRACT_FILE);
    let contracts = CompiledContracts::read(&path)?;
    contracts.firefly(&path).cloned()
}
