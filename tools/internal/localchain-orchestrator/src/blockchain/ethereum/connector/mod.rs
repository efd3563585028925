// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ProviderContext;
use crate::contracts::CompiledContract;
use crate::error::OrchestratorError;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, DeployedContract, Member, Stack};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;

pub mod ethconnect;
pub mod evmconnect;

/// Transaction submission layer sitting between FireFly core and an Ethereum node.
#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> ConnectorKind;

    fn port(&self) -> u16;

    /// Writes the config of `member`'s connector, talking to the JSON-RPC endpoint
    /// of the `blockchain_service` container.
    fn write_config(
        &self,
        stack: &Stack,
        member: &Member,
        blockchain_service: &str,
        path: &Path,
        overlay: Option<&Path>,
    ) -> Result<(), OrchestratorError>;

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError>;

    async fn deploy_contract(
        &self,
        contract: &CompiledContract,
        contract_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError>;
}

pub fn new_connector(
    kind: ConnectorKind,
    ctx: ProviderContext,
) -> Result<Box<dyn Connector>, OrchestratorError> {
    match kind {
        ConnectorKind::Ethconnect => Ok(Box::new(ethconnect::Ethconnect::new(ctx))),
        ConnectorKind::Evmconnect => Ok(Box::new(evmconnect::Evmconnect::new(ctx))),
        other => Err(OrchestratorError::UnsupportedProviderCombination {
            provider: "ethereum".to_string(),
            connector: other.to_string(),
            node_provider: "any".to_string(),
        }),
    }
}

pub(crate) fn string_params(extra_args: &[String]) -> Vec<Value> {
    extra_args.iter().map(|arg| json!(arg)).collect()
}

pub(crate) fn address_location(contract_name: &str, address: &str) -> ContractDeploymentResult {
    ContractDeploymentResult {
        message: None,
        deployed_contract: DeployedContract {
            name: contract_name.to_string(),
            location: json!({ "address": address }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ethereum_connectors_can_be_built() {
        let backend = std::sync::Arc::new(crate::container::testing::RecordingBackend::new());
        let ctx = crate::blockchain::testing::offline_context(backend);

        assert!(new_connector(ConnectorKind::Evmconnect, ctx.clone()).is_ok());
        assert!(matches!(
            new_connector(ConnectorKind::Fabconnect, ctx),
            Err(OrchestratorError::UnsupportedProviderCombination { .. })
        ));
    }
}
