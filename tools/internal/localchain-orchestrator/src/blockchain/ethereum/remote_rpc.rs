// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ethereum::connector::{new_connector, Connector};
use crate::blockchain::ethereum::ethsigner::{EthSigner, ETHSIGNER_SERVICE};
use crate::blockchain::ethereum::write_connector_configs;
use crate::blockchain::{
    copy_connector_configs, remote_node_url, BlockchainProvider, InitOptions, ProviderContext,
};
use crate::error::OrchestratorError;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use std::path::Path;

const PROVIDER: &str = "remote-rpc";

/// Externally operated Ethereum network, reached through a local signer.
pub struct RemoteRpcProvider {
    ctx: ProviderContext,
    connector: Box<dyn Connector>,
    signer: EthSigner,
}

impl RemoteRpcProvider {
    pub fn new(ctx: ProviderContext, connector: ConnectorKind) -> Result<Self, OrchestratorError> {
        Ok(RemoteRpcProvider {
            connector: new_connector(connector, ctx.clone())?,
            signer: EthSigner::new(ctx.clone()),
            ctx,
        })
    }
}

#[async_trait]
impl BlockchainProvider for RemoteRpcProvider {
    fn connector_kind(&self) -> ConnectorKind {
        self.connector.kind()
    }

    fn connector_port(&self) -> u16 {
        self.connector.port()
    }

    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError> {
        let url = remote_node_url(stack)?;
        write_connector_configs(self.connector.as_ref(), stack, options, |_| {
            ETHSIGNER_SERVICE.to_string()
        })?;
        self.signer.write_config(stack, url)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        self.connector.first_time_setup(stack).await?;
        copy_connector_configs(&self.ctx, stack, self.connector.kind()).await?;
        self.signer.first_time_setup(stack).await
    }

    async fn post_start(
        &self,
        _stack: &Stack,
        _first_time_setup: bool,
    ) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn deploy_firefly_contract(
        &self,
        _stack: &Stack,
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        Err(OrchestratorError::RemoteContractDeployment)
    }

    fn get_contracts(
        &self,
        _filename: &Path,
        _extra_args: &[String],
    ) -> Result<Vec<String>, OrchestratorError> {
        Ok(Vec::new())
    }

    async fn deploy_contract(
        &self,
        _stack: &Stack,
        _filename: &Path,
        _contract_name: &str,
        _instance_name: &str,
        _member: &Member,
        _extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        Err(OrchestratorError::unsupported(PROVIDER, "contract deployment"))
    }

    async fn create_account(
        &self,
        stack: &Stack,
        _args: &[String],
    ) -> Result<Account, OrchestratorError> {
        self.signer.create_account(stack).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::offline_context;
    use crate::container::testing::RecordingBackend;
    use crate::rpc::testing::ScriptedTransport;
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, NodeProvider};
    use std::sync::Arc;

    fn remote_stack(dir: &Path) -> Stack {
        let mut stack = testing::stack(
            dir,
            ChainFamily::Ethereum,
            ConnectorKind::Evmconnect,
            NodeProvider::RemoteRpc,
            vec![testing::ethereum_member(0, "0xaaaa")],
        );
        stack.remote_node_url = Some("https://rpc.example.org".to_string());
        stack
    }

    #[tokio::test]
    async fn firefly_contract_deployment_is_refused_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::new());
        let transport = ScriptedTransport::new(vec![]);
        let provider = RemoteRpcProvider::new(
            crate::blockchain::testing::context(backend.clone(), transport.clone()),
            ConnectorKind::Evmconnect,
        )
        .unwrap();
        let stack = remote_stack(dir.path());

        let err = provider.deploy_firefly_contract(&stack).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RemoteContractDeployment));
        assert!(backend.calls().is_empty());
        assert_eq!(transport.request_count(), 0);

        let member = &stack.members[0];
        assert!(matches!(
            provider
                .deploy_contract(&stack, Path::new("c.json"), "a", "a", member, &[])
                .await,
            Err(OrchestratorError::UnsupportedOperation { .. })
        ));
        assert!(provider
            .get_contracts(Path::new("c.json"), &[])
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn the_signer_proxies_to_the_remote_node() {
        let dir = tempfile::tempdir().unwrap();
        let stack = remote_stack(dir.path());
        let provider = RemoteRpcProvider::new(
            offline_context(Arc::new(RecordingBackend::new())),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        provider
            .write_config(&stack, &InitOptions::default())
            .await
            .unwrap();
        let signer: serde_yaml::Value = serde_yaml::from_slice(
            &std::fs::read(stack.init_dir.join("config/ethsigner.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(signer["backend"]["url"], "https://rpc.example.org");

        let connector: serde_yaml::Value = serde_yaml::from_slice(
            &std::fs::read(stack.init_dir.join("config/evmconnect_0.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(connector["connector"]["url"], "http://ethsigner:8545");
    }

    #[tokio::test]
    async fn missing_remote_url_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut stack = remote_stack(dir.path());
        stack.remote_node_url = None;
        let provider = RemoteRpcProvider::new(
            offline_context(Arc::new(RecordingBackend::new())),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        assert!(matches!(
            provider.write_config(&stack, &InitOptions::default()).await,
            Err(OrchestratorError::InvalidStack { .. })
        ));
    }
}
