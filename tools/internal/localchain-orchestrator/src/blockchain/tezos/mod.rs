// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Tezos stacks. Nodes are never run locally: members reach a remote rpc endpoint
//! through tezosconnect, with signatory holding their keys.

use crate::blockchain::{
    connector_config_path, copy_connector_configs, remote_node_url, BlockchainProvider,
    InitOptions, ProviderContext,
};
use crate::error::OrchestratorError;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use signer::TezosSigner;
use std::path::Path;

pub mod signer;
pub mod tezosconnect;

const PROVIDER: &str = "tezos remote-rpc";

pub struct TezosProvider {
    ctx: ProviderContext,
    signer: TezosSigner,
}

impl TezosProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        TezosProvider {
            signer: TezosSigner::new(ctx.clone()),
            ctx,
        }
    }
}

#[async_trait]
impl BlockchainProvider for TezosProvider {
    fn connector_kind(&self) -> ConnectorKind {
        ConnectorKind::Tezosconnect
    }

    fn connector_port(&self) -> u16 {
        tezosconnect::TEZOSCONNECT_PORT
    }

    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError> {
        let rpc_url = remote_node_url(stack)?;
        let signer_url = self.signer.url();
        for (index, member) in stack.members.iter().enumerate() {
            tezosconnect::write_config(
                member,
                rpc_url,
                &signer_url,
                &connector_config_path(&stack.init_dir, ConnectorKind::Tezosconnect, index),
                options.extra_connector_config_path.as_deref(),
            )?;
        }
        self.signer.write_config(stack)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        self.signer.first_time_setup(stack).await?;
        copy_connector_configs(&self.ctx, stack, ConnectorKind::Tezosconnect).await
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
        Err(OrchestratorError::unsupported(PROVIDER, "contract listing"))
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
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, NodeProvider};
    use std::sync::Arc;

    async fn initialised_stack(dir: &Path, provider: &TezosProvider) -> Stack {
        let mut stack = testing::stack(
            dir,
            ChainFamily::Tezos,
            ConnectorKind::Tezosconnect,
            NodeProvider::RemoteRpc,
            vec![
                testing::ethereum_member(0, "unused"),
                testing::ethereum_member(1, "unused"),
            ],
        );
        stack.remote_node_url = Some("https://rpc.ghostnet.teztnets.com".to_string());
        for index in 0..stack.members.len() {
            let account = provider.create_account(&stack, &[]).await.unwrap();
            stack.members[index].account = Some(account);
        }
        stack
    }

    #[tokio::test]
    async fn first_time_setup_provisions_signer_then_connectors() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::new());
        let provider = TezosProvider::new(offline_context(backend.clone()));
        let stack = initialised_stack(dir.path(), &provider).await;

        provider
            .write_config(&stack, &InitOptions::default())
            .await
            .unwrap();
        assert!(stack.init_dir.join("config/tezosconnect_1.yaml").exists());
        assert!(stack.init_dir.join("config/tezossigner.yaml").exists());

        provider.first_time_setup(&stack).await.unwrap();
        let volumes: Vec<String> = backend
            .copies_to_volume()
            .into_iter()
            .map(|(volume, _, destination)| format!("{volume}:{destination}"))
            .collect();
        assert_eq!(
            volumes,
            vec![
                "dev_tezossigner_config:signatory.yaml",
                "dev_tezossigner_config:secret.json",
                "dev_tezosconnect_config_0:config.yaml",
                "dev_tezosconnect_config_1:config.yaml",
            ]
        );
    }

    #[tokio::test]
    async fn contracts_cannot_be_deployed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::new());
        let provider = TezosProvider::new(offline_context(backend.clone()));
        let stack = initialised_stack(dir.path(), &provider).await;

        assert!(matches!(
            provider.deploy_firefly_contract(&stack).await,
            Err(OrchestratorError::RemoteContractDeployment)
        ));
        assert!(matches!(
            provider.get_contracts(Path::new("contract.json"), &[]),
            Err(OrchestratorError::UnsupportedOperation { .. })
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_remote_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TezosProvider::new(offline_context(Arc::new(RecordingBackend::new())));
        let mut stack = initialised_stack(dir.path(), &provider).await;
        stack.remote_node_url = None;

        assert!(matches!(
            provider.write_config(&stack, &InitOptions::default()).await,
            Err(OrchestratorError::InvalidStack { .. })
        ));
    }
}
