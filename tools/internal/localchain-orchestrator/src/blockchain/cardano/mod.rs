// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Cardano stacks, reaching a remote node (or blockfrost) through cardanoconnect.

use crate::blockchain::{
    connector_config_path, copy_connector_configs, BlockchainProvider, InitOptions,
    ProviderContext,
};
use crate::error::OrchestratorError;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use signer::CardanoSigner;
use std::path::Path;

pub mod cardanoconnect;
pub mod signer;

const PROVIDER: &str = "cardano remote-rpc";

pub struct CardanoProvider {
    ctx: ProviderContext,
    signer: CardanoSigner,
}

impl CardanoProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        CardanoProvider {
            signer: CardanoSigner::new(ctx.clone()),
            ctx,
        }
    }
}

#[async_trait]
impl BlockchainProvider for CardanoProvider {
    fn connector_kind(&self) -> ConnectorKind {
        ConnectorKind::Cardanoconnect
    }

    fn connector_port(&self) -> u16 {
        cardanoconnect::CARDANOCONNECT_PORT
    }

    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError> {
        let signer_url = self.signer.url(stack);
        for (index, member) in stack.members.iter().enumerate() {
            cardanoconnect::write_config(
                stack,
                member,
                &signer_url,
                &connector_config_path(&stack.init_dir, ConnectorKind::Cardanoconnect, index),
                options.extra_connector_config_path.as_deref(),
            )?;
        }
        self.signer.write_config(stack)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        self.signer.first_time_setup(stack).await?;
        copy_connector_configs(&self.ctx, stack, ConnectorKind::Cardanoconnect).await
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
    use crate::container::testing::{BackendCall, RecordingBackend};
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, NodeProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn member_keys_reach_the_signer_before_connectors_start() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::new());
        let provider = CardanoProvider::new(offline_context(backend.clone()));
        let mut stack = testing::stack(
            dir.path(),
            ChainFamily::Cardano,
            ConnectorKind::Cardanoconnect,
            NodeProvider::RemoteRpc,
            vec![testing::ethereum_member(0, "unused")],
        );
        stack.members[0].account = Some(provider.create_account(&stack, &[]).await.unwrap());

        provider
            .write_config(&stack, &InitOptions::default())
            .await
            .unwrap();
        let connector: serde_yaml::Value = serde_yaml::from_slice(
            &std::fs::read(stack.init_dir.join("config/cardanoconnect_0.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            connector["connector"]["signerUrl"],
            "http://dev_cardanosigner:8555"
        );

        provider.first_time_setup(&stack).await.unwrap();
        let calls = backend.calls();
        assert_eq!(
            calls[0],
            BackendCall::CreateVolume("dev_cardanosigner".to_string())
        );
        let copies = backend.copies_to_volume();
        assert_eq!(copies.len(), 3);
        assert_eq!(copies[0].2, "config.yaml");
        assert_eq!(copies[1].2, "/wallet");
        assert_eq!(copies[2].0, "dev_cardanoconnect_config_0");
    }

    #[tokio::test]
    async fn deployments_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CardanoProvider::new(offline_context(Arc::new(RecordingBackend::new())));
        let stack = testing::stack(
            dir.path(),
            ChainFamily::Cardano,
            ConnectorKind::Cardanoconnect,
            NodeProvider::RemoteRpc,
            vec![],
        );
        assert!(matches!(
            provider.deploy_firefly_contract(&stack).await,
            Err(OrchestratorError::RemoteContractDeployment)
        ));
    }
}
