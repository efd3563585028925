// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Per chain family bootstrap sequences.
//!
//! Every provider goes through the same states, in order: [BlockchainProvider::write_config],
//! [BlockchainProvider::first_time_setup], [BlockchainProvider::pre_start],
//! [BlockchainProvider::post_start] and, on the first start only,
//! [BlockchainProvider::deploy_firefly_contract]. Account creation can happen at any point
//! afterwards and has to respect [Stack::has_run_before].

use crate::config::OrchestratorConfig;
use crate::container::ContainerBackend;
use crate::error::OrchestratorError;
use crate::rpc::RpcClient;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

pub mod cardano;
pub mod ethereum;
pub mod fabric;
pub mod factory;
pub mod service_config;
pub mod tezos;

pub const CONFIG_DIR: &str = "config";
pub const BLOCKCHAIN_DIR: &str = "blockchain";

/// Everything a provider needs to reach the outside world.
#[derive(Clone)]
pub struct ProviderContext {
    pub backend: Arc<dyn ContainerBackend>,
    pub rpc: RpcClient,
    pub config: Arc<OrchestratorConfig>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Requested block period in seconds, [crate::genesis::BLOCK_PERIOD_UNSET] for the provider default.
    pub block_period: i64,

    /// Operator supplied document merged on top of every generated connector config.
    pub extra_connector_config_path: Option<PathBuf>,
}

#[async_trait]
pub trait BlockchainProvider: Send + Sync {
    fn connector_kind(&self) -> ConnectorKind;

    fn connector_port(&self) -> u16;

    /// Generates every init time artifact under the init directory of the stack.
    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError>;

    /// Provisions volumes out of the (already promoted) runtime directory.
    /// Must only ever be invoked once per stack.
    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError>;

    async fn pre_start(&self, _stack: &Stack) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn post_start(
        &self,
        stack: &Stack,
        first_time_setup: bool,
    ) -> Result<(), OrchestratorError>;

    async fn deploy_firefly_contract(
        &self,
        stack: &Stack,
    ) -> Result<ContractDeploymentResult, OrchestratorError>;

    fn get_contracts(
        &self,
        filename: &Path,
        extra_args: &[String],
    ) -> Result<Vec<String>, OrchestratorError>;

    async fn deploy_contract(
        &self,
        stack: &Stack,
        filename: &Path,
        contract_name: &str,
        instance_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError>;

    /// Mints a new identity. `args` are the positional arguments following the stack name.
    async fn create_account(
        &self,
        stack: &Stack,
        args: &[String],
    ) -> Result<Account, OrchestratorError>;

    /// Address of the member's connector inside the container network.
    fn connector_url(&self, member: &Member) -> String {
        format!(
            "http://{}:{}",
            crate::stack::naming::ResourceNames::connector_service(
                self.connector_kind(),
                &member.id
            ),
            self.connector_port()
        )
    }

    /// Address of the member's connector as seen from the host.
    fn connector_external_url(&self, member: &Member) -> String {
        external_url(member)
    }

    /// Connector address handed to the member's FireFly core. Cores running outside of
    /// the container network only see the published port.
    fn core_connector_url(&self, member: &Member) -> String {
        if member.external {
            self.connector_external_url(member)
        } else {
            self.connector_url(member)
        }
    }
}

pub(crate) fn connector_config_path(dir: &Path, connector: ConnectorKind, index: usize) -> PathBuf {
    dir.join(CONFIG_DIR).join(format!("{connector}_{index}.yaml"))
}

/// Pushes the runtime copy of every member's connector config into its config volume.
pub(crate) async fn copy_connector_configs(
    ctx: &ProviderContext,
    stack: &Stack,
    connector: ConnectorKind,
) -> Result<(), OrchestratorError> {
    let names = stack.names();
    for (index, _) in stack.members.iter().enumerate() {
        let source = connector_config_path(&stack.runtime_dir, connector, index);
        let volume = names.connector_config_volume(connector, index);
        debug!("copying {} into {volume}", source.display());
        ctx.backend
            .copy_file_to_volume(&volume, &source, "config.yaml")
            .await?;
    }
    Ok(())
}

/// Connector of `member` as published on the host.
pub(crate) fn external_url(member: &Member) -> String {
    format!("http://127.0.0.1:{}", member.ports.connector)
}

/// Endpoint of an externally operated node. Required by every remote-rpc provider.
pub(crate) fn remote_node_url(stack: &Stack) -> Result<&str, OrchestratorError> {
    stack
        .remote_node_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| OrchestratorError::InvalidStack {
            message: "a remote node url is required when using the remote-rpc node provider"
                .to_string(),
        })
}

pub(crate) fn resource_url(base: &str, path: &str) -> Result<String, OrchestratorError> {
    let malformed = |source| OrchestratorError::MalformedUrl {
        url: base.to_string(),
        source,
    };
    Ok(Url::parse(base)
        .map_err(malformed)?
        .join(path)
        .map_err(malformed)?
        .to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::container::testing::RecordingBackend;
    use crate::rpc::testing::{Scripted, ScriptedTransport};
    use std::time::Duration;

    /// Context backed by recording fakes and instantaneous retries.
    pub(crate) fn context(
        backend: Arc<RecordingBackend>,
        transport: Arc<ScriptedTransport>,
    ) -> ProviderContext {
        let mut config = OrchestratorConfig::default();
        config.credentials.keystore_kdf_rounds = 2;
        config.retry.delay = Duration::ZERO;
        config.retry.receipt_poll_interval = Duration::ZERO;
        config.retry.unlock_retries = 2;
        config.retry.generic_retries = 2;
        config.retry.receipt_poll_retries = 3;

        ProviderContext {
            backend,
            rpc: RpcClient::new(transport),
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn offline_context(backend: Arc<RecordingBackend>) -> ProviderContext {
        context(backend, ScriptedTransport::new(vec![Scripted::Fail]))
    }

    pub(crate) fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_are_resolved_against_the_connector_root() {
        assert_eq!(
            resource_url("http://127.0.0.1:5102", "replies/abc").unwrap(),
            "http://127.0.0.1:5102/replies/abc"
        );
        assert!(resource_url("not a url", "replies/abc").is_err());
    }
}
