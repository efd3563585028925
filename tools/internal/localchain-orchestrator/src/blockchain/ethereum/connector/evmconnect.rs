// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ethereum::connector::{address_location, string_params, Connector};
use crate::blockchain::service_config::{
    ConfirmationsConfig, FireFlyCoreConfig, HttpServerConfig, LogConfig, MetricsServerConfig,
};
use crate::blockchain::{external_url, resource_url, ProviderContext};
use crate::contracts::CompiledContract;
use crate::error::OrchestratorError;
use crate::render::write_yaml_config;
use crate::rpc::retry::{retry, AttemptError};
use crate::rpc::transport::HttpMethod;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

pub const EVMCONNECT_PORT: u16 = 5008;

const STATUS_SUCCEEDED: &str = "Succeeded";
const STATUS_FAILED: &str = "Failed";

#[derive(Debug, Serialize)]
struct EvmconnectConfig {
    log: LogConfig,
    api: HttpServerConfig,
    connector: UpstreamConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsServerConfig>,
    persistence: PersistenceConfig,
    ffcore: FireFlyCoreConfig,
    confirmations: ConfirmationsConfig,

    #[serde(rename = "policyengine.simple")]
    policy_engine: PolicyEngineConfig,
}

#[derive(Debug, Serialize)]
struct UpstreamConfig {
    url: String,
}

#[derive(Debug, Serialize)]
struct PersistenceConfig {
    leveldb: LevelDbConfig,
}

#[derive(Debug, Serialize)]
struct LevelDbConfig {
    path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyEngineConfig {
    fixed_gas_price: u64,
    gas_oracle: GasOracleConfig,
}

#[derive(Debug, Serialize)]
struct GasOracleConfig {
    mode: String,
}

#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    headers: DeployHeaders,
    to: String,
    from: &'a str,
    definition: &'a Value,
    contract: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct DeployHeaders {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionStatus {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    receipt: Option<Receipt>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    #[serde(default)]
    extra_info: Option<ExtraInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtraInfo {
    #[serde(default)]
    contract_address: Option<String>,
}

impl TransactionStatus {
    fn contract_address(&self) -> Option<&str> {
        self.receipt
            .as_ref()?
            .extra_info
            .as_ref()?
            .contract_address
            .as_deref()
    }
}

pub struct Evmconnect {
    ctx: ProviderContext,
}

impl Evmconnect {
    pub fn new(ctx: ProviderContext) -> Self {
        Evmconnect { ctx }
    }

    /// Polls the transaction until it either succeeds or explicitly fails,
    /// within the receipt polling budget.
    async fn wait_for_transaction(
        &self,
        connector_url: &str,
        id: &str,
    ) -> Result<TransactionStatus, OrchestratorError> {
        let url = resource_url(connector_url, &format!("transactions/{id}"))?;
        let resource = format!("transaction {id}");
        let url = url.as_str();

        retry(
            self.ctx.config.retry.receipt_policy(),
            &self.ctx.cancel,
            &resource,
            move |attempt| async move {
                let status: TransactionStatus = self
                    .ctx
                    .rpc
                    .call_json(HttpMethod::Get, url, None)
                    .await
                    .map_err(AttemptError::Transient)?;
                debug!("transaction {id} is '{}' (poll {attempt})", status.status);

                match status.status.as_str() {
                    STATUS_SUCCEEDED => Ok(status),
                    STATUS_FAILED => Err(AttemptError::Fatal(
                        OrchestratorError::TransactionFailed {
                            id: id.to_string(),
                            reason: format!("transaction {} reported status Failed", status.id),
                        },
                    )),
                    _ => Err(AttemptError::Transient(
                        OrchestratorError::TransactionPending { id: id.to_string() },
                    )),
                }
            },
        )
        .await
    }
}

#[async_trait]
impl Connector for Evmconnect {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Evmconnect
    }

    fn port(&self) -> u16 {
        EVMCONNECT_PORT
    }

    fn write_config(
        &self,
        _stack: &Stack,
        member: &Member,
        blockchain_service: &str,
        path: &Path,
        overlay: Option<&Path>,
    ) -> Result<(), OrchestratorError> {
        let config = EvmconnectConfig {
            log: LogConfig::debug(),
            api: HttpServerConfig::published(EVMCONNECT_PORT, member.ports.connector),
            connector: UpstreamConfig {
                url: format!("http://{blockchain_service}:8545"),
            },
            metrics: MetricsServerConfig::for_member(member),
            persistence: PersistenceConfig {
                leveldb: LevelDbConfig {
                    path: "/evmconnect/data/leveldb".to_string(),
                },
            },
            ffcore: FireFlyCoreConfig::for_member(member),
            confirmations: ConfirmationsConfig::none_required(),
            policy_engine: PolicyEngineConfig {
                fixed_gas_price: 0,
                gas_oracle: GasOracleConfig {
                    mode: "fixed".to_string(),
                },
            },
        };
        write_yaml_config(&config, path, overlay)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let names = stack.names();
        for member in &stack.members {
            let volume = names.connector_data_volume(ConnectorKind::Evmconnect, &member.id);
            self.ctx.backend.mkdir_in_volume(&volume, "/leveldb").await?;
        }
        Ok(())
    }

    async fn deploy_contract(
        &self,
        contract: &CompiledContract,
        contract_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        let url = external_url(member);
        let from = &member.account()?.as_ethereum()?.address;

        let request = DeployRequest {
            headers: DeployHeaders {
                kind: "DeployContract".to_string(),
            },
            to: String::new(),
            from,
            definition: &contract.abi,
            contract: &contract.bin,
            params: string_params(extra_args),
        };
        info!("deploying {contract_name} through {url}");
        let submitted: TransactionStatus = self
            .ctx
            .rpc
            .call_json_with_retry(
                HttpMethod::Post,
                &url,
                Some(serde_json::to_value(&request)?),
                self.ctx.config.retry.generic_policy(),
                &self.ctx.cancel,
            )
            .await?;

        let mined = self.wait_for_transaction(&url, &submitted.id).await?;
        let address =
            mined
                .contract_address()
                .ok_or_else(|| OrchestratorError::TransactionFailed {
                    id: mined.id.clone(),
                    reason: "receipt does not hold a contract address".to_string(),
                })?;
        Ok(address_location(contract_name, address))
    }
}
