// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ethereum::connector::{address_location, string_params, Connector};
use crate::blockchain::{external_url, resource_url, ProviderContext};
use crate::contracts::CompiledContract;
use crate::error::OrchestratorError;
use crate::keys::ethereum::strip_hex_prefix;
use crate::render::write_yaml_config;
use crate::rpc::transport::HttpMethod;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

pub const ETHCONNECT_PORT: u16 = 8080;
const TRANSACTION_SUCCESS: &str = "TransactionSuccess";

#[derive(Debug, Serialize)]
struct EthconnectConfig {
    rest: RestConfig,
}

#[derive(Debug, Serialize)]
struct RestConfig {
    #[serde(rename = "rest-gateway")]
    rest_gateway: RestGatewayConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestGatewayConfig {
    rpc: RpcConfig,
    openapi: OpenApiConfig,
    http: HttpConfig,

    #[serde(rename = "maxTXWaitTime")]
    max_tx_wait_time: u32,
    max_in_flight: u32,
}

#[derive(Debug, Serialize)]
struct RpcConfig {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenApiConfig {
    event_polling_interval_sec: u32,
    storage_path: String,
    #[serde(rename = "eventsDB")]
    events_db: String,
}

#[derive(Debug, Serialize)]
struct HttpConfig {
    port: u16,
}

#[derive(Debug, Serialize)]
struct MessageHeaders {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    headers: MessageHeaders,
    to: String,
    from: &'a str,
    abi: &'a Value,
    compiled: String,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DeployResponse {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyHeaders {
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    #[serde(default)]
    headers: ReplyHeaders,
    #[serde(default)]
    contract_address: String,
    #[serde(default)]
    error_message: String,
}

pub struct Ethconnect {
    ctx: ProviderContext,
}

impl Ethconnect {
    pub fn new(ctx: ProviderContext) -> Self {
        Ethconnect { ctx }
    }
}

/// ethconnect wants the bytecode base64 encoded rather than as hex.
fn encode_bytecode(bin: &str) -> Result<String, OrchestratorError> {
    let raw = hex::decode(strip_hex_prefix(bin)).map_err(|err| {
        OrchestratorError::InvalidStack {
            message: format!("contract bytecode is not valid hex: {err}"),
        }
    })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(raw))
}

#[async_trait]
impl Connector for Ethconnect {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Ethconnect
    }

    fn port(&self) -> u16 {
        ETHCONNECT_PORT
    }

    fn write_config(
        &self,
        _stack: &Stack,
        _member: &Member,
        blockchain_service: &str,
        path: &Path,
        overlay: Option<&Path>,
    ) -> Result<(), OrchestratorError> {
        let config = EthconnectConfig {
            rest: RestConfig {
                rest_gateway: RestGatewayConfig {
                    rpc: RpcConfig {
                        url: format!("http://{blockchain_service}:8545"),
                    },
                    openapi: OpenApiConfig {
                        event_polling_interval_sec: 1,
                        storage_path: "./data/abis".to_string(),
                        events_db: "./data/events".to_string(),
                    },
                    http: HttpConfig {
                        port: ETHCONNECT_PORT,
                    },
                    max_tx_wait_time: 60,
                    max_in_flight: 10,
                },
            },
        };
        write_yaml_config(&config, path, overlay)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let names = stack.names();
        for member in &stack.members {
            let volume = names.connector_data_volume(ConnectorKind::Ethconnect, &member.id);
            self.ctx.backend.mkdir_in_volume(&volume, "/abis").await?;
            self.ctx.backend.mkdir_in_volume(&volume, "/events").await?;
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
        let policy = self.ctx.config.retry.generic_policy();

        let request = DeployRequest {
            headers: MessageHeaders {
                kind: "DeployContract".to_string(),
            },
            to: String::new(),
            from,
            abi: &contract.abi,
            compiled: encode_bytecode(&contract.bin)?,
            params: string_params(extra_args),
        };
        info!("deploying {contract_name} through {url}");
        let response: DeployResponse = self
            .ctx
            .rpc
            .call_json_with_retry(
                HttpMethod::Post,
                &url,
                Some(serde_json::to_value(&request)?),
                policy,
                &self.ctx.cancel,
            )
            .await?;

        // the reply only exists once the transaction got mined
        let reply_url = resource_url(&url, &format!("replies/{}", response.id))?;
        let reply: Reply = self
            .ctx
            .rpc
            .call_json_with_retry(HttpMethod::Get, &reply_url, None, policy, &self.ctx.cancel)
            .await?;

        if reply.headers.kind != TRANSACTION_SUCCESS {
            return Err(OrchestratorError::TransactionFailed {
                id: response.id,
                reason: reply.error_message,
            });
        }
        Ok(address_location(contract_name, &reply.contract_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::context;
    use crate::container::testing::{BackendCall, RecordingBackend};
    use crate::rpc::testing::{Scripted, ScriptedTransport};
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, NodeProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn contract() -> CompiledContract {
        CompiledContract {
            name: "FireFly".to_string(),
            abi: json!([{"type": "constructor", "inputs": []}]),
            bin: "0x6080".to_string(),
        }
    }

    #[tokio::test]
    async fn deployment_waits_for_the_reply() {
        let transport = ScriptedTransport::new(vec![
            Scripted::Fail,
            Scripted::Respond(200, json!({"sent": true, "id": "req-1"})),
            Scripted::Respond(404, json!({"error": "not found"})),
            Scripted::Respond(
                200,
                json!({"_id": "req-1", "headers": {"type": "TransactionSuccess"}, "contractAddress": "0xc0ffee"}),
            ),
        ]);
        let connector = Ethconnect::new(context(
            Arc::new(RecordingBackend::new()),
            transport.clone(),
        ));
        let member = testing::ethereum_member(0, "0xaaaa");

        let result = connector
            .deploy_contract(&contract(), "FireFly", &member, &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(result.deployed_contract.name, "FireFly");
        assert_eq!(
            result.deployed_contract.location,
            json!({"address": "0xc0ffee"})
        );

        let requests = transport.recorded();
        assert_eq!(requests.len(), 4);
        let body = requests[1].body.clone().unwrap();
        assert_eq!(body["headers"]["type"], "DeployContract");
        assert_eq!(body["from"], "0xaaaa");
        assert_eq!(body["compiled"], "YIA=");
        assert_eq!(body["params"], json!(["a"]));
        assert_eq!(requests[3].url, "http://127.0.0.1:5102/replies/req-1");
    }

    #[tokio::test]
    async fn failed_reply_surfaces_the_error_message() {
        let transport = ScriptedTransport::new(vec![
            Scripted::Respond(200, json!({"sent": true, "id": "req-1"})),
            Scripted::Respond(
                200,
                json!({"headers": {"type": "Error"}, "errorMessage": "out of gas"}),
            ),
        ]);
        let connector = Ethconnect::new(context(Arc::new(RecordingBackend::new()), transport));

        let err = connector
            .deploy_contract(
                &contract(),
                "FireFly",
                &testing::ethereum_member(0, "0xaaaa"),
                &[],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of gas"));
    }

    #[tokio::test]
    async fn first_time_setup_prepares_the_data_volumes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::new());
        let connector = Ethconnect::new(crate::blockchain::testing::offline_context(
            backend.clone(),
        ));
        let stack = testing::stack(
            dir.path(),
            ChainFamily::Ethereum,
            ConnectorKind::Ethconnect,
            NodeProvider::Geth,
            vec![testing::ethereum_member(0, "0xaaaa")],
        );

        connector.first_time_setup(&stack).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::MkdirInVolume {
                    volume: "dev_ethconnect_data_0".to_string(),
                    directory: "/abis".to_string()
                },
                BackendCall::MkdirInVolume {
                    volume: "dev_ethconnect_data_0".to_string(),
                    directory: "/events".to_string()
                },
            ]
        );
    }
}
