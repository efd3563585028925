// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! HTTP and JSON-RPC access to nodes and connectors that might not be listening yet.

use crate::error::OrchestratorError;
use crate::rpc::retry::{retry, AttemptError, RetryPolicy};
use crate::rpc::transport::{HttpMethod, HttpRequest, HttpTransport};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub mod retry;
pub mod transport;

const NO_CONTENT: u16 = 204;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,

    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn HttpTransport>,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        RpcClient {
            transport,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Single request. Any non 2xx status is an error carrying the response body,
    /// while `204 No Content` (or an empty body) yields `None`.
    pub async fn call(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, OrchestratorError> {
        let response = self
            .transport
            .send(&HttpRequest {
                method,
                url: url.to_string(),
                body,
            })
            .await?;

        if !response.is_success() {
            return Err(OrchestratorError::UnexpectedHttpStatus {
                url: url.to_string(),
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        if response.status == NO_CONTENT || response.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&response.body)?))
    }

    pub async fn call_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<T, OrchestratorError> {
        match self.call(method, url, body).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(OrchestratorError::EmptyResponse {
                url: url.to_string(),
            }),
        }
    }

    /// Same as [RpcClient::call], but every failure is treated as the service not being ready yet.
    pub async fn call_with_retry(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, OrchestratorError> {
        retry(policy, cancel, url, move |_| {
            let body = body.clone();
            async move {
                self.call(method, url, body)
                    .await
                    .map_err(AttemptError::Transient)
            }
        })
        .await
    }

    pub async fn call_json_with_retry<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<T, OrchestratorError> {
        match self
            .call_with_retry(method, url, body, policy, cancel)
            .await?
        {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(OrchestratorError::EmptyResponse {
                url: url.to_string(),
            }),
        }
    }

    /// Performs a JSON-RPC call, treating an error object inside a successful
    /// HTTP response as a failure.
    pub async fn jsonrpc(
        &self,
        url: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, OrchestratorError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response: JsonRpcResponse = self
            .call_json(HttpMethod::Post, url, Some(serde_json::to_value(&request)?))
            .await?;

        if let Some(error) = response.error {
            return Err(OrchestratorError::JsonRpcFailure {
                url: url.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Unlocks the account on the node indefinitely, waiting for the node to come up if needed.
    pub async fn unlock_account(
        &self,
        url: &str,
        address: &str,
        password: &str,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        info!("unlocking account {address}");
        let resource = format!("account {address} on {url}");

        retry(policy, cancel, &resource, move |attempt| async move {
            debug!("unlock attempt {attempt} for {address}");
            self.jsonrpc(url, "personal_unlockAccount", json!([address, password, 0]))
                .await
                .map(|_| ())
                .map_err(AttemptError::Transient)
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::rpc::transport::HttpResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub(crate) enum Scripted {
        Respond(u16, Value),
        Fail,
    }

    /// Transport replaying scripted responses; once the script is exhausted the last entry repeats.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(ScriptedTransport {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn recorded(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, OrchestratorError> {
            self.requests.lock().unwrap().push(request.clone());

            let mut script = self.script.lock().unwrap();
            let entry = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().map(|entry| match entry {
                    Scripted::Respond(status, body) => Scripted::Respond(*status, body.clone()),
                    Scripted::Fail => Scripted::Fail,
                })
            };
            match entry {
                Some(Scripted::Respond(status, body)) => Ok(HttpResponse {
                    status,
                    body: if body.is_null() {
                        Vec::new()
                    } else {
                        serde_json::to_vec(&body).unwrap()
                    },
                }),
                Some(Scripted::Fail) | None => Err(OrchestratorError::EmptyResponse {
                    url: format!("{} (connection refused)", request.url),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedTransport};
    use super::*;
    use std::time::Duration;

    const URL: &str = "http://127.0.0.1:5100";

    #[tokio::test]
    async fn non_success_status_carries_the_body() {
        let transport = ScriptedTransport::new(vec![Scripted::Respond(
            500,
            json!({"error": "boom"}),
        )]);
        let client = RpcClient::new(transport);

        let err = client.call(HttpMethod::Get, URL, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("{URL} [500] {}", json!({"error": "boom"}))
        );
    }

    #[tokio::test]
    async fn no_content_yields_nothing() {
        let transport = ScriptedTransport::new(vec![Scripted::Respond(204, Value::Null)]);
        let client = RpcClient::new(transport);
        assert_eq!(client.call(HttpMethod::Post, URL, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn embedded_rpc_error_is_a_failure() {
        let transport = ScriptedTransport::new(vec![Scripted::Respond(
            200,
            json!({"jsonrpc": "2.0", "id": 0, "error": {"code": -32000, "message": "unknown account"}}),
        )]);
        let client = RpcClient::new(transport);

        let err = client
            .jsonrpc(URL, "personal_unlockAccount", json!([]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::JsonRpcFailure { code: -32000, .. }
        ));
    }

    #[tokio::test]
    async fn unlock_retries_through_transport_and_rpc_errors() {
        let transport = ScriptedTransport::new(vec![
            Scripted::Fail,
            Scripted::Respond(
                200,
                json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "not ready"}}),
            ),
            Scripted::Respond(200, json!({"jsonrpc": "2.0", "id": 2, "result": true})),
        ]);
        let client = RpcClient::new(transport.clone());

        client
            .unlock_account(
                URL,
                "0xabc",
                "pw",
                RetryPolicy::new(10, Duration::ZERO),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let requests = transport.recorded();
        assert_eq!(requests.len(), 3);
        let body = requests[2].body.clone().unwrap();
        assert_eq!(body["method"], "personal_unlockAccount");
        assert_eq!(body["params"], json!(["0xabc", "pw", 0]));
        assert_eq!(body["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn unlock_against_a_dead_node_exhausts_the_budget() {
        let transport = ScriptedTransport::new(vec![Scripted::Fail]);
        let client = RpcClient::new(transport.clone());

        let err = client
            .unlock_account(
                URL,
                "0xabc",
                "pw",
                RetryPolicy::new(3, Duration::ZERO),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(transport.request_count(), 4);
        assert!(err.to_string().contains("0xabc"));
        assert!(matches!(
            err,
            OrchestratorError::RetriesExhausted { attempts: 4, .. }
        ));
    }
}
