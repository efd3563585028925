// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::{resource_url, ProviderContext};
use crate::error::OrchestratorError;
use crate::rpc::transport::HttpMethod;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
struct CreateIdentityRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateIdentityResponse {
    pub name: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
struct EnrollIdentityRequest<'a> {
    secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct EnrollIdentityResponse {
    pub name: String,

    #[serde(default)]
    pub success: bool,
}

/// Identity management endpoints of a fabconnect instance.
pub struct FabconnectClient<'a> {
    ctx: &'a ProviderContext,
    base_url: String,
}

impl<'a> FabconnectClient<'a> {
    pub fn new(ctx: &'a ProviderContext, base_url: impl Into<String>) -> Self {
        FabconnectClient {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Registers a client identity. Fabconnect might still be starting, so this waits for it.
    pub async fn create_identity(
        &self,
        name: &str,
    ) -> Result<CreateIdentityResponse, OrchestratorError> {
        let url = resource_url(&self.base_url, "identities")?;
        let body = serde_json::to_value(CreateIdentityRequest { name, kind: "client" })?;
        self.ctx
            .rpc
            .call_json_with_retry(
                HttpMethod::Post,
                &url,
                Some(body),
                self.ctx.config.retry.generic_policy(),
                &self.ctx.cancel,
            )
            .await
    }

    pub async fn enroll_identity(
        &self,
        name: &str,
        secret: &str,
    ) -> Result<EnrollIdentityResponse, OrchestratorError> {
        let url = resource_url(&self.base_url, &format!("identities/{name}/enroll"))?;
        let body = serde_json::to_value(EnrollIdentityRequest { secret })?;
        self.ctx
            .rpc
            .call_json(HttpMethod::Post, &url, Some(body))
            .await
    }

    /// Creates then enrolls `name`, making it usable as a transaction signer.
    pub async fn register(&self, name: &str) -> Result<(), OrchestratorError> {
        info!("registering identity {name}");
        let created = self.create_identity(name).await?;
        self.enroll_identity(&created.name, &created.secret).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::context;
    use crate::container::testing::RecordingBackend;
    use crate::rpc::testing::{Scripted, ScriptedTransport};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn registration_enrolls_with_the_issued_secret() {
        let transport = ScriptedTransport::new(vec![
            Scripted::Fail,
            Scripted::Respond(200, json!({"name": "alice", "secret": "s3cr3t"})),
            Scripted::Respond(200, json!({"name": "alice", "success": true})),
        ]);
        let ctx = context(Arc::new(RecordingBackend::new()), transport.clone());
        let client = FabconnectClient::new(&ctx, "http://127.0.0.1:5102");

        client.register("alice").await.unwrap();

        let requests = transport.recorded();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].url, "http://127.0.0.1:5102/identities");
        assert_eq!(
            requests[1].body,
            Some(json!({"name": "alice", "type": "client"}))
        );
        assert_eq!(
            requests[2].url,
            "http://127.0.0.1:5102/identities/alice/enroll"
        );
        assert_eq!(requests[2].body, Some(json!({"secret": "s3cr3t"})));
    }

    #[tokio::test]
    async fn rejected_enrollment_is_reported() {
        let transport = ScriptedTransport::new(vec![
            Scripted::Respond(200, json!({"name": "bob", "secret": "x"})),
            Scripted::Respond(500, json!({"error": "enrollment failed"})),
        ]);
        let ctx = context(Arc::new(RecordingBackend::new()), transport);
        let client = FabconnectClient::new(&ctx, "http://127.0.0.1:5102");

        assert!(matches!(
            client.register("bob").await,
            Err(OrchestratorError::UnexpectedHttpStatus { status: 500, .. })
        ));
    }
}
