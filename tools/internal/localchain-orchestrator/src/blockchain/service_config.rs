// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Sections shared by the configuration documents of every connector.

use crate::stack::naming::ResourceNames;
use crate::stack::Member;
use serde::Serialize;

pub const DEFAULT_NAMESPACE: &str = "default";
const METRICS_PATH: &str = "/metrics";
const LISTEN_ALL: &str = "0.0.0.0";
const DOCKER_HOST: &str = "host.docker.internal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogConfig {
    pub level: String,
}

impl LogConfig {
    pub fn debug() -> Self {
        LogConfig {
            level: "debug".to_string(),
        }
    }

    pub fn info() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpServerConfig {
    pub port: u16,
    pub address: String,

    #[serde(rename = "publicURL", skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl HttpServerConfig {
    pub fn new(port: u16) -> Self {
        HttpServerConfig {
            port,
            address: LISTEN_ALL.to_string(),
            public_url: None,
        }
    }

    /// Listens inside the container on `port`, advertising the host mapped port.
    pub fn published(port: u16, exposed_port: u16) -> Self {
        HttpServerConfig {
            public_url: Some(format!("http://127.0.0.1:{exposed_port}")),
            ..HttpServerConfig::new(port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsServerConfig {
    pub port: u16,
    pub address: String,

    #[serde(rename = "publicURL")]
    pub public_url: String,
    pub enabled: bool,
    pub path: String,
}

impl MetricsServerConfig {
    /// Metrics endpoint of the member's connector, present only with prometheus enabled.
    pub fn for_member(member: &Member) -> Option<Self> {
        member.ports.connector_metrics.map(|port| MetricsServerConfig {
            port,
            address: LISTEN_ALL.to_string(),
            public_url: format!("http://127.0.0.1:{port}"),
            enabled: true,
            path: METRICS_PATH.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireFlyCoreConfig {
    pub url: String,
    pub namespaces: Vec<String>,
}

impl FireFlyCoreConfig {
    pub fn for_member(member: &Member) -> Self {
        FireFlyCoreConfig {
            url: core_url(member),
            namespaces: vec![DEFAULT_NAMESPACE.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationsConfig {
    pub required: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_receipt_upon_entry: Option<bool>,
}

impl ConfirmationsConfig {
    pub fn none_required() -> Self {
        ConfirmationsConfig {
            required: 0,
            fetch_receipt_upon_entry: None,
        }
    }
}

/// Where a connector reaches the core of its member. Externally managed cores run on the host.
pub fn core_url(member: &Member) -> String {
    let host = if member.external {
        DOCKER_HOST.to_string()
    } else {
        ResourceNames::firefly_core_service(&member.id)
    };
    format!("http://{host}:{}", member.ports.firefly)
}
