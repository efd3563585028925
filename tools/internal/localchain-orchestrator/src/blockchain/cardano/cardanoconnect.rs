// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::service_config::{
    ConfirmationsConfig, FireFlyCoreConfig, HttpServerConfig, LogConfig, MetricsServerConfig,
};
use crate::error::OrchestratorError;
use crate::render::write_yaml_config;
use crate::stack::{Member, Stack};
use serde::Serialize;
use std::path::Path;

pub const CARDANOCONNECT_PORT: u16 = 3000;

// where the node socket of the host gets mounted
const SOCKET_MOUNT: &str = "/ipc/socket";

#[derive(Debug, Serialize)]
struct CardanoconnectConfig {
    log: LogConfig,
    api: HttpServerConfig,
    connector: ConnectorConfig,
    contracts: ContractsConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsServerConfig>,
    persistence: PersistenceConfig,
    ffcore: FireFlyCoreConfig,
    confirmations: ConfirmationsConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorConfig {
    blockchain: BlockchainConfig,
    signer_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockchainConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    blockfrost_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    blockfrost_base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    socket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContractsConfig {
    components_path: String,
    stores_path: String,
}

#[derive(Debug, Serialize)]
struct PersistenceConfig {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

pub fn write_config(
    stack: &Stack,
    member: &Member,
    signer_url: &str,
    path: &Path,
    overlay: Option<&Path>,
) -> Result<(), OrchestratorError> {
    let config = CardanoconnectConfig {
        log: LogConfig::info(),
        api: HttpServerConfig::published(CARDANOCONNECT_PORT, member.ports.connector),
        connector: ConnectorConfig {
            blockchain: BlockchainConfig {
                blockfrost_key: stack.blockfrost_key.clone(),
                blockfrost_base_url: stack.blockfrost_base_url.clone(),
                socket: stack.socket.as_ref().map(|_| SOCKET_MOUNT.to_string()),
                network: stack.network.clone(),
            },
            signer_url: signer_url.to_string(),
        },
        contracts: ContractsConfig {
            components_path: "/cardanoconnect/contracts/components".to_string(),
            stores_path: "/cardanoconnect/contracts/stores".to_string(),
        },
        metrics: MetricsServerConfig::for_member(member),
        persistence: PersistenceConfig {
            kind: "sqlite".to_string(),
            path: "/cardanoconnect/sqlite/db.sqlite3".to_string(),
        },
        ffcore: FireFlyCoreConfig::for_member(member),
        confirmations: ConfirmationsConfig::none_required(),
    };
    write_yaml_config(&config, path, overlay)
}
