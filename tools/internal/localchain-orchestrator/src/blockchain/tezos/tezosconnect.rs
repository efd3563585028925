// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::service_config::{
    ConfirmationsConfig, FireFlyCoreConfig, HttpServerConfig, LogConfig, MetricsServerConfig,
};
use crate::error::OrchestratorError;
use crate::render::write_yaml_config;
use crate::stack::Member;
use serde::Serialize;
use std::path::Path;

pub const TEZOSCONNECT_PORT: u16 = 5008;

const LEVELDB_PATH: &str = "/tezosconnect/db/leveldb";

#[derive(Debug, Serialize)]
struct TezosconnectConfig {
    log: LogConfig,
    api: HttpServerConfig,
    connector: ConnectorConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsServerConfig>,
    persistence: PersistenceConfig,
    ffcore: FireFlyCoreConfig,
    confirmations: ConfirmationsConfig,
}

#[derive(Debug, Serialize)]
struct ConnectorConfig {
    blockchain: BlockchainConfig,
}

#[derive(Debug, Serialize)]
struct BlockchainConfig {
    network: String,
    rpc: String,
    signatory: String,
}

#[derive(Debug, Serialize)]
struct PersistenceConfig {
    leveldb: LevelDbConfig,
}

#[derive(Debug, Serialize)]
struct LevelDbConfig {
    path: String,
}

/// Tezos network the rpc endpoint belongs to. Only ghostnet is told apart from mainnet.
fn network_name(rpc_url: &str) -> &'static str {
    if rpc_url.contains("ghost") {
        "ghostnet"
    } else {
        "mainnet"
    }
}

pub fn write_config(
    member: &Member,
    rpc_url: &str,
    signer_url: &str,
    path: &Path,
    overlay: Option<&Path>,
) -> Result<(), OrchestratorError> {
    let config = TezosconnectConfig {
        log: LogConfig::debug(),
        api: HttpServerConfig::published(TEZOSCONNECT_PORT, member.ports.connector),
        connector: ConnectorConfig {
            blockchain: BlockchainConfig {
                network: network_name(rpc_url).to_string(),
                rpc: rpc_url.to_string(),
                signatory: signer_url.to_string(),
            },
        },
        metrics: MetricsServerConfig::for_member(member),
        persistence: PersistenceConfig {
            leveldb: LevelDbConfig {
                path: LEVELDB_PATH.to_string(),
            },
        },
        ffcore: FireFlyCoreConfig::for_member(member),
        confirmations: ConfirmationsConfig {
            required: 0,
            fetch_receipt_upon_entry: Some(true),
        },
    };
    write_yaml_config(&config, path, overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::testing::ethereum_member;

    #[test]
    fn ghostnet_is_detected_from_the_rpc_url() {
        assert_eq!(network_name("https://ghostnet.ecadinfra.com"), "ghostnet");
        assert_eq!(network_name("https://mainnet.api.tez.ie"), "mainnet");
    }

    #[test]
    fn config_targets_the_signer_and_the_member_core() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tezosconnect_0.yaml");
        let member = ethereum_member(0, "tz1");

        write_config(
            &member,
            "https://rpc.ghostnet.teztnets.com",
            "http://tezossigner:6732",
            &path,
            None,
        )
        .unwrap();

        let written: serde_yaml::Value =
            serde_yaml::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["api"]["port"], 5008);
        assert_eq!(written["api"]["publicURL"], "http://127.0.0.1:5102");
        assert_eq!(written["connector"]["blockchain"]["network"], "ghostnet");
        assert_eq!(
            written["connector"]["blockchain"]["signatory"],
            "http://tezossigner:6732"
        );
        assert_eq!(written["confirmations"]["fetchReceiptUponEntry"], true);
        assert_eq!(written["ffcore"]["url"], "http://firefly_core_0:5000");
        assert!(written.get("metrics").is_none());
    }
}
