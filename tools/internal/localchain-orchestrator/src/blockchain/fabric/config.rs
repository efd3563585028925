// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Documents consumed by the fabric tooling and by fabconnect.

use crate::error::OrchestratorError;
use crate::render::write_yaml_config;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const FABCONNECT_PORT: u16 = 3000;

const PEER_ORG_DOMAIN: &str = "org1.example.com";
const ORG_MSP_ROOT: &str = "/etc/firefly/organizations/peerOrganizations/org1.example.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CryptogenConfig {
    orderer_orgs: Vec<CryptogenOrg>,
    peer_orgs: Vec<CryptogenOrg>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CryptogenOrg {
    name: String,
    domain: String,
    #[serde(rename = "EnableNodeOUs")]
    enable_node_ous: bool,

    #[serde(rename = "CA", skip_serializing_if = "Option::is_none")]
    ca: Option<CertificateAuthority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<Count>,

    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Count>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateAuthority {
    hostname: String,
    country: String,
    province: String,
    locality: String,
    organizational_unit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Count {
    count: usize,
}

/// One orderer org and a single peer org with a user per member.
pub fn write_cryptogen_config(member_count: usize, path: &Path) -> Result<(), OrchestratorError> {
    let config = CryptogenConfig {
        orderer_orgs: vec![CryptogenOrg {
            name: "Orderer".to_string(),
            domain: "example.com".to_string(),
            enable_node_ous: false,
            ca: None,
            template: None,
            users: None,
        }],
        peer_orgs: vec![CryptogenOrg {
            name: "Org1".to_string(),
            domain: PEER_ORG_DOMAIN.to_string(),
            enable_node_ous: false,
            ca: Some(CertificateAuthority {
                hostname: "ca".to_string(),
                country: "US".to_string(),
                province: "California".to_string(),
                locality: "San Francisco".to_string(),
                organizational_unit: "Hyperledger Fabric".to_string(),
            }),
            template: Some(Count { count: 1 }),
            users: Some(Count {
                count: member_count,
            }),
        }],
    };
    write_yaml_config(&config, path, None)
}

#[derive(Debug, Serialize)]
struct PathRef {
    path: String,
}

impl PathRef {
    fn new(path: impl Into<String>) -> Self {
        PathRef { path: path.into() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Registrar {
    enroll_id: String,
    enroll_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkEntity {
    #[serde(rename = "tlsCACerts")]
    tls_ca_certs: PathRef,
    url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    registrar: Option<Registrar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelPeer {
    chaincode_query: bool,
    endorsing_peer: bool,
    event_source: bool,
    ledger_query: bool,
}

#[derive(Debug, Serialize)]
struct Channel {
    orderers: Vec<String>,
    peers: BTreeMap<String, ChannelPeer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BccspSecurity {
    default: BccspProvider,
    enabled: bool,
    hash_algorithm: String,
    level: u32,
    soft_verify: bool,
}

#[derive(Debug, Serialize)]
struct BccspProvider {
    provider: String,
}

#[derive(Debug, Serialize)]
struct Bccsp {
    security: BccspSecurity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialStore {
    crypto_store: PathRef,
    path: String,
}

#[derive(Debug, Serialize)]
struct ClientTlsCerts {
    client: ClientCertPair,
}

#[derive(Debug, Serialize)]
struct ClientCertPair {
    cert: PathRef,
    key: PathRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Client {
    #[serde(rename = "BCCSP")]
    bccsp: Bccsp,
    credential_store: CredentialStore,
    #[serde(rename = "cryptoconfig")]
    crypto_config: PathRef,
    logging: ClientLogging,
    organization: String,
    tls_certs: ClientTlsCerts,
}

#[derive(Debug, Serialize)]
struct ClientLogging {
    level: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    certificate_authorities: Vec<String>,
    crypto_path: String,
    mspid: String,
    peers: Vec<String>,
}

/// Connection profile (`ccp.yaml`) fabconnect uses to reach the network.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkConfig {
    certificate_authorities: BTreeMap<String, NetworkEntity>,
    channels: BTreeMap<String, Channel>,
    client: Client,
    orderers: BTreeMap<String, NetworkEntity>,
    organizations: BTreeMap<String, Organization>,
    peers: BTreeMap<String, NetworkEntity>,
    version: String,
}

pub fn write_network_config(channel: &str, path: &Path) -> Result<(), OrchestratorError> {
    let msp = format!("{ORG_MSP_ROOT}/msp");
    let admin_tls = format!("{ORG_MSP_ROOT}/users/Admin@{PEER_ORG_DOMAIN}/tls");

    let config = NetworkConfig {
        certificate_authorities: BTreeMap::from([(
            PEER_ORG_DOMAIN.to_string(),
            NetworkEntity {
                tls_ca_certs: PathRef::new(format!(
                    "{ORG_MSP_ROOT}/ca/fabric_ca.{PEER_ORG_DOMAIN}-cert.pem"
                )),
                url: "http://fabric_ca:7054".to_string(),
                registrar: Some(Registrar {
                    enroll_id: "admin".to_string(),
                    enroll_secret: "adminpw".to_string(),
                }),
            },
        )]),
        channels: BTreeMap::from([(
            channel.to_string(),
            Channel {
                orderers: vec!["fabric_orderer".to_string()],
                peers: BTreeMap::from([(
                    "fabric_peer".to_string(),
                    ChannelPeer {
                        chaincode_query: true,
                        endorsing_peer: true,
                        event_source: true,
                        ledger_query: true,
                    },
                )]),
            },
        )]),
        client: Client {
            bccsp: Bccsp {
                security: BccspSecurity {
                    default: BccspProvider {
                        provider: "SW".to_string(),
                    },
                    enabled: true,
                    hash_algorithm: "SHA2".to_string(),
                    level: 256,
                    soft_verify: true,
                },
            },
            credential_store: CredentialStore {
                crypto_store: PathRef::new(msp.clone()),
                path: msp.clone(),
            },
            crypto_config: PathRef::new(msp),
            logging: ClientLogging {
                level: "info".to_string(),
            },
            organization: PEER_ORG_DOMAIN.to_string(),
            tls_certs: ClientTlsCerts {
                client: ClientCertPair {
                    cert: PathRef::new(format!("{admin_tls}/client.crt")),
                    key: PathRef::new(format!("{admin_tls}/client.key")),
                },
            },
        },
        orderers: BTreeMap::from([(
            "fabric_orderer".to_string(),
            NetworkEntity {
                tls_ca_certs: PathRef::new(
                    "/etc/firefly/organizations/ordererOrganizations/example.com/tlsca/tlsca.example.com-cert.pem",
                ),
                url: "grpcs://fabric_orderer:7050".to_string(),
                registrar: None,
            },
        )]),
        organizations: BTreeMap::from([(
            PEER_ORG_DOMAIN.to_string(),
            Organization {
                certificate_authorities: vec![PEER_ORG_DOMAIN.to_string()],
                crypto_path: "/tmp/msp".to_string(),
                mspid: "Org1MSP".to_string(),
                peers: vec!["fabric_peer".to_string()],
            },
        )]),
        peers: BTreeMap::from([(
            "fabric_peer".to_string(),
            NetworkEntity {
                tls_ca_certs: PathRef::new(format!(
                    "{ORG_MSP_ROOT}/tlsca/tlsfabric_ca.{PEER_ORG_DOMAIN}-cert.pem"
                )),
                url: "grpcs://fabric_peer:7051".to_string(),
                registrar: None,
            },
        )]),
        version: "1.1.0%".to_string(),
    };
    write_yaml_config(&config, path, None)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FabconnectConfig {
    max_in_flight: u32,
    #[serde(rename = "maxTXWaitTime")]
    max_tx_wait_time: u32,
    send_concurrency: u32,
    receipts: ReceiptsConfig,
    events: EventsConfig,
    http: FabconnectHttp,
    rpc: FabconnectRpc,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptsConfig {
    max_docs: u32,
    query_limit: u32,
    retry_initial_delay: u32,
    retry_timeout: u32,
    level_db: LevelDb,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsConfig {
    #[serde(rename = "webhooksAllowPrivateIPs")]
    webhooks_allow_private_ips: bool,
    level_db: LevelDb,
}

#[derive(Debug, Serialize)]
struct LevelDb {
    path: String,
}

#[derive(Debug, Serialize)]
struct FabconnectHttp {
    port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FabconnectRpc {
    config_path: String,
}

pub fn write_fabconnect_config(
    path: &Path,
    overlay: Option<&Path>,
) -> Result<(), OrchestratorError> {
    let config = FabconnectConfig {
        max_in_flight: 10,
        max_tx_wait_time: 60,
        send_concurrency: 25,
        receipts: ReceiptsConfig {
            max_docs: 1000,
            query_limit: 100,
            retry_initial_delay: 5,
            retry_timeout: 30,
            level_db: LevelDb {
                path: "/fabconnect/receipts".to_string(),
            },
        },
        events: EventsConfig {
            webhooks_allow_private_ips: true,
            level_db: LevelDb {
                path: "/fabconnect/events".to_string(),
            },
        },
        http: FabconnectHttp {
            port: FABCONNECT_PORT,
        },
        rpc: FabconnectRpc {
            config_path: "/fabconnect/ccp.yaml".to_string(),
        },
    };
    write_yaml_config(&config, path, overlay)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_yaml(path: &Path) -> serde_yaml::Value {
        serde_yaml::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn cryptogen_issues_one_user_per_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cryptogen.yaml");
        write_cryptogen_config(3, &path).unwrap();

        let written = read_yaml(&path);
        assert_eq!(written["PeerOrgs"][0]["Users"]["Count"], 3);
        assert_eq!(written["PeerOrgs"][0]["CA"]["Hostname"], "ca");
        assert!(written["OrdererOrgs"][0].get("CA").is_none());
    }

    #[test]
    fn connection_profile_points_at_the_single_peer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccp.yaml");
        write_network_config("firefly", &path).unwrap();

        let written = read_yaml(&path);
        assert_eq!(
            written["peers"]["fabric_peer"]["url"],
            "grpcs://fabric_peer:7051"
        );
        assert_eq!(
            written["channels"]["firefly"]["orderers"][0],
            "fabric_orderer"
        );
        assert_eq!(written["client"]["BCCSP"]["security"]["level"], 256);
        assert_eq!(
            written["certificateAuthorities"]["org1.example.com"]["registrar"]["enrollId"],
            "admin"
        );
    }

    #[test]
    fn fabconnect_reads_the_connection_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fabconnect.yaml");
        write_fabconnect_config(&path, None).unwrap();

        let written = read_yaml(&path);
        assert_eq!(written["http"]["port"], 3000);
        assert_eq!(written["rpc"]["configPath"], "/fabconnect/ccp.yaml");
        assert_eq!(written["maxTXWaitTime"], 60);
    }
}
