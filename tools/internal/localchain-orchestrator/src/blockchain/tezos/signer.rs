// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Signatory instance holding the keys of every tezos member.

use crate::blockchain::{ProviderContext, BLOCKCHAIN_DIR, CONFIG_DIR};
use crate::error::OrchestratorError;
use crate::helpers::{path_exists, read_file, write_file};
use crate::keys::tezos::TezosKeyPair;
use crate::render::write_yaml_config;
use crate::stack::account::Account;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SIGNER_SERVICE: &str = "tezossigner";
pub const SIGNER_PORT: u16 = 6732;
const UTILITY_PORT: u16 = 9583;

const SIGNER_CONFIG_FILE: &str = "tezossigner.yaml";
const SIGNER_CONFIG_VOLUME_FILE: &str = "signatory.yaml";
const SECRET_FILE: &str = "secret.json";
const SECRET_CONTAINER_PATH: &str = "/etc/secret.json";

const GENERIC_OPERATIONS: [&str; 4] = ["transaction", "endorsement", "reveal", "origination"];

#[derive(Debug, Serialize)]
struct SignerConfig {
    server: ServerConfig,
    vaults: VaultsConfig,
    tezos: BTreeMap<String, AccountPolicy>,
}

#[derive(Debug, Serialize)]
struct ServerConfig {
    address: String,
    utility_address: String,
}

#[derive(Debug, Serialize)]
struct VaultsConfig {
    local_secret: LocalSecretConfig,
}

#[derive(Debug, Serialize)]
struct LocalSecretConfig {
    driver: String,
    config: SecretFileConfig,
}

#[derive(Debug, Serialize)]
struct SecretFileConfig {
    file: String,
}

/// Operations the signer agrees to sign on behalf of an address.
#[derive(Debug, Serialize)]
struct AccountPolicy {
    log_payloads: bool,
    allow: AllowedOperations,
}

#[derive(Debug, Default, Serialize)]
struct AllowedOperations {
    block: Vec<String>,
    endorsement: Vec<String>,
    preendorsement: Vec<String>,
    generic: Vec<String>,
}

impl AccountPolicy {
    fn member() -> Self {
        AccountPolicy {
            log_payloads: true,
            allow: AllowedOperations {
                generic: GENERIC_OPERATIONS.iter().map(|op| op.to_string()).collect(),
                ..Default::default()
            },
        }
    }
}

/// Single entry of the signatory file vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SecretEntry {
    name: String,
    value: String,
}

fn secret_path(dir: &Path) -> PathBuf {
    dir.join(BLOCKCHAIN_DIR).join("keystore").join(SECRET_FILE)
}

/// Appends the key to the vault file, keeping every previously stored key.
fn store_secret(path: &Path, keypair: &TezosKeyPair) -> Result<(), OrchestratorError> {
    let mut entries: Vec<SecretEntry> = if path_exists(path)? {
        serde_json::from_slice(&read_file(path)?)?
    } else {
        Vec::new()
    };
    entries.push(SecretEntry {
        name: keypair.address(),
        value: format!("unencrypted:{}", keypair.secret_key()),
    });
    write_file(path, serde_json::to_vec_pretty(&entries)?)?;
    debug!("stored {} key(s) in {}", entries.len(), path.display());
    Ok(())
}

pub struct TezosSigner {
    ctx: ProviderContext,
}

impl TezosSigner {
    pub fn new(ctx: ProviderContext) -> Self {
        TezosSigner { ctx }
    }

    pub fn url(&self) -> String {
        format!("http://{SIGNER_SERVICE}:{SIGNER_PORT}")
    }

    /// Authorises every member address to sign regular operations.
    pub fn write_config(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let mut tezos = BTreeMap::new();
        for member in &stack.members {
            let account = member.account()?.as_tezos()?;
            tezos.insert(account.address.clone(), AccountPolicy::member());
        }

        let config = SignerConfig {
            server: ServerConfig {
                address: format!(":{SIGNER_PORT}"),
                utility_address: format!(":{UTILITY_PORT}"),
            },
            vaults: VaultsConfig {
                local_secret: LocalSecretConfig {
                    driver: "file".to_string(),
                    config: SecretFileConfig {
                        file: SECRET_CONTAINER_PATH.to_string(),
                    },
                },
            },
            tezos,
        };
        write_yaml_config(
            &config,
            &stack.init_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
            None,
        )
    }

    pub async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let names = stack.names();
        let config_volume = names.tezossigner_config_volume();
        let backend = &self.ctx.backend;

        backend.create_volume(&names.tezossigner_volume()).await?;
        backend
            .copy_file_to_volume(
                &config_volume,
                &stack.runtime_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
                SIGNER_CONFIG_VOLUME_FILE,
            )
            .await?;
        backend
            .copy_file_to_volume(&config_volume, &secret_path(&stack.runtime_dir), SECRET_FILE)
            .await
    }

    pub async fn create_account(&self, stack: &Stack) -> Result<Account, OrchestratorError> {
        let has_run_before = stack.has_run_before()?;
        let keypair = TezosKeyPair::generate();
        let secrets = secret_path(stack.active_dir()?);
        store_secret(&secrets, &keypair)?;

        if has_run_before {
            self.ctx
                .backend
                .copy_file_to_volume(
                    &stack.names().tezossigner_config_volume(),
                    &secrets,
                    SECRET_FILE,
                )
                .await?;
        }
        Ok(Account::Tezos(keypair.to_account()))
    }
}
