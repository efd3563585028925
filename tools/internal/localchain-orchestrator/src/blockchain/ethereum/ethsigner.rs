// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Signing proxy fronting nodes that do not manage keys themselves (besu, remote endpoints).

use crate::blockchain::ethereum::{
    blockchain_dir, copy_wallet_to_volume, keystore_dir, write_password_file, PASSWORD_FILE,
};
use crate::blockchain::{ProviderContext, CONFIG_DIR};
use crate::contracts::CONTRACTS_DIR;
use crate::error::OrchestratorError;
use crate::helpers::{init_path, write_file};
use crate::keys::keystore::create_wallet_file;
use crate::render::write_yaml_config;
use crate::stack::account::Account;
use crate::stack::Stack;
use serde::Serialize;
use std::path::{Path, PathBuf};
use toml::value::{Date, Datetime, Offset, Time};
use tracing::debug;

pub const ETHSIGNER_SERVICE: &str = "ethsigner";
const SIGNER_CONFIG_FILE: &str = "ethsigner.yaml";
const SIGNER_CONFIG_VOLUME_FILE: &str = "firefly.ffsigner";
const SIGNER_PORT: u16 = 8545;
const SIGNER_KEYSTORE: &str = "/data/keystore";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignerConfig {
    server: ServerConfig,
    backend: BackendConfig,
    file_wallet: FileWalletConfig,
    log: LogConfig,
}

#[derive(Debug, Serialize)]
struct ServerConfig {
    port: u16,
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BackendConfig {
    chain_id: i64,
    url: String,
}

#[derive(Debug, Serialize)]
struct FileWalletConfig {
    path: String,
    filenames: FilenamesConfig,
    metadata: MetadataConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilenamesConfig {
    primary_ext: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataConfig {
    key_file_property: String,
    password_file_property: String,
}

#[derive(Debug, Serialize)]
struct LogConfig {
    level: String,
}

/// Per key descriptor the signer discovers wallets through.
#[derive(Debug, Serialize)]
struct KeyDescriptor {
    metadata: KeyMetadata,
    signing: KeySigning,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyMetadata {
    created_at: Datetime,
    description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct KeySigning {
    #[serde(rename = "type")]
    kind: String,
    key_file: String,
    password_file: String,
}

// fixed timestamp, the signer only needs the field to be present
fn descriptor_timestamp() -> Datetime {
    Datetime {
        date: Some(Date {
            year: 2019,
            month: 11,
            day: 5,
        }),
        time: Some(Time {
            hour: 8,
            minute: 15,
            second: 30,
            nanosecond: 0,
        }),
        offset: Some(Offset::Custom { minutes: -300 }),
    }
}

/// Writes `<wallet>.toml` next to the wallet file, pointing the signer at it.
fn write_key_descriptor(wallet: &Path) -> Result<PathBuf, OrchestratorError> {
    let filename = wallet
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let descriptor = KeyDescriptor {
        metadata: KeyMetadata {
            created_at: descriptor_timestamp(),
            description: "File based configuration".to_string(),
        },
        signing: KeySigning {
            kind: "file-based-signer".to_string(),
            key_file: format!("{SIGNER_KEYSTORE}/{filename}"),
            password_file: format!("/data/{PASSWORD_FILE}"),
        },
    };

    let path = wallet.with_file_name(format!("{filename}.toml"));
    write_file(&path, toml::to_string(&descriptor)?)?;
    debug!("wrote signer key descriptor {}", path.display());
    Ok(path)
}

pub struct EthSigner {
    ctx: ProviderContext,
}

impl EthSigner {
    pub fn new(ctx: ProviderContext) -> Self {
        EthSigner { ctx }
    }

    /// Writes the key password and the signer config proxying to `rpc_url`.
    pub fn write_config(&self, stack: &Stack, rpc_url: &str) -> Result<(), OrchestratorError> {
        write_password_file(&stack.init_dir, &self.ctx.config.credentials.key_password)?;

        let config = SignerConfig {
            server: ServerConfig {
                port: SIGNER_PORT,
                address: "0.0.0.0".to_string(),
            },
            backend: BackendConfig {
                chain_id: stack.chain_id(),
                url: rpc_url.to_string(),
            },
            file_wallet: FileWalletConfig {
                path: SIGNER_KEYSTORE.to_string(),
                filenames: FilenamesConfig {
                    primary_ext: ".toml".to_string(),
                },
                metadata: MetadataConfig {
                    key_file_property: r#"{{ index .signing "key-file" }}"#.to_string(),
                    password_file_property: r#"{{ index .signing "password-file" }}"#.to_string(),
                },
            },
            log: LogConfig {
                level: "debug".to_string(),
            },
        };
        write_yaml_config(
            &config,
            &stack.init_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
            None,
        )
    }

    pub async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let names = stack.names();
        let volume = names.ethsigner_volume();
        let blockchain = blockchain_dir(&stack.runtime_dir);
        let backend = &self.ctx.backend;

        backend.create_volume(&volume).await?;
        init_path(stack.runtime_dir.join(CONTRACTS_DIR))?;

        backend
            .copy_file_to_volume(
                &names.ethsigner_config_volume(),
                &stack.runtime_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
                SIGNER_CONFIG_VOLUME_FILE,
            )
            .await?;
        backend
            .copy_file_to_volume(&volume, &keystore_dir(&stack.runtime_dir), "/")
            .await?;
        backend
            .copy_file_to_volume(&volume, &blockchain.join(PASSWORD_FILE), PASSWORD_FILE)
            .await?;
        Ok(())
    }

    pub async fn create_account(&self, stack: &Stack) -> Result<Account, OrchestratorError> {
        let has_run_before = stack.has_run_before()?;
        let credentials = &self.ctx.config.credentials;

        let (keypair, wallet) = create_wallet_file(
            &keystore_dir(stack.active_dir()?),
            None,
            &credentials.key_password,
            credentials.keystore_kdf_rounds,
        )?;
        let descriptor = write_key_descriptor(&wallet)?;

        if has_run_before {
            let volume = stack.names().ethsigner_volume();
            copy_wallet_to_volume(&self.ctx, &wallet, &volume).await?;
            copy_wallet_to_volume(&self.ctx, &descriptor, &volume).await?;
        }
        Ok(Account::Ethereum(keypair.to_account()))
    }
}
