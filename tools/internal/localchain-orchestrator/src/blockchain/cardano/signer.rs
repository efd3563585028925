// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::{ProviderContext, BLOCKCHAIN_DIR, CONFIG_DIR};
use crate::error::OrchestratorError;
use crate::helpers::write_file;
use crate::keys::cardano::{CardanoNetwork, CardanoWallet, MAINNET};
use crate::render::write_yaml_config;
use crate::stack::account::Account;
use crate::stack::Stack;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SIGNER_PORT: u16 = 8555;

const SIGNER_CONFIG_FILE: &str = "cardanosigner.yaml";
const SIGNER_CONFIG_VOLUME_FILE: &str = "config.yaml";
const WALLET_DIR: &str = "wallet";
const WALLET_VOLUME_DIR: &str = "/wallet";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignerConfig {
    api: ApiConfig,
    file_wallet: FileWalletConfig,
}

#[derive(Debug, Serialize)]
struct ApiConfig {
    address: String,
    port: u16,
}

#[derive(Debug, Serialize)]
struct FileWalletConfig {
    path: String,
}

fn wallet_dir(dir: &Path) -> PathBuf {
    dir.join(BLOCKCHAIN_DIR).join(WALLET_DIR)
}

fn signing_key_path(dir: &Path, address: &str) -> PathBuf {
    wallet_dir(dir).join(format!("{address}.skey"))
}

pub struct CardanoSigner {
    ctx: ProviderContext,
}

impl CardanoSigner {
    pub fn new(ctx: ProviderContext) -> Self {
        CardanoSigner { ctx }
    }

    pub fn url(&self, stack: &Stack) -> String {
        format!(
            "http://{}:{SIGNER_PORT}",
            stack.names().cardanosigner_container()
        )
    }

    pub fn write_config(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let config = SignerConfig {
            api: ApiConfig {
                address: "0.0.0.0".to_string(),
                port: SIGNER_PORT,
            },
            file_wallet: FileWalletConfig {
                path: format!("/data{WALLET_VOLUME_DIR}"),
            },
        };
        write_yaml_config(
            &config,
            &stack.init_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
            None,
        )
    }

    /// Seeds the signer volume with its config and the signing key of every member.
    pub async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let volume = stack.names().cardanosigner_volume();
        let backend = &self.ctx.backend;

        backend.create_volume(&volume).await?;
        backend
            .copy_file_to_volume(
                &volume,
                &stack.runtime_dir.join(CONFIG_DIR).join(SIGNER_CONFIG_FILE),
                SIGNER_CONFIG_VOLUME_FILE,
            )
            .await?;
        backend.mkdir_in_volume(&volume, WALLET_VOLUME_DIR).await?;
        for member in &stack.members {
            let account = member.account()?.as_cardano()?;
            backend
                .copy_file_to_volume(
                    &volume,
                    &signing_key_path(&stack.runtime_dir, &account.address),
                    WALLET_VOLUME_DIR,
                )
                .await?;
        }
        Ok(())
    }

    /// Generates a wallet on the network of the stack, mainnet unless configured otherwise.
    pub async fn create_account(&self, stack: &Stack) -> Result<Account, OrchestratorError> {
        let has_run_before = stack.has_run_before()?;
        let network = stack.network.as_deref().unwrap_or(MAINNET);
        let wallet = CardanoWallet::generate(CardanoNetwork::from_name(network))?;
        let account = wallet.to_account()?;

        let key_path = signing_key_path(stack.active_dir()?, &account.address);
        write_file(
            &key_path,
            serde_json::to_vec_pretty(&wallet.payment_signing_key_envelope())?,
        )?;
        debug!("stored signing key in {}", key_path.display());

        if has_run_before {
            let volume = stack.names().cardanosigner_volume();
            self.ctx
                .backend
                .mkdir_in_volume(&volume, WALLET_VOLUME_DIR)
                .await?;
            self.ctx
                .backend
                .copy_file_to_volume(&volume, &key_path, WALLET_VOLUME_DIR)
                .await?;
        }
        Ok(Account::Cardano(account))
    }
}
