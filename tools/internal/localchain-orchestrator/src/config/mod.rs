// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::config::r#override::ConfigOverride;
use crate::config::template::CONFIG_TEMPLATE;
use crate::error::OrchestratorError;
use crate::helpers::{home_directory, path_exists, read_file, write_file, FIREFLY_DIR};
use crate::rpc::retry::RetryPolicy;
use handlebars::{handlebars_helper, Handlebars};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub mod r#override;
mod template;

pub const DEFAULT_CONFIG_FILENAME: &str = "orchestrator.toml";

// TODO: randomise per stack once every signer image supports per-member password files
pub const DEFAULT_KEY_PASSWORD: &str = "correcthorsebatterystaple";
pub const DEFAULT_KEYSTORE_KDF_ROUNDS: u32 = 262_144;

pub const DEFAULT_UNLOCK_RETRIES: u32 = 10;
pub const DEFAULT_GENERIC_RETRIES: u32 = 30;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_RECEIPT_POLL_RETRIES: u32 = 60;

// renders a quoted and escaped TOML string, whatever characters the value holds
handlebars_helper!(toml_string: |value: str| toml::Value::String(value.to_string()).to_string());

/// Get default path to the orchestrator config file.
/// It should get resolved to `$HOME/.firefly/orchestrator.toml`
pub fn default_config_filepath() -> Result<PathBuf, OrchestratorError> {
    Ok(home_directory()?
        .join(FIREFLY_DIR)
        .join(DEFAULT_CONFIG_FILENAME))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    // additional metadata holding on-disk location of this config file
    #[serde(skip)]
    pub(crate) save_path: Option<PathBuf>,

    pub credentials: Credentials,

    pub images: Images,

    pub retry: RetrySettings,
}

impl OrchestratorConfig {
    pub fn r#override<O: ConfigOverride>(&mut self, r#override: O) {
        r#override.override_config(self)
    }

    pub fn with_override<O: ConfigOverride>(mut self, r#override: O) -> Self {
        self.r#override(r#override);
        self
    }

    pub fn read_from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let path = path.as_ref();
        let raw = read_file(path)?;
        let mut loaded: OrchestratorConfig = toml::from_str(&String::from_utf8_lossy(&raw))
            .map_err(|source| OrchestratorError::ConfigLoadFailure {
                path: path.to_path_buf(),
                source,
            })?;
        loaded.save_path = Some(path.to_path_buf());
        debug!("loaded config file from {}", path.display());
        Ok(loaded)
    }

    /// Attempts to load the config from the provided path, or the default location,
    /// falling back to the built-in defaults if no file exists there.
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Self, OrchestratorError> {
        let path = match path {
            Some(path) => path,
            None => default_config_filepath()?,
        };
        if path_exists(&path)? {
            Self::read_from_toml_file(path)
        } else {
            debug!(
                "no config file found at {}. using the defaults",
                path.display()
            );
            Ok(OrchestratorConfig::default())
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), OrchestratorError> {
        let mut reg = Handlebars::new();
        reg.register_escape_fn(handlebars::no_escape);
        reg.register_helper("toml_string", Box::new(toml_string));
        let rendered = reg
            .render_template(CONFIG_TEMPLATE, self)
            .map_err(|source| OrchestratorError::TemplateRenderFailure {
                name: DEFAULT_CONFIG_FILENAME.to_string(),
                source,
            })?;
        write_file(path, rendered)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Credentials {
    pub key_password: String,

    pub keystore_kdf_rounds: u32,
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials {
            key_password: DEFAULT_KEY_PASSWORD.to_string(),
            keystore_kdf_rounds: DEFAULT_KEYSTORE_KDF_ROUNDS,
        }
    }
}

/// Images of the one-off containers the orchestrator runs itself. Long running services
/// are described by the compose file of the stack.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Images {
    pub geth: String,
    pub quorum: String,
    pub tessera: String,
    pub fabric_tools: String,

    /// Minimal image used for volume manipulation.
    pub utility: String,
}

impl Default for Images {
    fn default() -> Self {
        Images {
            geth: "ethereum/client-go:release-1.10".to_string(),
            quorum: "quorumengineering/quorum:24.4".to_string(),
            tessera: "quorumengineering/tessera:24.4".to_string(),
            fabric_tools: "hyperledger/fabric-tools:2.5".to_string(),
            utility: "alpine:latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub unlock_retries: u32,

    pub generic_retries: u32,

    #[serde(with = "humantime_serde")]
    pub delay: Duration,

    #[serde(with = "humantime_serde")]
    pub receipt_poll_interval: Duration,

    pub receipt_poll_retries: u32,
}

impl RetrySettings {
    pub fn unlock_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.unlock_retries, self.delay)
    }

    pub fn generic_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.generic_retries, self.delay)
    }

    pub fn receipt_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.receipt_poll_retries, self.receipt_poll_interval)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            unlock_retries: DEFAULT_UNLOCK_RETRIES,
            generic_retries: DEFAULT_GENERIC_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            receipt_poll_retries: DEFAULT_RECEIPT_POLL_RETRIES,
        }
    }
}
