// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::ConfigOverridableArgs;
use crate::config::OrchestratorConfig;

pub trait ConfigOverride {
    fn override_config(self, config: &mut OrchestratorConfig);
}

impl ConfigOverride for ConfigOverridableArgs {
    fn override_config(self, config: &mut OrchestratorConfig) {
        if let Some(key_password) = self.key_password {
            config.credentials.key_password = key_password
        }

        if let Some(unlock_retries) = self.unlock_retries {
            config.retry.unlock_retries = unlock_retries
        }

        if let Some(generic_retries) = self.generic_retries {
            config.retry.generic_retries = generic_retries
        }

        if let Some(retry_delay) = self.retry_delay {
            config.retry.delay = retry_delay.into()
        }
    }
}
