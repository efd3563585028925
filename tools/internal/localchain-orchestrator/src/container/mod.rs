// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use async_trait::async_trait;
use std::path::Path;

pub mod docker;

#[cfg(test)]
pub(crate) mod testing;

/// Operations the bootstrap sequence needs from the container runtime.
///
/// All of them complete before returning. Volume creation of an existing volume is not an error.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    async fn create_volume(&self, name: &str) -> Result<(), OrchestratorError>;

    async fn mkdir_in_volume(&self, volume: &str, directory: &str)
        -> Result<(), OrchestratorError>;

    /// Copies the file (or directory) at `source` to `destination`, relative to the volume root.
    /// An empty destination places it at the root of the volume under its own name.
    async fn copy_file_to_volume(
        &self,
        volume: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), OrchestratorError>;

    /// Runs the runtime binary with the provided arguments, returning its combined output.
    async fn run_command(
        &self,
        working_dir: &Path,
        args: &[String],
    ) -> Result<String, OrchestratorError>;

    async fn copy_from_container(
        &self,
        container: &str,
        source: &str,
        destination: &Path,
    ) -> Result<(), OrchestratorError>;
}

/// Image platform override needed to run amd64-only images on arm hosts.
pub fn platform_override() -> Option<&'static str> {
    if std::env::consts::ARCH == "aarch64" {
        Some("linux/amd64")
    } else {
        None
    }
}
