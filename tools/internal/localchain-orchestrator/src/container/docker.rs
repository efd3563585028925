// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::container::ContainerBackend;
use crate::error::OrchestratorError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DOCKER_BINARY: &str = "docker";

fn volume_path(destination: &str) -> String {
    let destination = destination.trim_start_matches('/');
    if destination.is_empty() {
        "/dest".to_string()
    } else {
        format!("/dest/{destination}")
    }
}

pub struct DockerBackend {
    binary: String,

    // throwaway image used for manipulating volume contents
    utility_image: String,

    cancel: CancellationToken,
}

impl DockerBackend {
    pub fn new(utility_image: impl Into<String>, cancel: CancellationToken) -> Self {
        DockerBackend {
            binary: DOCKER_BINARY.to_string(),
            utility_image: utility_image.into(),
            cancel,
        }
    }

    fn rendered_command(&self, args: &[String]) -> String {
        let mut rendered = self.binary.clone();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    async fn run<I, S>(&self, working_dir: &Path, args: I) -> Result<String, OrchestratorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        self.run_command(working_dir, &args).await
    }
}

#[async_trait]
impl ContainerBackend for DockerBackend {
    async fn create_volume(&self, name: &str) -> Result<(), OrchestratorError> {
        debug!("creating volume {name}");
        self.run(Path::new("."), ["volume", "create", name]).await?;
        Ok(())
    }

    async fn mkdir_in_volume(
        &self,
        volume: &str,
        directory: &str,
    ) -> Result<(), OrchestratorError> {
        debug!("creating '{directory}' inside volume {volume}");
        self.run(
            Path::new("."),
            [
                "run".to_string(),
                "--rm".to_string(),
                "-v".to_string(),
                format!("{volume}:/dest"),
                self.utility_image.clone(),
                "mkdir".to_string(),
                "-p".to_string(),
                volume_path(directory),
            ],
        )
        .await?;
        Ok(())
    }

    async fn copy_file_to_volume(
        &self,
        volume: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), OrchestratorError> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("copying {} into volume {volume}", source.display());

        self.run(
            Path::new("."),
            [
                "run".to_string(),
                "--rm".to_string(),
                "-v".to_string(),
                format!("{}:/source/{file_name}", source.display()),
                "-v".to_string(),
                format!("{volume}:/dest"),
                self.utility_image.clone(),
                "cp".to_string(),
                "-R".to_string(),
                format!("/source/{file_name}"),
                volume_path(destination),
            ],
        )
        .await?;
        Ok(())
    }

    async fn run_command(
        &self,
        working_dir: &Path,
        args: &[String],
    ) -> Result<String, OrchestratorError> {
        let rendered = self.rendered_command(args);
        trace!("running '{rendered}' in {}", working_dir.display());

        let child = Command::new(&self.binary)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(OrchestratorError::Cancelled { resource: rendered })
            }
            output = child => output.map_err(|source| OrchestratorError::CommandSpawnFailure {
                command: rendered.clone(),
                source,
            })?,
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(OrchestratorError::CommandFailure {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }
        // stderr is only kept around for error reporting
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn copy_from_container(
        &self,
        container: &str,
        source: &str,
        destination: &Path,
    ) -> Result<(), OrchestratorError> {
        debug!("copying {container}:{source} to {}", destination.display());
        self.run(
            Path::new("."),
            [
                "cp".to_string(),
                format!("{container}:{source}"),
                destination.display().to_string(),
            ],
        )
        .await?;
        Ok(())
    }
}
