// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::container::ContainerBackend;
use crate::error::OrchestratorError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BackendCall {
    CreateVolume(String),
    MkdirInVolume {
        volume: String,
        directory: String,
    },
    CopyFileToVolume {
        volume: String,
        source: PathBuf,
        destination: String,
    },
    RunCommand {
        working_dir: PathBuf,
        args: Vec<String>,
    },
    CopyFromContainer {
        container: String,
        source: String,
        destination: PathBuf,
    },
}

type CommandHandler = Box<dyn Fn(&[String]) -> Result<String, OrchestratorError> + Send + Sync>;

/// Backend double recording every call instead of talking to a container runtime.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
    command_handler: Option<CommandHandler>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_command_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[String]) -> Result<String, OrchestratorError> + Send + Sync + 'static,
    {
        self.command_handler = Some(Box::new(handler));
        self
    }

    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn copies_to_volume(&self) -> Vec<(String, PathBuf, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::CopyFileToVolume {
                    volume,
                    source,
                    destination,
                } => Some((volume, source, destination)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn commands(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::RunCommand { args, .. } => Some(args),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call)
    }
}

/// Simulates `tessera -keygen` by writing the key pair into the mounted output directory.
pub(crate) fn fake_tessera_keygen(args: &[String]) -> Result<String, OrchestratorError> {
    if !args.iter().any(|arg| arg == "-keygen") {
        return Ok(String::new());
    }
    let mount = args
        .iter()
        .find_map(|arg| arg.strip_suffix(":/keystore"))
        .unwrap();
    let filename = args
        .iter()
        .find_map(|arg| arg.strip_prefix("/keystore/"))
        .unwrap();
    let base = Path::new(mount).join(filename);
    std::fs::write(base.with_extension("pub"), "tessera-public-key").unwrap();
    std::fs::write(
        base.with_extension("key"),
        r#"{"type":"unlocked","data":{"bytes":"tessera-private-key"}}"#,
    )
    .unwrap();
    Ok(String::new())
}

#[async_trait]
impl ContainerBackend for RecordingBackend {
    async fn create_volume(&self, name: &str) -> Result<(), OrchestratorError> {
        self.record(BackendCall::CreateVolume(name.to_string()));
        Ok(())
    }

    async fn mkdir_in_volume(
        &self,
        volume: &str,
        directory: &str,
    ) -> Result<(), OrchestratorError> {
        self.record(BackendCall::MkdirInVolume {
            volume: volume.to_string(),
            directory: directory.to_string(),
        });
        Ok(())
    }

    async fn copy_file_to_volume(
        &self,
        volume: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), OrchestratorError> {
        self.record(BackendCall::CopyFileToVolume {
            volume: volume.to_string(),
            source: source.to_path_buf(),
            destination: destination.to_string(),
        });
        Ok(())
    }

    async fn run_command(
        &self,
        working_dir: &Path,
        args: &[String],
    ) -> Result<String, OrchestratorError> {
        self.record(BackendCall::RunCommand {
            working_dir: working_dir.to_path_buf(),
            args: args.to_vec(),
        });
        match &self.command_handler {
            Some(handler) => handler(args),
            None => Ok(String::new()),
        }
    }

    async fn copy_from_container(
        &self,
        container: &str,
        source: &str,
        destination: &Path,
    ) -> Result<(), OrchestratorError> {
        self.record(BackendCall::CopyFromContainer {
            container: container.to_string(),
            source: source.to_string(),
            destination: destination.to_path_buf(),
        });
        Ok(())
    }
}
