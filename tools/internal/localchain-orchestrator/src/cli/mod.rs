// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ProviderContext;
use crate::config::OrchestratorConfig;
use crate::container::docker::DockerBackend;
use crate::error::OrchestratorError;
use crate::helpers::default_stacks_directory;
use crate::rpc::transport::ReqwestTransport;
use crate::rpc::RpcClient;
use crate::stack::manager::StackManager;
use crate::stack::Stack;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod accounts;
mod build_info;
mod deploy;
mod info;
mod init;
mod init_config;
mod list;
mod start;
mod stop;

#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct ConfigOverridableArgs {
    /// Password protecting (and unlocking) every generated key
    #[clap(long)]
    pub(crate) key_password: Option<String>,

    /// Additional attempts made when unlocking accounts on freshly started nodes
    #[clap(long)]
    pub(crate) unlock_retries: Option<u32>,

    /// Additional attempts made when waiting on a service to become available
    #[clap(long)]
    pub(crate) generic_retries: Option<u32>,

    /// Delay between two consecutive attempts, e.g. `500ms` or `2s`
    #[clap(long)]
    pub(crate) retry_delay: Option<humantime::Duration>,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct CommonArgs {
    /// Path to the orchestrator config file, `$HOME/.firefly/orchestrator.toml` by default
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory holding every stack, `$HOME/.firefly/stacks` by default
    #[clap(long)]
    stacks_dir: Option<PathBuf>,

    #[clap(flatten)]
    overrides: ConfigOverridableArgs,
}

impl CommonArgs {
    pub(crate) fn stacks_dir(&self) -> Result<PathBuf, OrchestratorError> {
        match &self.stacks_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_stacks_directory(),
        }
    }

    pub(crate) fn stack_manager(
        self,
        cancel: CancellationToken,
        request_timeout: Option<Duration>,
    ) -> Result<StackManager, OrchestratorError> {
        let stacks_dir = self.stacks_dir()?;
        let config =
            OrchestratorConfig::load_or_default(self.config)?.with_override(self.overrides);
        let transport = ReqwestTransport::new(request_timeout)?;

        let ctx = ProviderContext {
            backend: Arc::new(DockerBackend::new(
                config.images.utility.clone(),
                cancel.clone(),
            )),
            rpc: RpcClient::new(Arc::new(transport)),
            config: Arc::new(config),
            cancel,
        };
        Ok(StackManager::new(stacks_dir, ctx))
    }

    /// Manager for operating on an existing stack, honouring its request timeout.
    pub(crate) fn stack_manager_for(
        self,
        cancel: CancellationToken,
        stack_name: &str,
    ) -> Result<StackManager, OrchestratorError> {
        let stack = Stack::load(self.stacks_dir()?, stack_name)?;
        let timeout = stack
            .request_timeout
            .map(|seconds| Duration::from_secs(u64::from(seconds)));
        self.stack_manager(cancel, timeout)
    }
}

#[derive(Parser, Debug)]
#[clap(author = "Nymtech", version, about)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

impl Cli {
    pub(crate) async fn execute(self) -> Result<(), OrchestratorError> {
        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("received interrupt. cancelling the current operation");
                signal_cancel.cancel();
            }
        });

        match self.command {
            Commands::BuildInfo(args) => build_info::execute(args),
            Commands::InitConfig(args) => init_config::execute(args),
            Commands::Init(args) => init::execute(args, cancel).await,
            Commands::Start(args) => start::execute(args, cancel).await,
            Commands::Stop(args) => stop::execute(args, cancel).await,
            Commands::Accounts(args) => accounts::execute(args, cancel).await,
            Commands::Deploy(args) => deploy::execute(args, cancel).await,
            Commands::List(args) => list::execute(args),
            Commands::Info(args) => info::execute(args, cancel),
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Show build information of this binary
    BuildInfo(build_info::Args),

    /// Write the default orchestrator config file
    InitConfig(init_config::Args),

    /// Create a new stack: member accounts, genesis and every service config
    Init(init::Args),

    /// Start a stack, bootstrapping it the first time it runs
    Start(start::Args),

    /// Stop the containers of a stack
    Stop(stop::Args),

    /// Create or list accounts of a stack
    Accounts(accounts::Args),

    /// Deploy a compiled contract (or chaincode package) to a running stack
    Deploy(deploy::Args),

    /// List every initialised stack
    List(list::Args),

    /// Print the definition and state of a stack
    Info(info::Args),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
