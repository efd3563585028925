// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::ConfigOverridableArgs;
use crate::config::{default_config_filepath, OrchestratorConfig};
use crate::error::OrchestratorError;
use crate::helpers::path_exists;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Where to write the config, `$HOME/.firefly/orchestrator.toml` by default
    #[clap(long)]
    output: Option<PathBuf>,

    /// Overwrite an already existing file
    #[clap(long)]
    force: bool,

    #[clap(flatten)]
    overrides: ConfigOverridableArgs,
}

pub(crate) fn execute(args: Args) -> Result<(), OrchestratorError> {
    let path = match args.output {
        Some(path) => path,
        None => default_config_filepath()?,
    };
    if path_exists(&path)? && !args.force {
        info!(
            "{} already exists. use --force to overwrite it",
            path.display()
        );
        return Ok(());
    }

    OrchestratorConfig::default()
        .with_override(args.overrides)
        .save_to_path(&path)?;
    info!("saved the orchestrator config to {}", path.display());
    Ok(())
}
