// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use crate::helpers::default_stacks_directory;
use crate::stack::manager::list_stacks;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Directory holding every stack, `$HOME/.firefly/stacks` by default
    #[clap(long)]
    stacks_dir: Option<PathBuf>,
}

pub(crate) fn execute(args: Args) -> Result<(), OrchestratorError> {
    let stacks_dir = match args.stacks_dir {
        Some(dir) => dir,
        None => default_stacks_directory()?,
    };
    let stacks = list_stacks(&stacks_dir)?;
    if stacks.is_empty() {
        println!("no stacks found in {}", stacks_dir.display());
    }
    for name in stacks {
        println!("{name}");
    }
    Ok(())
}
