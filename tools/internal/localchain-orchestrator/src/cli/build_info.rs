// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use serde::Serialize;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Print the information as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct BuildInfo {
    binary_name: &'static str,
    build_version: &'static str,
    rustc_target_os: &'static str,
    rustc_target_arch: &'static str,
}

const BUILD_INFO: BuildInfo = BuildInfo {
    binary_name: env!("CARGO_PKG_NAME"),
    build_version: env!("CARGO_PKG_VERSION"),
    rustc_target_os: std::env::consts::OS,
    rustc_target_arch: std::env::consts::ARCH,
};

pub(crate) fn execute(args: Args) -> Result<(), OrchestratorError> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&BUILD_INFO)?);
    } else {
        println!("{:<20}{}", "Binary Name:", BUILD_INFO.binary_name);
        println!("{:<20}{}", "Build Version:", BUILD_INFO.build_version);
        println!(
            "{:<20}{}-{}",
            "Target:", BUILD_INFO.rustc_target_arch, BUILD_INFO.rustc_target_os
        );
    }
    Ok(())
}
