// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Name of the stack
    name: String,

    #[clap(flatten)]
    common: CommonArgs,
}

pub(crate) fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    let manager = args.common.stack_manager_for(cancel, &args.name)?;
    let stack = manager.load(&args.name)?;
    let endpoints = manager.endpoints(&stack)?;

    println!("stack:       {}", stack.name);
    println!(
        "blockchain:  {} / {} / {}",
        stack.blockchain_provider, stack.blockchain_connector, stack.blockchain_node_provider
    );
    println!("location:    {}", stack.stack_dir.display());
    println!("has run:     {}", stack.has_run_before()?);
    for (member, endpoint) in stack.members.iter().zip(&endpoints) {
        let identity = member
            .account
            .as_ref()
            .map(|account| account.identifier().to_string())
            .unwrap_or_default();
        let placement = if endpoint.external { "external" } else { "docker" };
        println!(
            "member {}:    {} ({}) [{placement}] firefly :{} {identity}",
            member.index, member.org_name, member.node_name, member.ports.firefly
        );
        println!(
            "  connector: {} (core uses {})",
            endpoint.host_connector_url, endpoint.core_connector_url
        );
        if let Some(port) = endpoint.node_rpc_port {
            println!("  node rpc:  :{port}");
        }
        if let Some(port) = endpoint.ptm_port {
            println!("  tessera:   :{port}");
        }
    }
    for contract in &stack.state.deployed_contracts {
        println!("contract:    {} at {}", contract.name, contract.location);
    }
    Ok(())
}
