// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use crate::genesis::BLOCK_PERIOD_UNSET;
use crate::helpers::ProgressTracker;
use crate::stack::manager::{
    InitRequest, DEFAULT_FIREFLY_BASE_PORT, DEFAULT_PTM_BASE_PORT, DEFAULT_SERVICES_BASE_PORT,
};
use crate::stack::types::{
    ChainFamily, ConnectorKind, Consensus, Database, NodeProvider, PrivateTransactionManager,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Name of the new stack
    name: String,

    /// Number of members (organisations) taking part in the network
    #[clap(default_value_t = 2)]
    member_count: usize,

    /// Number of leading members whose FireFly core runs outside of docker
    #[clap(long, default_value_t = 0)]
    external_processes: usize,

    #[clap(short = 'b', long, value_enum, default_value_t = ChainFamily::Ethereum)]
    blockchain_provider: ChainFamily,

    /// Connector sitting between FireFly and the chain, the family default when unset
    #[clap(short = 'c', long, value_enum)]
    blockchain_connector: Option<ConnectorKind>,

    /// Node implementation, the family default when unset
    #[clap(short = 'n', long, value_enum)]
    blockchain_node: Option<NodeProvider>,

    #[clap(long, value_enum, default_value_t = Consensus::Clique)]
    consensus: Consensus,

    #[clap(long, value_enum, default_value_t = PrivateTransactionManager::None)]
    private_transaction_manager: PrivateTransactionManager,

    #[clap(short = 'd', long, value_enum, default_value_t = Database::Sqlite3)]
    database: Database,

    #[clap(long, default_value_t = DEFAULT_SERVICES_BASE_PORT)]
    services_base_port: u16,

    #[clap(long, default_value_t = DEFAULT_FIREFLY_BASE_PORT)]
    firefly_base_port: u16,

    #[clap(long, default_value_t = DEFAULT_PTM_BASE_PORT)]
    ptm_base_port: u16,

    #[clap(long)]
    prometheus_enabled: bool,

    /// Organisation name of each member, in member order
    #[clap(long = "org-name")]
    org_names: Vec<String>,

    /// Node name of each member, in member order
    #[clap(long = "node-name")]
    node_names: Vec<String>,

    /// Address of an already deployed FireFly contract, skipping its deployment
    #[clap(long)]
    contract_address: Option<String>,

    #[clap(long)]
    chain_id: Option<i64>,

    /// Endpoint of an externally operated node, required by remote-rpc stacks
    #[clap(long)]
    remote_node_url: Option<String>,

    /// Timeout, in seconds, of every request made to the services of the stack
    #[clap(long)]
    request_timeout: Option<u32>,

    /// Network name of tezos or cardano stacks
    #[clap(long)]
    network: Option<String>,

    #[clap(long)]
    blockfrost_key: Option<String>,

    #[clap(long)]
    blockfrost_base_url: Option<String>,

    /// Path to the socket of a local cardano node
    #[clap(long)]
    socket: Option<String>,

    /// Block period in seconds, the node provider default when unset
    #[clap(long, default_value_t = BLOCK_PERIOD_UNSET, allow_negative_numbers = true)]
    block_period: i64,

    /// YAML document merged on top of every generated connector config
    #[clap(long)]
    connector_config: Option<PathBuf>,

    #[clap(flatten)]
    common: CommonArgs,
}

fn default_connector(family: ChainFamily) -> ConnectorKind {
    match family {
        ChainFamily::Ethereum => ConnectorKind::Evmconnect,
        ChainFamily::Fabric => ConnectorKind::Fabconnect,
        ChainFamily::Tezos => ConnectorKind::Tezosconnect,
        ChainFamily::Cardano => ConnectorKind::Cardanoconnect,
    }
}

fn default_node(family: ChainFamily) -> NodeProvider {
    match family {
        ChainFamily::Ethereum => NodeProvider::Geth,
        ChainFamily::Fabric => NodeProvider::None,
        ChainFamily::Tezos | ChainFamily::Cardano => NodeProvider::RemoteRpc,
    }
}

impl Args {
    fn request(&self) -> InitRequest {
        let family = self.blockchain_provider;
        let mut request = InitRequest::new(
            self.name.clone(),
            self.member_count,
            family,
            self.blockchain_connector
                .unwrap_or_else(|| default_connector(family)),
            self.blockchain_node.unwrap_or_else(|| default_node(family)),
        );
        request.external_processes = self.external_processes;
        request.consensus = self.consensus;
        request.private_transaction_manager = self.private_transaction_manager;
        request.database = self.database;
        request.services_base_port = self.services_base_port;
        request.firefly_base_port = self.firefly_base_port;
        request.ptm_base_port = self.ptm_base_port;
        request.prometheus_enabled = self.prometheus_enabled;
        request.org_names = self.org_names.clone();
        request.node_names = self.node_names.clone();
        request.contract_address = self.contract_address.clone();
        request.chain_id = self.chain_id;
        request.remote_node_url = self.remote_node_url.clone();
        request.request_timeout = self.request_timeout;
        request.network = self.network.clone();
        request.blockfrost_key = self.blockfrost_key.clone();
        request.blockfrost_base_url = self.blockfrost_base_url.clone();
        request.socket = self.socket.clone();
        request.block_period = self.block_period;
        request.extra_connector_config_path = self.connector_config.clone();
        request
    }
}

pub(crate) async fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    let request = args.request();
    let manager = args.common.stack_manager(cancel, None)?;

    let progress = ProgressTracker::new(format!("🏗️ initialising stack '{}'", request.name));
    let stack = progress.with_progress(manager.init(request)).await?;
    progress.println(format!(
        "stack '{}' created in {}. run `start {}` to bring it up",
        stack.name,
        stack.stack_dir.display(),
        stack.name
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Args {
        let cli = Cli::parse_from(["localchain-orchestrator", "init"].iter().chain(args));
        let parsed = match cli.command {
            crate::cli::Commands::Init(args) => Some(args),
            _ => None,
        };
        parsed.unwrap()
    }

    #[test]
    fn family_defaults_fill_in_missing_choices() {
        let request = parse(&["dev", "-b", "tezos", "--remote-node-url", "https://rpc"]).request();
        assert_eq!(request.blockchain_connector, ConnectorKind::Tezosconnect);
        assert_eq!(request.blockchain_node_provider, NodeProvider::RemoteRpc);
        assert_eq!(request.member_count, 2);

        let request = parse(&["dev", "3", "-c", "ethconnect", "-n", "besu"]).request();
        assert_eq!(request.blockchain_provider, ChainFamily::Ethereum);
        assert_eq!(request.blockchain_connector, ConnectorKind::Ethconnect);
        assert_eq!(request.blockchain_node_provider, NodeProvider::Besu);
        assert_eq!(request.block_period, BLOCK_PERIOD_UNSET);
    }

    #[test]
    fn organisation_names_are_kept_in_order() {
        let request = parse(&["dev", "--org-name", "acme", "--org-name", "globex"]).request();
        assert_eq!(request.org_names, vec!["acme", "globex"]);
    }

    #[test]
    fn external_processes_reach_the_request() {
        assert_eq!(parse(&["dev"]).request().external_processes, 0);
        let request = parse(&["dev", "3", "--external-processes", "2"]).request();
        assert_eq!(request.external_processes, 2);
    }
}
