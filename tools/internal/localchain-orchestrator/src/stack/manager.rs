// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Drives stacks through their lifecycle: init, start, stop and the ad hoc
//! operations (accounts, contract deployment) available afterwards.

use crate::blockchain::factory::new_provider;
use crate::blockchain::{BlockchainProvider, InitOptions, ProviderContext};
use crate::error::OrchestratorError;
use crate::genesis::BLOCK_PERIOD_UNSET;
use crate::helpers::{command_args, copy_dir_all, path_exists, remove_dir_all};
use crate::stack::account::Account;
use crate::stack::naming::{node_rpc_port, ptm_port, MemberPorts};
use crate::stack::types::{
    ChainFamily, ConnectorKind, Consensus, Database, NodeProvider, PrivateTransactionManager,
};
use crate::stack::{DeployedContract, Member, Stack, StackState, STACK_FILENAME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_SERVICES_BASE_PORT: u16 = 5100;
pub const DEFAULT_FIREFLY_BASE_PORT: u16 = 5000;
pub const DEFAULT_PTM_BASE_PORT: u16 = 4100;

/// Everything needed to create a brand new stack.
#[derive(Debug, Clone)]
pub struct InitRequest {
    pub name: String,
    pub member_count: usize,
    /// Number of leading members whose FireFly core runs outside of the container network.
    pub external_processes: usize,
    pub blockchain_provider: ChainFamily,
    pub blockchain_connector: ConnectorKind,
    pub blockchain_node_provider: NodeProvider,
    pub consensus: Consensus,
    pub private_transaction_manager: PrivateTransactionManager,
    pub database: Database,
    pub services_base_port: u16,
    pub firefly_base_port: u16,
    pub ptm_base_port: u16,
    pub prometheus_enabled: bool,
    pub org_names: Vec<String>,
    pub node_names: Vec<String>,
    pub contract_address: Option<String>,
    pub chain_id: Option<i64>,
    pub remote_node_url: Option<String>,
    pub request_timeout: Option<u32>,
    pub network: Option<String>,
    pub blockfrost_key: Option<String>,
    pub blockfrost_base_url: Option<String>,
    pub socket: Option<String>,
    pub block_period: i64,
    pub extra_connector_config_path: Option<PathBuf>,
}

impl InitRequest {
    pub fn new(
        name: impl Into<String>,
        member_count: usize,
        blockchain_provider: ChainFamily,
        blockchain_connector: ConnectorKind,
        blockchain_node_provider: NodeProvider,
    ) -> Self {
        InitRequest {
            name: name.into(),
            member_count,
            external_processes: 0,
            blockchain_provider,
            blockchain_connector,
            blockchain_node_provider,
            consensus: Consensus::default(),
            private_transaction_manager: PrivateTransactionManager::default(),
            database: Database::default(),
            services_base_port: DEFAULT_SERVICES_BASE_PORT,
            firefly_base_port: DEFAULT_FIREFLY_BASE_PORT,
            ptm_base_port: DEFAULT_PTM_BASE_PORT,
            prometheus_enabled: false,
            org_names: Vec::new(),
            node_names: Vec::new(),
            contract_address: None,
            chain_id: None,
            remote_node_url: None,
            request_timeout: None,
            network: None,
            blockfrost_key: None,
            blockfrost_base_url: None,
            socket: None,
            block_period: BLOCK_PERIOD_UNSET,
            extra_connector_config_path: None,
        }
    }

    fn validate(&self) -> Result<(), OrchestratorError> {
        let invalid = |message: String| Err(OrchestratorError::InvalidStack { message });
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name.starts_with('.') {
            return invalid(format!("'{}' is not a valid stack name", self.name));
        }
        if self.member_count == 0 {
            return invalid("a stack needs at least one member".to_string());
        }
        if self.external_processes > self.member_count {
            return invalid(format!(
                "{} external process(es) requested for {} member(s)",
                self.external_processes, self.member_count
            ));
        }
        let remote_node = self.blockchain_node_provider == NodeProvider::RemoteRpc
            && self.blockchain_provider != ChainFamily::Fabric;
        if remote_node {
            // cardano reaches its network through blockfrost or a local socket instead
            if self.blockchain_provider != ChainFamily::Cardano && self.remote_node_url.is_none() {
                return invalid("a remote-rpc stack needs the url of its remote node".to_string());
            }
            // remote networks never get the FireFly contract deployed for them
            if self.contract_address.is_none() {
                return invalid(
                    "a remote-rpc stack needs the address of its pre-deployed FireFly contract"
                        .to_string(),
                );
            }
        }
        if self.org_names.len() > self.member_count || self.node_names.len() > self.member_count {
            return invalid(format!(
                "more organisation or node names were provided than the {} member(s)",
                self.member_count
            ));
        }
        Ok(())
    }

    fn members(&self) -> Result<Vec<Member>, OrchestratorError> {
        (0..self.member_count)
            .map(|index| {
                Ok(Member {
                    id: index.to_string(),
                    index,
                    account: None,
                    ports: MemberPorts::compute(
                        self.services_base_port,
                        self.firefly_base_port,
                        index,
                        self.prometheus_enabled,
                    )?,
                    external: index < self.external_processes,
                    org_name: self
                        .org_names
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("org_{index}")),
                    node_name: self
                        .node_names
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("node_{index}")),
                })
            })
            .collect()
    }

    fn into_stack<P: AsRef<Path>>(self, stacks_dir: P) -> Result<Stack, OrchestratorError> {
        let members = self.members()?;
        Ok(Stack {
            name: self.name,
            members,
            // the shared node is published on the base port itself
            exposed_blockchain_port: self.services_base_port,
            exposed_ptm_port: self.ptm_base_port,
            database: self.database,
            blockchain_provider: self.blockchain_provider,
            blockchain_connector: self.blockchain_connector,
            blockchain_node_provider: self.blockchain_node_provider,
            consensus: self.consensus,
            private_transaction_manager: self.private_transaction_manager,
            prometheus_enabled: self.prometheus_enabled,
            contract_address: self.contract_address,
            chain_id: self.chain_id,
            remote_node_url: self.remote_node_url,
            request_timeout: self.request_timeout,
            network: self.network,
            blockfrost_key: self.blockfrost_key,
            blockfrost_base_url: self.blockfrost_base_url,
            socket: self.socket,
            stack_dir: PathBuf::new(),
            init_dir: PathBuf::new(),
            runtime_dir: PathBuf::new(),
            state: StackState::default(),
        }
        .with_paths(stacks_dir))
    }
}

/// Where the services of one member can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEndpoints {
    pub member_id: String,
    pub external: bool,
    /// Connector address configured into the member's FireFly core.
    pub core_connector_url: String,
    /// Connector address published on the host.
    pub host_connector_url: String,
    pub node_rpc_port: Option<u16>,
    pub ptm_port: Option<u16>,
}

/// Names of every stack found in `stacks_dir`, sorted.
pub fn list_stacks(stacks_dir: &Path) -> Result<Vec<String>, OrchestratorError> {
    if !path_exists(stacks_dir)? {
        return Ok(Vec::new());
    }
    let read_failure = |source| OrchestratorError::FileReadFailure {
        path: stacks_dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(stacks_dir).map_err(read_failure)? {
        let path = entry.map_err(read_failure)?.path();
        if path_exists(path.join(STACK_FILENAME))? {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

pub struct StackManager {
    stacks_dir: PathBuf,
    ctx: ProviderContext,
}

impl StackManager {
    pub fn new(stacks_dir: impl Into<PathBuf>, ctx: ProviderContext) -> Self {
        StackManager {
            stacks_dir: stacks_dir.into(),
            ctx,
        }
    }

    pub fn load(&self, name: &str) -> Result<Stack, OrchestratorError> {
        Stack::load(&self.stacks_dir, name)
    }

    fn provider(&self, stack: &Stack) -> Result<Box<dyn BlockchainProvider>, OrchestratorError> {
        new_provider(stack, self.ctx.clone())
    }

    pub async fn init(&self, request: InitRequest) -> Result<Stack, OrchestratorError> {
        request.validate()?;
        if path_exists(self.stacks_dir.join(&request.name).join(STACK_FILENAME))? {
            return Err(OrchestratorError::StackAlreadyExists { name: request.name });
        }

        let options = InitOptions {
            block_period: request.block_period,
            extra_connector_config_path: request.extra_connector_config_path.clone(),
        };
        let stack = request.into_stack(&self.stacks_dir)?;
        let provider = self.provider(&stack)?;
        self.initialise(stack, provider.as_ref(), &options).await
    }

    /// Mints one account per member, persists the stack then renders every init time artifact.
    pub(crate) async fn initialise(
        &self,
        mut stack: Stack,
        provider: &dyn BlockchainProvider,
        options: &InitOptions,
    ) -> Result<Stack, OrchestratorError> {
        info!(
            "initialising stack '{}' with {} member(s)",
            stack.name,
            stack.members.len()
        );

        for index in 0..stack.members.len() {
            let member = &stack.members[index];
            let args = vec![
                member.org_name.clone(),
                member.node_name.clone(),
                index.to_string(),
            ];
            let account = provider.create_account(&stack, &args).await?;
            debug!("member {index} got account {}", account.identifier());
            stack.state.accounts.push(account.clone());
            stack.members[index].account = Some(account);
        }

        stack.save()?;
        stack.save_state()?;
        provider.write_config(&stack, options).await?;
        info!("stack '{}' initialised in {}", stack.name, stack.stack_dir.display());
        Ok(stack)
    }

    pub async fn start(&self, name: &str) -> Result<Stack, OrchestratorError> {
        let mut stack = self.load(name)?;
        let provider = self.provider(&stack)?;
        self.run(&mut stack, provider.as_ref()).await?;
        Ok(stack)
    }

    /// Starts the stack. The first start promotes `init/` to `runtime/` and bootstraps the
    /// network; `runtime/` is only kept once that whole sequence succeeded.
    pub(crate) async fn run(
        &self,
        stack: &mut Stack,
        provider: &dyn BlockchainProvider,
    ) -> Result<(), OrchestratorError> {
        if stack.has_run_before()? {
            return self.start_containers(stack, provider, false).await;
        }

        info!("promoting the init directory of '{}' to runtime", stack.name);
        if let Err(err) = copy_dir_all(&stack.init_dir, &stack.runtime_dir) {
            remove_dir_all(&stack.runtime_dir)?;
            return Err(err);
        }
        match self.bootstrap(stack, provider).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    "first start of '{}' failed, discarding its runtime directory",
                    stack.name
                );
                remove_dir_all(&stack.runtime_dir)?;
                Err(err)
            }
        }
    }

    async fn bootstrap(
        &self,
        stack: &mut Stack,
        provider: &dyn BlockchainProvider,
    ) -> Result<(), OrchestratorError> {
        provider.first_time_setup(stack).await?;
        self.start_containers(stack, provider, true).await?;

        if let Some(address) = &stack.contract_address {
            info!("using the pre-deployed FireFly contract at {address}");
            return Ok(());
        }

        let result = provider.deploy_firefly_contract(stack).await?;
        if let Some(message) = &result.message {
            info!("{message}");
        }
        stack.state.deployed_contracts.push(result.deployed_contract);
        stack.save_state()
    }

    async fn start_containers(
        &self,
        stack: &Stack,
        provider: &dyn BlockchainProvider,
        first_time: bool,
    ) -> Result<(), OrchestratorError> {
        provider.pre_start(stack).await?;
        self.compose(stack, &["up", "-d"]).await?;
        provider.post_start(stack, first_time).await
    }

    pub async fn stop(&self, name: &str) -> Result<(), OrchestratorError> {
        let stack = self.load(name)?;
        self.compose(&stack, &["down"]).await
    }

    async fn compose(&self, stack: &Stack, args: &[&str]) -> Result<(), OrchestratorError> {
        let mut command = command_args(["compose", "-p", stack.name.as_str()]);
        command.extend(command_args(args));
        self.ctx
            .backend
            .run_command(&stack.stack_dir, &command)
            .await?;
        Ok(())
    }

    pub fn endpoints(&self, stack: &Stack) -> Result<Vec<MemberEndpoints>, OrchestratorError> {
        let provider = self.provider(stack)?;
        Self::member_endpoints(stack, provider.as_ref())
    }

    pub(crate) fn member_endpoints(
        stack: &Stack,
        provider: &dyn BlockchainProvider,
    ) -> Result<Vec<MemberEndpoints>, OrchestratorError> {
        stack
            .members
            .iter()
            .map(|member| {
                let node_rpc_port = match stack.blockchain_node_provider {
                    NodeProvider::Geth | NodeProvider::Besu => Some(stack.exposed_blockchain_port),
                    NodeProvider::Quorum => {
                        Some(node_rpc_port(stack.exposed_blockchain_port, member.index)?)
                    }
                    NodeProvider::RemoteRpc | NodeProvider::None => None,
                };
                let ptm_port = match stack.private_transaction_manager {
                    PrivateTransactionManager::Tessera => {
                        Some(ptm_port(stack.exposed_ptm_port, member.index)?)
                    }
                    PrivateTransactionManager::None => None,
                };
                Ok(MemberEndpoints {
                    member_id: member.id.clone(),
                    external: member.external,
                    core_connector_url: provider.core_connector_url(member),
                    host_connector_url: provider.connector_external_url(member),
                    node_rpc_port,
                    ptm_port,
                })
            })
            .collect()
    }

    pub async fn create_account(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Account, OrchestratorError> {
        let mut stack = self.load(name)?;
        let provider = self.provider(&stack)?;
        Self::add_account(&mut stack, provider.as_ref(), args).await
    }

    pub(crate) async fn add_account(
        stack: &mut Stack,
        provider: &dyn BlockchainProvider,
        args: &[String],
    ) -> Result<Account, OrchestratorError> {
        let account = provider.create_account(stack, args).await?;
        stack.state.accounts.push(account.clone());
        stack.save_state()?;
        info!("created account {}", account.identifier());
        Ok(account)
    }

    /// Deploys the first contract found in `filename` through the first local member.
    pub async fn deploy_contract(
        &self,
        name: &str,
        filename: &Path,
        extra_args: &[String],
    ) -> Result<DeployedContract, OrchestratorError> {
        let mut stack = self.load(name)?;
        let provider = self.provider(&stack)?;
        Self::deploy(&mut stack, provider.as_ref(), filename, extra_args).await
    }

    pub(crate) async fn deploy(
        stack: &mut Stack,
        provider: &dyn BlockchainProvider,
        filename: &Path,
        extra_args: &[String],
    ) -> Result<DeployedContract, OrchestratorError> {
        let names = provider.get_contracts(filename, extra_args)?;
        let Some(contract_name) = names.first() else {
            return Err(OrchestratorError::NoContractsFound {
                path: filename.to_path_buf(),
            });
        };
        if names.len() > 1 {
            warn!(
                "{} contains {} contracts, deploying '{contract_name}'",
                filename.display(),
                names.len()
            );
        }
        let member =
            stack
                .first_local_member()
                .cloned()
                .ok_or_else(|| OrchestratorError::InvalidStack {
                    message: "the stack has no local member to deploy through".to_string(),
                })?;

        let result = provider
            .deploy_contract(
                stack,
                filename,
                contract_name,
                contract_name,
                &member,
                extra_args,
            )
            .await?;
        stack
            .state
            .deployed_contracts
            .push(result.deployed_contract.clone());
        stack.save_state()?;
        Ok(result.deployed_contract)
    }
}
