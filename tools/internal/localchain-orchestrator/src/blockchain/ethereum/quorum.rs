// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! GoQuorum network with one node per member, optionally paired with tessera.

use crate::blockchain::ethereum::connector::{new_connector, Connector};
use crate::blockchain::ethereum::{
    blockchain_dir, contract_names, copy_wallet_to_volume, deploy_contract_from_file,
    deploy_firefly_contract, tessera, unlock_account, validator_addresses,
    write_connector_configs, write_password_file, GENESIS_FILE, KEYSTORE_DIR, PASSWORD_FILE,
};
use crate::blockchain::{copy_connector_configs, BlockchainProvider, InitOptions, ProviderContext};
use crate::contracts::CONTRACTS_DIR;
use crate::error::OrchestratorError;
use crate::genesis::geth::{Genesis, QUORUM_DEFAULT_BLOCK_PERIOD};
use crate::genesis::{resolve_block_period, write_genesis_json};
use crate::helpers::{command_args, init_path, unix_nanos, write_executable};
use crate::keys::keystore::create_wallet_file;
use crate::render::templates::{render_asset, QUORUM_ENTRYPOINT};
use crate::stack::account::Account;
use crate::stack::naming::{node_rpc_port, ResourceNames};
use crate::stack::types::{ConnectorKind, PrivateTransactionManager};
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const QUORUM_RPC_PORT: u16 = 8545;
const CONNECT_TIMEOUT_SECS: u32 = 15;
const CREATE_ACCOUNT_USAGE: &str =
    "usage: ff accounts create <stack_name> <org_name> <node_name> <member_index>";

#[derive(Serialize)]
struct TesseraParams {
    url: String,
    third_party_port: u16,
    q2t_port: u16,
}

#[derive(Serialize)]
struct EntrypointParams {
    consensus: String,
    block_period: i64,
    raft_block_time: i64,
    rpc_port: u16,
    chain_id: i64,
    connect_timeout: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    tessera: Option<TesseraParams>,

    // every node but the first one discovers the network through node 0
    #[serde(skip_serializing_if = "Option::is_none")]
    bootnode_host: Option<String>,
}

fn node_dir(dir: &Path, index: usize) -> PathBuf {
    blockchain_dir(dir).join(format!("quorum_{index}"))
}

fn uses_tessera(stack: &Stack) -> bool {
    stack.private_transaction_manager == PrivateTransactionManager::Tessera
}

fn write_entrypoint(
    stack: &Stack,
    index: usize,
    block_period: i64,
) -> Result<PathBuf, OrchestratorError> {
    let block_period = resolve_block_period(block_period, QUORUM_DEFAULT_BLOCK_PERIOD);
    let tessera = uses_tessera(stack).then(|| TesseraParams {
        url: format!("http://{}", stack.names().tessera_container(index)),
        third_party_port: tessera::THIRD_PARTY_PORT,
        q2t_port: tessera::Q2T_PORT,
    });

    let rendered = render_asset(
        QUORUM_ENTRYPOINT,
        &EntrypointParams {
            consensus: stack.consensus.to_string(),
            block_period,
            raft_block_time: block_period * 60,
            rpc_port: QUORUM_RPC_PORT,
            chain_id: stack.chain_id(),
            connect_timeout: CONNECT_TIMEOUT_SECS,
            tessera,
            bootnode_host: (index != 0).then(|| ResourceNames::quorum_service(0)),
        },
    )?;
    let path = node_dir(&stack.init_dir, index).join(tessera::ENTRYPOINT_FILE);
    write_executable(&path, rendered)?;
    Ok(path)
}

fn member_index(stack: &Stack, args: &[String]) -> Result<usize, OrchestratorError> {
    let raw = args
        .get(2)
        .ok_or_else(|| OrchestratorError::missing_argument(CREATE_ACCOUNT_USAGE))?;
    raw.parse::<usize>()
        .ok()
        .filter(|index| *index < stack.members.len())
        .ok_or_else(|| OrchestratorError::InvalidStack {
            message: format!("'{raw}' is not the index of a member of stack {}", stack.name),
        })
}

pub struct QuorumProvider {
    ctx: ProviderContext,
    connector: Box<dyn Connector>,
}

impl QuorumProvider {
    pub fn new(ctx: ProviderContext, connector: ConnectorKind) -> Result<Self, OrchestratorError> {
        Ok(QuorumProvider {
            connector: new_connector(connector, ctx.clone())?,
            ctx,
        })
    }

    async fn unlock(
        &self,
        stack: &Stack,
        index: usize,
        address: &str,
    ) -> Result<(), OrchestratorError> {
        let port = node_rpc_port(stack.exposed_blockchain_port, index)?;
        unlock_account(&self.ctx, port, address).await
    }
}

#[async_trait]
impl BlockchainProvider for QuorumProvider {
    fn connector_kind(&self) -> ConnectorKind {
        self.connector.kind()
    }

    fn connector_port(&self) -> u16 {
        self.connector.port()
    }

    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError> {
        write_connector_configs(
            self.connector.as_ref(),
            stack,
            options,
            ResourceNames::quorum_service,
        )?;

        for index in 0..stack.members.len() {
            if uses_tessera(stack) {
                info!("generating tessera entrypoint for member {index}");
                tessera::write_entrypoint(
                    &tessera::member_dir(&stack.init_dir, index),
                    &stack.name,
                    stack.members.len(),
                )?;
            }
            info!("generating quorum entrypoint for member {index}");
            write_entrypoint(stack, index, options.block_period)?;
        }

        let genesis = Genesis::quorum(
            &validator_addresses(stack)?,
            options.block_period,
            stack.chain_id(),
        );
        write_genesis_json(&genesis, blockchain_dir(&stack.init_dir).join(GENESIS_FILE))?;
        write_password_file(&stack.init_dir, &self.ctx.config.credentials.key_password)?;
        Ok(())
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let names = stack.names();
        let runtime = &stack.runtime_dir;
        let blockchain = blockchain_dir(runtime);
        let backend = &self.ctx.backend;

        self.connector.first_time_setup(stack).await?;
        init_path(runtime.join(CONTRACTS_DIR))?;
        copy_connector_configs(&self.ctx, stack, self.connector.kind()).await?;

        for index in 0..stack.members.len() {
            let volume = names.quorum_volume(index);
            let node = node_dir(runtime, index);

            backend
                .copy_file_to_volume(&volume, &node.join(KEYSTORE_DIR), "/")
                .await?;

            if uses_tessera(stack) {
                let tessera_volume = names.tessera_volume(index);
                let tessera_dir = tessera::member_dir(runtime, index);
                backend.mkdir_in_volume(&tessera_volume, "/").await?;
                backend
                    .copy_file_to_volume(&tessera_volume, &tessera::keystore_dir(runtime, index), "/")
                    .await?;
                backend
                    .copy_file_to_volume(
                        &tessera_volume,
                        &tessera_dir.join(tessera::ENTRYPOINT_FILE),
                        "/",
                    )
                    .await?;
            }

            backend
                .copy_file_to_volume(&volume, &node.join(tessera::ENTRYPOINT_FILE), "/")
                .await?;
            backend
                .copy_file_to_volume(&volume, &blockchain.join(GENESIS_FILE), GENESIS_FILE)
                .await?;
            backend
                .copy_file_to_volume(&volume, &blockchain.join(PASSWORD_FILE), PASSWORD_FILE)
                .await?;

            info!("initialising the chain data of node {index}");
            backend
                .run_command(
                    &stack.stack_dir,
                    &command_args([
                        "run",
                        "--rm",
                        "-v",
                        &format!("{volume}:/data"),
                        &self.ctx.config.images.quorum,
                        "--datadir",
                        "/data",
                        "init",
                        "/data/genesis.json",
                    ]),
                )
                .await?;
        }
        Ok(())
    }

    async fn post_start(
        &self,
        stack: &Stack,
        _first_time_setup: bool,
    ) -> Result<(), OrchestratorError> {
        for account in &stack.state.accounts {
            let address = &account.as_ethereum()?.address;
            // accounts not owned by a member live on the first node
            let index = stack.member_index_by_address(address).unwrap_or(0);
            info!("unlocking account {address} on node {index}");
            self.unlock(stack, index, address).await?;
        }
        Ok(())
    }

    async fn deploy_firefly_contract(
        &self,
        stack: &Stack,
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        deploy_firefly_contract(&self.ctx, stack, self.connector.as_ref()).await
    }

    fn get_contracts(
        &self,
        filename: &Path,
        _extra_args: &[String],
    ) -> Result<Vec<String>, OrchestratorError> {
        contract_names(filename)
    }

    async fn deploy_contract(
        &self,
        _stack: &Stack,
        filename: &Path,
        contract_name: &str,
        instance_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        deploy_contract_from_file(
            self.connector.as_ref(),
            filename,
            contract_name,
            instance_name,
            member,
            extra_args,
        )
        .await
    }

    async fn create_account(
        &self,
        stack: &Stack,
        args: &[String],
    ) -> Result<Account, OrchestratorError> {
        let index = member_index(stack, args)?;
        let has_run_before = stack.has_run_before()?;
        let directory = stack.active_dir()?;
        let credentials = &self.ctx.config.credentials;

        let (keypair, wallet) = create_wallet_file(
            &node_dir(directory, index).join(KEYSTORE_DIR),
            Some(&unix_nanos().to_string()),
            &credentials.key_password,
            credentials.keystore_kdf_rounds,
        )?;
        let mut account = keypair.to_account();

        if uses_tessera(stack) {
            let keys = tessera::create_keys(
                self.ctx.backend.as_ref(),
                &self.ctx.config.images.tessera,
                &tessera::keystore_dir(directory, index),
            )
            .await?;
            info!("tessera keys generated in {}", keys.path.display());
            account.ptm_public_key = Some(keys.public_key);
        }

        if has_run_before {
            copy_wallet_to_volume(&self.ctx, &wallet, &stack.names().quorum_volume(index)).await?;
            self.unlock(stack, index, &account.address).await?;
        }
        Ok(Account::Ethereum(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{args, context, offline_context};
    use crate::container::testing::{fake_tessera_keygen, RecordingBackend};
    use crate::rpc::testing::{Scripted, ScriptedTransport};
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, Consensus, NodeProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn quorum_stack(dir: &Path, members: usize, tessera: bool) -> Stack {
        let mut stack = testing::stack(
            dir,
            ChainFamily::Ethereum,
            ConnectorKind::Evmconnect,
            NodeProvider::Quorum,
            (0..members)
                .map(|i| testing::ethereum_member(i, &format!("0x{i:040x}")))
                .collect(),
        );
        stack.consensus = Consensus::Ibft;
        if tessera {
            stack.private_transaction_manager = PrivateTransactionManager::Tessera;
        }
        stack
    }

    #[tokio::test]
    async fn write_config_renders_one_entrypoint_per_member() {
        let dir = tempfile::tempdir().unwrap();
        let stack = quorum_stack(dir.path(), 2, true);
        let provider = QuorumProvider::new(
            offline_context(Arc::new(RecordingBackend::new())),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        provider
            .write_config(
                &stack,
                &InitOptions {
                    block_period: -1,
                    extra_connector_config_path: None,
                },
            )
            .await
            .unwrap();

        let init = &stack.init_dir;
        let first =
            std::fs::read_to_string(init.join("blockchain/quorum_0/docker-entrypoint.sh")).unwrap();
        let second =
            std::fs::read_to_string(init.join("blockchain/quorum_1/docker-entrypoint.sh")).unwrap();
        assert!(first.contains("GOQUORUM_CONS_ALGO=ibft"));
        assert!(first.contains("--istanbul.blockperiod 5"));
        assert!(first.contains("BOOTNODE_CMD=\"\""));
        assert!(first.contains("TESSERA_URL=http://dev_member0tessera"));
        assert!(second.contains("BOOTNODE_HOST=quorum_0"));
        assert!(second.contains("TESSERA_URL=http://dev_member1tessera"));
        assert!(init.join("tessera/tessera_1/docker-entrypoint.sh").exists());

        let connector: serde_yaml::Value = serde_yaml::from_slice(
            &std::fs::read(init.join("config/evmconnect_1.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(connector["connector"]["url"], "http://quorum_1:8545");
        assert!(init.join("blockchain/genesis.json").exists());
    }

    #[tokio::test]
    async fn first_time_setup_seeds_every_member_volume() {
        let dir = tempfile::tempdir().unwrap();
        let stack = quorum_stack(dir.path(), 2, true);
        let backend = Arc::new(RecordingBackend::new());
        let provider =
            QuorumProvider::new(offline_context(backend.clone()), ConnectorKind::Evmconnect)
                .unwrap();

        provider.first_time_setup(&stack).await.unwrap();

        let copies = backend.copies_to_volume();
        let count = |volume: &str| copies.iter().filter(|(v, _, _)| v == volume).count();
        assert_eq!(count("dev_quorum_0"), 4);
        assert_eq!(count("dev_quorum_1"), 4);
        assert_eq!(count("dev_tessera_0"), 2);
        assert_eq!(count("dev_tessera_1"), 2);
        assert_eq!(count("dev_evmconnect_config_0"), 1);

        let inits: Vec<_> = backend
            .commands()
            .into_iter()
            .filter(|c| c.contains(&"init".to_string()))
            .collect();
        assert_eq!(inits.len(), 2);
        assert!(inits[1].contains(&"dev_quorum_1:/data".to_string()));
    }

    #[tokio::test]
    async fn accounts_are_unlocked_on_the_node_of_their_member() {
        let dir = tempfile::tempdir().unwrap();
        let mut stack = quorum_stack(dir.path(), 3, false);
        stack.state.accounts = stack
            .members
            .iter()
            .filter_map(|m| m.account.clone())
            .collect();
        let transport = ScriptedTransport::new(vec![Scripted::Respond(
            200,
            json!({"jsonrpc": "2.0", "id": 0, "result": true}),
        )]);
        let provider = QuorumProvider::new(
            context(Arc::new(RecordingBackend::new()), transport.clone()),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        provider.post_start(&stack, true).await.unwrap();
        let urls: Vec<String> = transport.recorded().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:5100",
                "http://127.0.0.1:5110",
                "http://127.0.0.1:5120"
            ]
        );
    }

    #[tokio::test]
    async fn new_accounts_on_a_running_stack_land_on_the_requested_node() {
        let dir = tempfile::tempdir().unwrap();
        let stack = quorum_stack(dir.path(), 2, true);
        std::fs::create_dir_all(&stack.runtime_dir).unwrap();
        let backend =
            Arc::new(RecordingBackend::new().with_command_handler(fake_tessera_keygen));
        let transport = ScriptedTransport::new(vec![Scripted::Respond(
            200,
            json!({"jsonrpc": "2.0", "id": 0, "result": true}),
        )]);
        let provider = QuorumProvider::new(
            context(backend.clone(), transport.clone()),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        let account = provider
            .create_account(&stack, &args(&["org_1", "node_1", "1"]))
            .await
            .unwrap();
        let account = account.as_ethereum().unwrap();
        assert_eq!(account.ptm_public_key.as_deref(), Some("tessera-public-key"));

        let copies = backend.copies_to_volume();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].0, "dev_quorum_1");
        assert!(copies[0]
            .1
            .starts_with(stack.runtime_dir.join("blockchain/quorum_1/keystore")));
        assert_eq!(transport.recorded()[0].url, "http://127.0.0.1:5110");
    }

    #[tokio::test]
    async fn member_index_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let stack = quorum_stack(dir.path(), 1, false);
        let provider = QuorumProvider::new(
            offline_context(Arc::new(RecordingBackend::new())),
            ConnectorKind::Evmconnect,
        )
        .unwrap();

        let err = provider
            .create_account(&stack, &args(&["org_0", "node_0"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), CREATE_ACCOUNT_USAGE);

        assert!(matches!(
            provider
                .create_account(&stack, &args(&["org_0", "node_0", "7"]))
                .await,
            Err(OrchestratorError::InvalidStack { .. })
        ));
    }
}
