// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ethereum::connector::{new_connector, Connector};
use crate::blockchain::ethereum::{
    blockchain_dir, contract_names, copy_wallet_to_volume, deploy_contract_from_file,
    deploy_firefly_contract, keystore_dir, unlock_account, validator_addresses,
    write_connector_configs, write_password_file, GENESIS_FILE, PASSWORD_FILE,
};
use crate::blockchain::{copy_connector_configs, BlockchainProvider, InitOptions, ProviderContext};
use crate::error::OrchestratorError;
use crate::genesis::geth::Genesis;
use crate::genesis::write_genesis_json;
use crate::helpers::{command_args, unix_nanos};
use crate::keys::keystore::create_wallet_file;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

pub const GETH_SERVICE: &str = "geth";

/// Single clique sealing geth node holding the keys of every member.
pub struct GethProvider {
    ctx: ProviderContext,
    connector: Box<dyn Connector>,
}

impl GethProvider {
    pub fn new(ctx: ProviderContext, connector: ConnectorKind) -> Result<Self, OrchestratorError> {
        Ok(GethProvider {
            connector: new_connector(connector, ctx.clone())?,
            ctx,
        })
    }
}

#[async_trait]
impl BlockchainProvider for GethProvider {
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
        write_connector_configs(self.connector.as_ref(), stack, options, |_| {
            GETH_SERVICE.to_string()
        })?;

        let genesis = Genesis::geth(
            &validator_addresses(stack)?,
            options.block_period,
            stack.chain_id(),
        );
        write_genesis_json(&genesis, blockchain_dir(&stack.init_dir).join(GENESIS_FILE))?;
        write_password_file(&stack.init_dir, &self.ctx.config.credentials.key_password)?;
        Ok(())
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let volume = stack.names().geth_volume();
        let blockchain = blockchain_dir(&stack.runtime_dir);

        self.connector.first_time_setup(stack).await?;
        copy_connector_configs(&self.ctx, stack, self.connector.kind()).await?;

        let backend = &self.ctx.backend;
        backend.create_volume(&volume).await?;
        backend
            .copy_file_to_volume(&volume, &keystore_dir(&stack.runtime_dir), "/")
            .await?;
        backend
            .copy_file_to_volume(&volume, &blockchain.join(GENESIS_FILE), GENESIS_FILE)
            .await?;
        backend
            .copy_file_to_volume(&volume, &blockchain.join(PASSWORD_FILE), PASSWORD_FILE)
            .await?;

        info!("initialising the geth chain data");
        backend
            .run_command(
                &stack.stack_dir,
                &command_args([
                    "run",
                    "--rm",
                    "-v",
                    &format!("{volume}:/data"),
                    &self.ctx.config.images.geth,
                    "--datadir",
                    "/data",
                    "init",
                    "/data/genesis.json",
                ]),
            )
            .await?;
        Ok(())
    }

    async fn post_start(
        &self,
        stack: &Stack,
        _first_time_setup: bool,
    ) -> Result<(), OrchestratorError> {
        for account in &stack.state.accounts {
            let address = &account.as_ethereum()?.address;
            unlock_account(&self.ctx, stack.exposed_blockchain_port, address).await?;
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
        _args: &[String],
    ) -> Result<Account, OrchestratorError> {
        let has_run_before = stack.has_run_before()?;
        let directory = stack.active_dir()?;
        let credentials = &self.ctx.config.credentials;

        let (keypair, wallet) = create_wallet_file(
            &keystore_dir(directory),
            Some(&unix_nanos().to_string()),
            &credentials.key_password,
            credentials.keystore_kdf_rounds,
        )?;
        let account = keypair.to_account();

        if has_run_before {
            copy_wallet_to_volume(&self.ctx, &wallet, &stack.names().geth_volume()).await?;
            unlock_account(&self.ctx, stack.exposed_blockchain_port, &account.address).await?;
        }
        Ok(Account::Ethereum(account))
    }
}
