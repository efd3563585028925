// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::ethereum::connector::{new_connector, Connector};
use crate::blockchain::ethereum::ethsigner::{EthSigner, ETHSIGNER_SERVICE};
use crate::blockchain::ethereum::{
    blockchain_dir, contract_names, deploy_contract_from_file, deploy_firefly_contract,
    validator_addresses, write_connector_configs, GENESIS_FILE,
};
use crate::blockchain::{copy_connector_configs, BlockchainProvider, InitOptions, ProviderContext};
use crate::error::OrchestratorError;
use crate::genesis::besu::Genesis;
use crate::genesis::write_genesis_json;
use crate::stack::account::Account;
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use async_trait::async_trait;
use std::path::Path;

pub const BESU_SERVICE: &str = "besu";

/// Besu node whose keys live in an ethsigner file wallet, so nothing ever needs unlocking.
pub struct BesuProvider {
    ctx: ProviderContext,
    connector: Box<dyn Connector>,
    signer: EthSigner,
}

impl BesuProvider {
    pub fn new(ctx: ProviderContext, connector: ConnectorKind) -> Result<Self, OrchestratorError> {
        Ok(BesuProvider {
            connector: new_connector(connector, ctx.clone())?,
            signer: EthSigner::new(ctx.clone()),
            ctx,
        })
    }
}

#[async_trait]
impl BlockchainProvider for BesuProvider {
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
            ETHSIGNER_SERVICE.to_string()
        })?;
        self.signer
            .write_config(stack, &format!("http://{BESU_SERVICE}:8545"))?;

        let genesis = Genesis::new(
            &validator_addresses(stack)?,
            options.block_period,
            stack.chain_id(),
        );
        write_genesis_json(&genesis, blockchain_dir(&stack.init_dir).join(GENESIS_FILE))
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        self.connector.first_time_setup(stack).await?;
        copy_connector_configs(&self.ctx, stack, self.connector.kind()).await?;
        self.signer.first_time_setup(stack).await?;

        let volume = stack.names().besu_volume();
        self.ctx.backend.create_volume(&volume).await?;
        self.ctx
            .backend
            .copy_file_to_volume(
                &volume,
                &blockchain_dir(&stack.runtime_dir).join(GENESIS_FILE),
                GENESIS_FILE,
            )
            .await
    }

    async fn post_start(
        &self,
        _stack: &Stack,
        _first_time_setup: bool,
    ) -> Result<(), OrchestratorError> {
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
        self.signer.create_account(stack).await
    }
}
