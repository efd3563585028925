// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Ethereum node providers and the pieces they share: wallet handling,
//! account unlocking and contract deployment through a connector.

use crate::blockchain::ethereum::connector::Connector;
use crate::blockchain::{connector_config_path, InitOptions, ProviderContext, BLOCKCHAIN_DIR};
use crate::contracts::{extract_firefly_contract, CompiledContracts, FIREFLY_CONTRACT_NAME};
use crate::error::OrchestratorError;
use crate::helpers::write_file;
use crate::keys::ethereum::strip_hex_prefix;
use crate::stack::account::EthereumAccount;
use crate::stack::{ContractDeploymentResult, Member, Stack};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod besu;
pub mod connector;
pub mod ethsigner;
pub mod geth;
pub mod quorum;
pub mod remote_rpc;
pub mod tessera;

pub const KEYSTORE_DIR: &str = "keystore";
pub const PASSWORD_FILE: &str = "password";
pub const GENESIS_FILE: &str = "genesis.json";

pub(crate) fn blockchain_dir(dir: &Path) -> PathBuf {
    dir.join(BLOCKCHAIN_DIR)
}

pub(crate) fn keystore_dir(dir: &Path) -> PathBuf {
    blockchain_dir(dir).join(KEYSTORE_DIR)
}

pub(crate) fn write_password_file(dir: &Path, password: &str) -> Result<PathBuf, OrchestratorError> {
    let path = blockchain_dir(dir).join(PASSWORD_FILE);
    write_file(&path, password)?;
    Ok(path)
}

pub(crate) fn ethereum_accounts(stack: &Stack) -> Result<Vec<&EthereumAccount>, OrchestratorError> {
    stack
        .members
        .iter()
        .map(|member| member.account()?.as_ethereum())
        .collect()
}

/// Member addresses, without the `0x` prefix, in member order.
pub(crate) fn validator_addresses(stack: &Stack) -> Result<Vec<String>, OrchestratorError> {
    Ok(ethereum_accounts(stack)?
        .into_iter()
        .map(|account| strip_hex_prefix(&account.address).to_string())
        .collect())
}

/// Writes one connector config per member, each targeting the node service chosen by `service`.
pub(crate) fn write_connector_configs<F>(
    connector: &dyn Connector,
    stack: &Stack,
    options: &InitOptions,
    service: F,
) -> Result<(), OrchestratorError>
where
    F: Fn(usize) -> String,
{
    for (index, member) in stack.members.iter().enumerate() {
        let path = connector_config_path(&stack.init_dir, connector.kind(), index);
        connector.write_config(
            stack,
            member,
            &service(index),
            &path,
            options.extra_connector_config_path.as_deref(),
        )?;
    }
    Ok(())
}

/// Places a freshly created wallet file inside the `/keystore` directory of the volume.
pub(crate) async fn copy_wallet_to_volume(
    ctx: &ProviderContext,
    wallet: &Path,
    volume: &str,
) -> Result<(), OrchestratorError> {
    ctx.backend.mkdir_in_volume(volume, "/keystore").await?;
    ctx.backend
        .copy_file_to_volume(volume, wallet, "/keystore")
        .await
}

pub(crate) async fn unlock_account(
    ctx: &ProviderContext,
    port: u16,
    address: &str,
) -> Result<(), OrchestratorError> {
    ctx.rpc
        .unlock_account(
            &format!("http://127.0.0.1:{port}"),
            address,
            &ctx.config.credentials.key_password,
            ctx.config.retry.unlock_policy(),
            &ctx.cancel,
        )
        .await
}

pub(crate) async fn deploy_firefly_contract(
    ctx: &ProviderContext,
    stack: &Stack,
    connector: &dyn Connector,
) -> Result<ContractDeploymentResult, OrchestratorError> {
    let contract = extract_firefly_contract(stack, ctx.backend.as_ref()).await?;
    let member = stack
        .members
        .first()
        .ok_or_else(|| OrchestratorError::InvalidStack {
            message: "stack has no members to deploy the FireFly contract with".to_string(),
        })?;
    info!("deploying the FireFly contract using member {}", member.id);
    connector
        .deploy_contract(&contract, FIREFLY_CONTRACT_NAME, member, &[])
        .await
}

pub(crate) fn contract_names(filename: &Path) -> Result<Vec<String>, OrchestratorError> {
    Ok(CompiledContracts::read(filename)?.names())
}

pub(crate) async fn deploy_contract_from_file(
    connector: &dyn Connector,
    filename: &Path,
    contract_name: &str,
    instance_name: &str,
    member: &Member,
    extra_args: &[String],
) -> Result<ContractDeploymentResult, OrchestratorError> {
    let contracts = CompiledContracts::read(filename)?;
    let contract = contracts.get(contract_name, filename)?;
    connector
        .deploy_contract(contract, instance_name, member, extra_args)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, ConnectorKind, NodeProvider};

    #[test]
    fn validators_are_listed_without_prefix_in_member_order() {
        let dir = tempfile::tempdir().unwrap();
        let stack = testing::stack(
            dir.path(),
            ChainFamily::Ethereum,
            ConnectorKind::Evmconnect,
            NodeProvider::Geth,
            vec![
                testing::ethereum_member(0, "0xbbbb"),
                testing::ethereum_member(1, "0xaaaa"),
            ],
        );
        assert_eq!(validator_addresses(&stack).unwrap(), vec!["bbbb", "aaaa"]);
    }

    #[test]
    fn non_ethereum_members_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut member = testing::ethereum_member(0, "0xaaaa");
        member.account = None;
        let stack = testing::stack(
            dir.path(),
            ChainFamily::Ethereum,
            ConnectorKind::Evmconnect,
            NodeProvider::Geth,
            vec![member],
        );
        assert!(validator_addresses(&stack).is_err());
    }
}
