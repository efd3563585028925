// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Single peer fabric network with one orderer, driven through the fabric tools image.

use crate::blockchain::fabric::config::{
    write_cryptogen_config, write_fabconnect_config, write_network_config, FABCONNECT_PORT,
};
use crate::blockchain::fabric::fabconnect::FabconnectClient;
use crate::blockchain::{
    external_url, BlockchainProvider, InitOptions, ProviderContext, BLOCKCHAIN_DIR,
};
use crate::contracts::{CONTRACTS_DIR, FIREFLY_CONTRACT_NAME};
use crate::error::OrchestratorError;
use crate::helpers::{init_path, write_file};
use crate::render::templates::{asset, FABRIC_CONFIGTX};
use crate::stack::account::{Account, FabricAccount};
use crate::stack::types::ConnectorKind;
use crate::stack::{ContractDeploymentResult, DeployedContract, Member, Stack};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod config;
pub mod fabconnect;

pub const CHANNEL: &str = "firefly";
pub const CHAINCODE_NAME: &str = "firefly";
pub const CHAINCODE_VERSION: &str = "1.0";

const CRYPTOGEN_FILE: &str = "cryptogen.yaml";
const NETWORK_CONFIG_FILE: &str = "ccp.yaml";
const FABCONNECT_CONFIG_FILE: &str = "fabconnect.yaml";
const CONFIGTX_FILE: &str = "configtx.yaml";
const CHAINCODE_PACKAGE: &str = "firefly_fabric.tar.gz";

// fabric only publishes amd64 images
const PLATFORM: &str = "linux/amd64";

const ORDERER_ADMIN_TLS: &str =
    "/etc/firefly/organizations/ordererOrganizations/example.com/users/Admin@example.com/tls";
const ORDERER_TLS_CA: &str = "/etc/firefly/organizations/ordererOrganizations/example.com/orderers/fabric_orderer.example.com/msp/tlscacerts/tlsca.example.com-cert.pem";
const PEER_ENV: [&str; 5] = [
    "CORE_PEER_ADDRESS=fabric_peer:7051",
    "CORE_PEER_TLS_ENABLED=true",
    "CORE_PEER_TLS_ROOTCERT_FILE=/etc/firefly/organizations/peerOrganizations/org1.example.com/peers/fabric_peer.org1.example.com/tls/ca.crt",
    "CORE_PEER_LOCALMSPID=Org1MSP",
    "CORE_PEER_MSPCONFIGPATH=/etc/firefly/organizations/peerOrganizations/org1.example.com/users/Admin@org1.example.com/msp",
];

const CREATE_ACCOUNT_USAGE: &str = "usage: ff accounts create <stack_name> <org_name> <account_name>";
const DEPLOY_USAGE: &str = "usage: ff deploy <stack_name> <filename> <channel> <chaincode> <version>";

#[derive(Debug, Deserialize)]
struct QueryInstalledResponse {
    #[serde(default)]
    installed_chaincodes: Vec<InstalledChaincode>,
}

#[derive(Debug, Deserialize)]
struct InstalledChaincode {
    package_id: String,
    label: String,
}

fn blockchain_dir(dir: &Path) -> PathBuf {
    dir.join(BLOCKCHAIN_DIR)
}

fn chaincode_location(name: &str, channel: &str, chaincode: &str) -> ContractDeploymentResult {
    ContractDeploymentResult {
        message: None,
        deployed_contract: DeployedContract {
            name: name.to_string(),
            location: json!({ "channel": channel, "chaincode": chaincode }),
        },
    }
}

fn positional<'a>(
    args: &'a [String],
    index: usize,
    missing: &str,
    usage: &str,
) -> Result<&'a str, OrchestratorError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| OrchestratorError::missing_argument(format!("{missing} not set. {usage}")))
}

pub struct FabricProvider {
    ctx: ProviderContext,
}

impl FabricProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        FabricProvider { ctx }
    }

    /// `docker run` invocation of the fabric tools image with the shared crypto volume mounted.
    fn tools_command(
        &self,
        stack: &Stack,
        networked: bool,
        env: &[&str],
        mounts: &[String],
        command: &[&str],
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--platform".into(),
            PLATFORM.into(),
            "--rm".into(),
        ];
        if networked {
            args.push(format!("--network={}", stack.names().network()));
        }
        for var in env {
            args.push("-e".into());
            args.push((*var).to_string());
        }
        for mount in mounts {
            args.push("-v".into());
            args.push(mount.clone());
        }
        args.push("-v".into());
        args.push(format!("{}:/etc/firefly", stack.names().fabric_volume()));
        args.push(self.ctx.config.images.fabric_tools.clone());
        args.extend(command.iter().map(|part| part.to_string()));
        args
    }

    async fn create_channel(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        info!("creating channel {CHANNEL}");
        let ca_file = format!("{ORDERER_ADMIN_TLS}/ca.crt");
        let client_cert = format!("{ORDERER_ADMIN_TLS}/client.crt");
        let client_key = format!("{ORDERER_ADMIN_TLS}/client.key");
        let args = self.tools_command(
            stack,
            true,
            &[],
            &[],
            &[
                "osnadmin",
                "channel",
                "join",
                "--channelID",
                CHANNEL,
                "--config-block",
                "/etc/firefly/firefly.block",
                "-o",
                "fabric_orderer:7053",
                "--ca-file",
                &ca_file,
                "--client-cert",
                &client_cert,
                "--client-key",
                &client_key,
            ],
        );
        self.ctx.backend.run_command(&stack.stack_dir, &args).await?;
        Ok(())
    }

    async fn join_channel(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        info!("joining channel {CHANNEL}");
        let args = self.tools_command(
            stack,
            true,
            &PEER_ENV,
            &[],
            &["peer", "channel", "join", "-b", "/etc/firefly/firefly.block"],
        );
        self.ctx.backend.run_command(&stack.stack_dir, &args).await?;
        Ok(())
    }

    async fn install_chaincode(
        &self,
        stack: &Stack,
        package: &Path,
    ) -> Result<(), OrchestratorError> {
        info!("installing chaincode {}", package.display());
        let args = self.tools_command(
            stack,
            true,
            &PEER_ENV,
            &[format!("{}:/package.tar.gz", package.display())],
            &["peer", "lifecycle", "chaincode", "install", "/package.tar.gz"],
        );
        self.ctx
            .backend
            .run_command(&stack.runtime_dir.join(CONTRACTS_DIR), &args)
            .await?;
        Ok(())
    }

    async fn query_installed(
        &self,
        stack: &Stack,
    ) -> Result<Vec<InstalledChaincode>, OrchestratorError> {
        info!("querying installed chaincode");
        let args = self.tools_command(
            stack,
            true,
            &PEER_ENV,
            &[],
            &[
                "peer",
                "lifecycle",
                "chaincode",
                "queryinstalled",
                "--output",
                "json",
            ],
        );
        let output = self
            .ctx
            .backend
            .run_command(&stack.runtime_dir, &args)
            .await?;
        let response: QueryInstalledResponse = serde_json::from_str(&output)?;
        Ok(response.installed_chaincodes)
    }

    async fn approve_chaincode(
        &self,
        stack: &Stack,
        channel: &str,
        chaincode: &str,
        version: &str,
        package_id: &str,
    ) -> Result<(), OrchestratorError> {
        info!("approving chaincode {chaincode} on {channel}");
        let args = self.tools_command(
            stack,
            true,
            &PEER_ENV,
            &[],
            &[
                "peer",
                "lifecycle",
                "chaincode",
                "approveformyorg",
                "-o",
                "fabric_orderer:7050",
                "--ordererTLSHostnameOverride",
                "fabric_orderer",
                "--channelID",
                channel,
                "--name",
                chaincode,
                "--version",
                version,
                "--package-id",
                package_id,
                "--sequence",
                "1",
                "--tls",
                "--cafile",
                ORDERER_TLS_CA,
            ],
        );
        self.ctx.backend.run_command(&stack.runtime_dir, &args).await?;
        Ok(())
    }

    async fn commit_chaincode(
        &self,
        stack: &Stack,
        channel: &str,
        chaincode: &str,
        version: &str,
    ) -> Result<(), OrchestratorError> {
        info!("committing chaincode {chaincode} on {channel}");
        let args = self.tools_command(
            stack,
            true,
            &PEER_ENV,
            &[],
            &[
                "peer",
                "lifecycle",
                "chaincode",
                "commit",
                "-o",
                "fabric_orderer:7050",
                "--ordererTLSHostnameOverride",
                "fabric_orderer",
                "--channelID",
                channel,
                "--name",
                chaincode,
                "--version",
                version,
                "--sequence",
                "1",
                "--tls",
                "--cafile",
                ORDERER_TLS_CA,
            ],
        );
        self.ctx.backend.run_command(&stack.runtime_dir, &args).await?;
        Ok(())
    }

    async fn extract_chaincode(&self, stack: &Stack) -> Result<PathBuf, OrchestratorError> {
        let contracts_dir = stack.runtime_dir.join(CONTRACTS_DIR);
        init_path(&contracts_dir)?;

        let member = stack
            .first_local_member()
            .ok_or_else(|| OrchestratorError::InvalidStack {
                message: "unable to extract contracts from container - no valid firefly core containers found in stack".to_string(),
            })?;
        let container = stack.names().firefly_core_container(&member.id);
        let package = contracts_dir.join(CHAINCODE_PACKAGE);

        info!("extracting chaincode from {container}");
        self.ctx
            .backend
            .copy_from_container(
                &container,
                &format!("/firefly/contracts/{CHAINCODE_PACKAGE}"),
                &package,
            )
            .await?;
        Ok(package)
    }

    async fn register_identity(
        &self,
        member: &Member,
        name: &str,
    ) -> Result<FabricAccount, OrchestratorError> {
        FabconnectClient::new(&self.ctx, external_url(member))
            .register(name)
            .await?;
        Ok(FabricAccount {
            name: name.to_string(),
            org_name: member.org_name.clone(),
        })
    }
}

#[async_trait]
impl BlockchainProvider for FabricProvider {
    fn connector_kind(&self) -> ConnectorKind {
        ConnectorKind::Fabconnect
    }

    fn connector_port(&self) -> u16 {
        FABCONNECT_PORT
    }

    async fn write_config(
        &self,
        stack: &Stack,
        options: &InitOptions,
    ) -> Result<(), OrchestratorError> {
        let dir = blockchain_dir(&stack.init_dir);
        init_path(&dir)?;

        write_cryptogen_config(stack.members.len(), &dir.join(CRYPTOGEN_FILE))?;
        write_network_config(CHANNEL, &dir.join(NETWORK_CONFIG_FILE))?;
        write_fabconnect_config(
            &dir.join(FABCONNECT_CONFIG_FILE),
            options.extra_connector_config_path.as_deref(),
        )?;
        write_file(dir.join(CONFIGTX_FILE), asset(FABRIC_CONFIGTX)?)
    }

    async fn first_time_setup(&self, stack: &Stack) -> Result<(), OrchestratorError> {
        let dir = blockchain_dir(&stack.runtime_dir);
        let backend = &self.ctx.backend;
        backend.create_volume(&stack.names().fabric_volume()).await?;

        info!("generating the MSP material");
        let cryptogen = self.tools_command(
            stack,
            false,
            &[],
            &[format!("{}:/etc/template.yml", dir.join(CRYPTOGEN_FILE).display())],
            &[
                "cryptogen",
                "generate",
                "--config",
                "/etc/template.yml",
                "--output",
                "/etc/firefly/organizations",
            ],
        );
        backend.run_command(&dir, &cryptogen).await?;

        info!("generating the genesis block");
        let configtxgen = self.tools_command(
            stack,
            false,
            &[],
            &[format!(
                "{}:/etc/hyperledger/fabric/configtx.yaml",
                dir.join(CONFIGTX_FILE).display()
            )],
            &[
                "configtxgen",
                "-outputBlock",
                "/etc/firefly/firefly.block",
                "-profile",
                "SingleOrgApplicationGenesis",
                "-channelID",
                CHANNEL,
            ],
        );
        backend.run_command(&dir, &configtxgen).await?;
        Ok(())
    }

    async fn post_start(
        &self,
        stack: &Stack,
        first_time_setup: bool,
    ) -> Result<(), OrchestratorError> {
        if !first_time_setup {
            return Ok(());
        }
        self.create_channel(stack).await?;
        self.join_channel(stack).await?;

        info!("registering identities");
        for member in &stack.members {
            let name = match &member.account {
                Some(account) => account.as_fabric()?.name.clone(),
                None => member.org_name.clone(),
            };
            self.register_identity(member, &name).await?;
        }
        Ok(())
    }

    async fn deploy_firefly_contract(
        &self,
        stack: &Stack,
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        let package = self.extract_chaincode(stack).await?;
        self.install_chaincode(stack, &package).await?;

        let installed = self.query_installed(stack).await?;
        let chaincode =
            installed
                .first()
                .ok_or_else(|| OrchestratorError::ChaincodeNotInstalled {
                    label: CHAINCODE_NAME.to_string(),
                })?;

        self.approve_chaincode(
            stack,
            CHANNEL,
            CHAINCODE_NAME,
            CHAINCODE_VERSION,
            &chaincode.package_id,
        )
        .await?;
        self.commit_chaincode(stack, CHANNEL, CHAINCODE_NAME, CHAINCODE_VERSION)
            .await?;
        Ok(chaincode_location(
            FIREFLY_CONTRACT_NAME,
            CHANNEL,
            CHAINCODE_NAME,
        ))
    }

    /// A chaincode package is deployed as a whole.
    fn get_contracts(
        &self,
        filename: &Path,
        _extra_args: &[String],
    ) -> Result<Vec<String>, OrchestratorError> {
        Ok(vec![filename.display().to_string()])
    }

    async fn deploy_contract(
        &self,
        stack: &Stack,
        filename: &Path,
        _contract_name: &str,
        _instance_name: &str,
        _member: &Member,
        extra_args: &[String],
    ) -> Result<ContractDeploymentResult, OrchestratorError> {
        let channel = positional(extra_args, 0, "channel", DEPLOY_USAGE)?;
        let chaincode = positional(extra_args, 1, "chaincode", DEPLOY_USAGE)?;
        let version = positional(extra_args, 2, "version", DEPLOY_USAGE)?;
        let package = std::path::absolute(filename).map_err(|source| {
            OrchestratorError::PathInspectFailure {
                path: filename.to_path_buf(),
                source,
            }
        })?;

        self.install_chaincode(stack, &package).await?;
        let installed = self.query_installed(stack).await?;
        let package_id = installed
            .iter()
            .find(|installed| installed.label == chaincode)
            .map(|installed| installed.package_id.clone())
            .ok_or_else(|| OrchestratorError::ChaincodeNotInstalled {
                label: chaincode.to_string(),
            })?;

        self.approve_chaincode(stack, channel, chaincode, version, &package_id)
            .await?;
        self.commit_chaincode(stack, channel, chaincode, version)
            .await?;
        Ok(chaincode_location(FIREFLY_CONTRACT_NAME, channel, chaincode))
    }

    async fn create_account(
        &self,
        stack: &Stack,
        args: &[String],
    ) -> Result<Account, OrchestratorError> {
        let org_name = positional(args, 0, "org name", CREATE_ACCOUNT_USAGE)?;
        let account_name = positional(args, 1, "account name", CREATE_ACCOUNT_USAGE)?;

        if !stack.has_run_before()? {
            return Ok(Account::Fabric(FabricAccount {
                name: account_name.to_string(),
                org_name: org_name.to_string(),
            }));
        }

        let member =
            stack
                .member_by_org(org_name)
                .ok_or_else(|| OrchestratorError::OrganisationNotFound {
                    org_name: org_name.to_string(),
                })?;
        Ok(Account::Fabric(
            self.register_identity(member, account_name).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{args, context, offline_context};
    use crate::container::testing::{BackendCall, RecordingBackend};
    use crate::rpc::testing::{Scripted, ScriptedTransport};
    use crate::stack::naming::MemberPorts;
    use crate::stack::testing;
    use crate::stack::types::{ChainFamily, NodeProvider};
    use std::sync::Arc;

    fn fabric_member(index: usize) -> Member {
        Member {
            id: index.to_string(),
            index,
            account: Some(Account::Fabric(FabricAccount {
                name: format!("org_{index}"),
                org_name: format!("org_{index}"),
            })),
            ports: MemberPorts::compute(5100, 5000, index, false).unwrap(),
            external: false,
            org_name: format!("org_{index}"),
            node_name: format!("node_{index}"),
        }
    }

    fn fabric_stack(dir: &Path, members: usize) -> Stack {
        testing::stack(
            dir,
            ChainFamily::Fabric,
            ConnectorKind::Fabconnect,
            NodeProvider::None,
            (0..members).map(fabric_member).collect(),
        )
    }

    fn installed_handler(args: &[String]) -> Result<String, OrchestratorError> {
        if args.iter().any(|arg| arg == "queryinstalled") {
            return Ok(json!({
                "installed_chaincodes": [
                    {"package_id": "asset:abc123", "label": "asset"},
                    {"package_id": "firefly:def456", "label": "firefly"}
                ]
            })
            .to_string());
        }
        Ok(String::new())
    }

    #[tokio::test]
    async fn write_config_lays_out_the_network_documents() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 2);
        let provider = FabricProvider::new(offline_context(Arc::new(RecordingBackend::new())));

        provider
            .write_config(&stack, &InitOptions::default())
            .await
            .unwrap();

        let blockchain = stack.init_dir.join("blockchain");
        for file in ["cryptogen.yaml", "ccp.yaml", "fabconnect.yaml", "configtx.yaml"] {
            assert!(blockchain.join(file).exists(), "{file} is missing");
        }
    }

    #[tokio::test]
    async fn first_time_setup_generates_crypto_material_then_the_genesis_block() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 1);
        let backend = Arc::new(RecordingBackend::new());
        let provider = FabricProvider::new(offline_context(backend.clone()));

        provider.first_time_setup(&stack).await.unwrap();

        assert_eq!(
            backend.calls()[0],
            BackendCall::CreateVolume("dev_firefly_fabric".to_string())
        );
        let commands = backend.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains(&"cryptogen".to_string()));
        assert!(commands[0].contains(&"dev_firefly_fabric:/etc/firefly".to_string()));
        assert!(commands[1].contains(&"configtxgen".to_string()));
        assert_eq!(commands[1][2], "linux/amd64");
    }

    #[tokio::test]
    async fn first_start_joins_the_channel_and_registers_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 2);
        let backend = Arc::new(RecordingBackend::new());
        let transport = ScriptedTransport::new(vec![
            Scripted::Respond(200, json!({"name": "org_0", "secret": "a"})),
            Scripted::Respond(200, json!({"name": "org_0", "success": true})),
            Scripted::Respond(200, json!({"name": "org_1", "secret": "b"})),
            Scripted::Respond(200, json!({"name": "org_1", "success": true})),
        ]);
        let provider = FabricProvider::new(context(backend.clone(), transport.clone()));

        provider.post_start(&stack, true).await.unwrap();

        let commands = backend.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains(&"osnadmin".to_string()));
        assert!(commands[0].contains(&"--network=dev_default".to_string()));
        assert!(commands[1].contains(&"peer".to_string()));

        let urls: Vec<String> = transport.recorded().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:5102/identities",
                "http://127.0.0.1:5102/identities/org_0/enroll",
                "http://127.0.0.1:5202/identities",
                "http://127.0.0.1:5202/identities/org_1/enroll",
            ]
        );
    }

    #[tokio::test]
    async fn later_starts_do_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 1);
        let backend = Arc::new(RecordingBackend::new());
        let provider = FabricProvider::new(offline_context(backend.clone()));

        provider.post_start(&stack, false).await.unwrap();
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn firefly_chaincode_goes_through_the_whole_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 1);
        let backend = Arc::new(RecordingBackend::new().with_command_handler(installed_handler));
        let provider = FabricProvider::new(offline_context(backend.clone()));

        let result = provider.deploy_firefly_contract(&stack).await.unwrap();
        assert_eq!(
            result.deployed_contract.location,
            json!({"channel": "firefly", "chaincode": "firefly"})
        );

        assert!(matches!(
            &backend.calls()[0],
            BackendCall::CopyFromContainer { container, .. } if container == "dev_firefly_core_0"
        ));
        let commands = backend.commands();
        let steps: Vec<&str> = commands.iter().map(|c| c[c.len() - 1].as_str()).collect();
        assert_eq!(steps[0], "/package.tar.gz");
        assert_eq!(steps[1], "json");
        assert!(commands[2].contains(&"approveformyorg".to_string()));
        assert!(commands[2].contains(&"asset:abc123".to_string()));
        assert!(commands[3].contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn custom_chaincode_is_matched_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 1);
        let backend = Arc::new(RecordingBackend::new().with_command_handler(installed_handler));
        let provider = FabricProvider::new(offline_context(backend.clone()));
        let member = &stack.members[0];

        let result = provider
            .deploy_contract(
                &stack,
                Path::new("asset.tar.gz"),
                "",
                "",
                member,
                &args(&["mychannel", "firefly", "2.0"]),
            )
            .await
            .unwrap();
        assert_eq!(result.deployed_contract.location["channel"], "mychannel");
        assert!(backend.commands()[2].contains(&"firefly:def456".to_string()));

        let err = provider
            .deploy_contract(&stack, Path::new("x.tar.gz"), "", "", member, &args(&["c", "missing", "1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ChaincodeNotInstalled { .. }));

        let err = provider
            .deploy_contract(&stack, Path::new("x.tar.gz"), "", "", member, &args(&["c"]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "chaincode not set. usage: ff deploy <stack_name> <filename> <channel> <chaincode> <version>"
        );
    }

    #[tokio::test]
    async fn accounts_are_only_registered_once_the_network_runs() {
        let dir = tempfile::tempdir().unwrap();
        let stack = fabric_stack(dir.path(), 1);
        let backend = Arc::new(RecordingBackend::new());
        let provider = FabricProvider::new(offline_context(backend.clone()));

        let account = provider
            .create_account(&stack, &args(&["org_0", "alice"]))
            .await
            .unwrap();
        assert_eq!(
            account,
            Account::Fabric(FabricAccount {
                name: "alice".to_string(),
                org_name: "org_0".to_string()
            })
        );

        let err = provider
            .create_account(&stack, &args(&["org_0"]))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("account name not set."));

        std::fs::create_dir_all(&stack.runtime_dir).unwrap();
        assert!(matches!(
            provider
                .create_account(&stack, &args(&["org_9", "alice"]))
                .await,
            Err(OrchestratorError::OrganisationNotFound { .. })
        ));
    }
}
