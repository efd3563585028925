// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Tessera private transaction manager paired with every quorum node.

use crate::container::{platform_override, ContainerBackend};
use crate::error::OrchestratorError;
use crate::helpers::{init_path, read_file, write_executable};
use crate::render::templates::{render_asset, TESSERA_ENTRYPOINT};
use crate::stack::naming::ResourceNames;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENTRYPOINT_FILE: &str = "docker-entrypoint.sh";
pub const THIRD_PARTY_PORT: u16 = 9080;
pub const Q2T_PORT: u16 = 9101;
pub const P2P_PORT: u16 = 9000;

const KEY_NAME: &str = "tm";

#[derive(Serialize)]
struct EntrypointParams {
    third_party_port: u16,
    q2t_port: u16,
    p2p_port: u16,
    peers: String,
}

#[derive(Debug, Deserialize)]
struct PrivateKeyFile {
    data: PrivateKeyData,
}

#[derive(Debug, Deserialize)]
struct PrivateKeyData {
    bytes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesseraKeys {
    pub private_key: String,
    pub public_key: String,

    /// Location of the key pair, without the `.pub`/`.key` extension.
    pub path: PathBuf,
}

pub(crate) fn member_dir(dir: &Path, index: usize) -> PathBuf {
    dir.join("tessera").join(format!("tessera_{index}"))
}

pub(crate) fn keystore_dir(dir: &Path, index: usize) -> PathBuf {
    member_dir(dir, index).join("keystore")
}

/// Every node peers with the tessera instance of every member, itself included.
fn peer_list(stack_name: &str, member_count: usize) -> Result<String, OrchestratorError> {
    let names = ResourceNames::new(stack_name);
    let peers = (0..member_count)
        .map(|index| {
            serde_json::to_string(&json!({
                "url": format!("http://{}:{P2P_PORT}", names.tessera_container(index))
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(peers.join(","))
}

pub fn write_entrypoint(
    output_dir: &Path,
    stack_name: &str,
    member_count: usize,
) -> Result<PathBuf, OrchestratorError> {
    let rendered = render_asset(
        TESSERA_ENTRYPOINT,
        &EntrypointParams {
            third_party_port: THIRD_PARTY_PORT,
            q2t_port: Q2T_PORT,
            p2p_port: P2P_PORT,
            peers: peer_list(stack_name, member_count)?,
        },
    )?;
    let path = output_dir.join(ENTRYPOINT_FILE);
    write_executable(&path, rendered)?;
    Ok(path)
}

/// Generates the `tm.pub`/`tm.key` pair inside `output_dir` using the tessera image itself.
pub async fn create_keys(
    backend: &dyn ContainerBackend,
    image: &str,
    output_dir: &Path,
) -> Result<TesseraKeys, OrchestratorError> {
    init_path(output_dir)?;
    info!("generating tessera keys");

    let mut args = vec!["run".to_string()];
    // the platform flag has to precede the image
    if let Some(platform) = platform_override() {
        args.push("--platform".to_string());
        args.push(platform.to_string());
    }
    args.extend([
        "--rm".to_string(),
        "-v".to_string(),
        format!("{}:/keystore", output_dir.display()),
        image.to_string(),
        "-keygen".to_string(),
        "-filename".to_string(),
        format!("/keystore/{KEY_NAME}"),
    ]);
    backend.run_command(output_dir, &args).await?;

    let path = output_dir.join(KEY_NAME);
    let public_key = String::from_utf8_lossy(&read_file(path.with_extension("pub"))?).into_owned();
    let private: PrivateKeyFile = serde_json::from_slice(&read_file(path.with_extension("key"))?)?;

    Ok(TesseraKeys {
        private_key: private.data.bytes,
        public_key,
        path,
    })
}
