// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Every volume, container and port the orchestrator touches is derived here,
//! so that configuration, first time setup and account unlocking agree on them.

use crate::error::OrchestratorError;
use crate::stack::types::ConnectorKind;
use serde::{Deserialize, Serialize};

/// Distance between the service port blocks of two consecutive members.
pub const MEMBER_PORT_STRIDE: u32 = 100;

/// Distance between the exposed ports of two consecutive nodes in multi-node topologies.
pub const NODE_PORT_MULTIPLIER: u32 = 10;

pub fn offset_port(base: u16, offset: u32) -> Result<u16, OrchestratorError> {
    u32::from(base)
        .checked_add(offset)
        .and_then(|port| u16::try_from(port).ok())
        .ok_or(OrchestratorError::PortOutOfRange { base, offset })
}

/// RPC port exposed on the host by the node owned by the member with the provided index.
pub fn node_rpc_port(exposed_blockchain_port: u16, index: usize) -> Result<u16, OrchestratorError> {
    node_port(exposed_blockchain_port, index)
}

/// Third party API port of the private transaction manager paired with the given node.
pub fn ptm_port(exposed_ptm_port: u16, index: usize) -> Result<u16, OrchestratorError> {
    node_port(exposed_ptm_port, index)
}

fn node_port(base: u16, index: usize) -> Result<u16, OrchestratorError> {
    let offset = u32::try_from(index)
        .ok()
        .and_then(|index| index.checked_mul(NODE_PORT_MULTIPLIER))
        .ok_or(OrchestratorError::PortOutOfRange {
            base,
            offset: u32::MAX,
        })?;
    offset_port(base, offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPorts {
    pub firefly: u16,
    pub admin: u16,
    pub connector: u16,
    pub ui: u16,
    pub database: u16,
    pub dataexchange: u16,
    pub ipfs_api: u16,
    pub ipfs_gateway: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_metrics: Option<u16>,
}

impl MemberPorts {
    pub fn compute(
        services_base_port: u16,
        firefly_base_port: u16,
        index: usize,
        prometheus_enabled: bool,
    ) -> Result<Self, OrchestratorError> {
        let index = u32::try_from(index).map_err(|_| OrchestratorError::PortOutOfRange {
            base: services_base_port,
            offset: u32::MAX,
        })?;
        let service_base = offset_port(
            services_base_port,
            index.saturating_mul(MEMBER_PORT_STRIDE),
        )?;

        // the shared blockchain node sits on the base port itself
        let (metrics, connector_metrics) = if prometheus_enabled {
            (
                Some(offset_port(service_base, 8)?),
                Some(offset_port(service_base, 9)?),
            )
        } else {
            (None, None)
        };

        Ok(MemberPorts {
            firefly: offset_port(firefly_base_port, index)?,
            admin: offset_port(service_base, 1)?,
            connector: offset_port(service_base, 2)?,
            ui: offset_port(service_base, 3)?,
            database: offset_port(service_base, 4)?,
            dataexchange: offset_port(service_base, 5)?,
            ipfs_api: offset_port(service_base, 6)?,
            ipfs_gateway: offset_port(service_base, 7)?,
            metrics,
            connector_metrics,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceNames<'a> {
    stack: &'a str,
}

impl<'a> ResourceNames<'a> {
    pub fn new(stack: &'a str) -> Self {
        ResourceNames { stack }
    }

    pub fn geth_volume(&self) -> String {
        format!("{}_geth", self.stack)
    }

    pub fn besu_volume(&self) -> String {
        format!("{}_besu", self.stack)
    }

    pub fn quorum_volume(&self, index: usize) -> String {
        format!("{}_quorum_{index}", self.stack)
    }

    pub fn quorum_service(index: usize) -> String {
        format!("quorum_{index}")
    }

    pub fn tessera_volume(&self, index: usize) -> String {
        format!("{}_tessera_{index}", self.stack)
    }

    pub fn tessera_container(&self, index: usize) -> String {
        format!("{}_member{index}tessera", self.stack)
    }

    pub fn connector_config_volume(&self, connector: ConnectorKind, index: usize) -> String {
        format!("{}_{connector}_config_{index}", self.stack)
    }

    pub fn connector_data_volume(&self, connector: ConnectorKind, member_id: &str) -> String {
        format!("{}_{connector}_data_{member_id}", self.stack)
    }

    pub fn connector_service(connector: ConnectorKind, member_id: &str) -> String {
        format!("{connector}_{member_id}")
    }

    pub fn firefly_core_container(&self, member_id: &str) -> String {
        format!("{}_firefly_core_{member_id}", self.stack)
    }

    pub fn firefly_core_service(member_id: &str) -> String {
        format!("firefly_core_{member_id}")
    }

    pub fn ethsigner_volume(&self) -> String {
        format!("{}_ethsigner", self.stack)
    }

    pub fn ethsigner_config_volume(&self) -> String {
        format!("{}_ethsigner_config", self.stack)
    }

    pub fn tezossigner_volume(&self) -> String {
        format!("{}_tezossigner", self.stack)
    }

    pub fn tezossigner_config_volume(&self) -> String {
        format!("{}_tezossigner_config", self.stack)
    }

    pub fn cardanosigner_volume(&self) -> String {
        format!("{}_cardanosigner", self.stack)
    }

    pub fn cardanosigner_container(&self) -> String {
        format!("{}_cardanosigner", self.stack)
    }

    pub fn fabric_volume(&self) -> String {
        format!("{}_firefly_fabric", self.stack)
    }

    pub fn network(&self) -> String {
        format!("{}_default", self.stack)
    }
}
