// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::blockchain::cardano::CardanoProvider;
use crate::blockchain::ethereum::besu::BesuProvider;
use crate::blockchain::ethereum::geth::GethProvider;
use crate::blockchain::ethereum::quorum::QuorumProvider;
use crate::blockchain::ethereum::remote_rpc::RemoteRpcProvider;
use crate::blockchain::fabric::FabricProvider;
use crate::blockchain::tezos::TezosProvider;
use crate::blockchain::{BlockchainProvider, ProviderContext};
use crate::error::OrchestratorError;
use crate::stack::types::{ChainFamily, ConnectorKind, NodeProvider};
use crate::stack::Stack;

/// Resolves the provider implementing the (family, connector, node provider) triple of the stack.
pub fn new_provider(
    stack: &Stack,
    ctx: ProviderContext,
) -> Result<Box<dyn BlockchainProvider>, OrchestratorError> {
    let connector = stack.blockchain_connector;
    let provider: Box<dyn BlockchainProvider> = match (
        stack.blockchain_provider,
        connector,
        stack.blockchain_node_provider,
    ) {
        (ChainFamily::Ethereum, ConnectorKind::Ethconnect | ConnectorKind::Evmconnect, node) => {
            match node {
                NodeProvider::Geth => Box::new(GethProvider::new(ctx, connector)?),
                NodeProvider::Besu => Box::new(BesuProvider::new(ctx, connector)?),
                NodeProvider::Quorum => Box::new(QuorumProvider::new(ctx, connector)?),
                NodeProvider::RemoteRpc => Box::new(RemoteRpcProvider::new(ctx, connector)?),
                NodeProvider::None => return Err(unsupported(stack)),
            }
        }
        (ChainFamily::Fabric, ConnectorKind::Fabconnect, _) => Box::new(FabricProvider::new(ctx)),
        (ChainFamily::Tezos, ConnectorKind::Tezosconnect, NodeProvider::RemoteRpc) => {
            Box::new(TezosProvider::new(ctx))
        }
        (ChainFamily::Cardano, ConnectorKind::Cardanoconnect, NodeProvider::RemoteRpc) => {
            Box::new(CardanoProvider::new(ctx))
        }
        _ => return Err(unsupported(stack)),
    };
    Ok(provider)
}

fn unsupported(stack: &Stack) -> OrchestratorError {
    OrchestratorError::UnsupportedProviderCombination {
        provider: stack.blockchain_provider.to_string(),
        connector: stack.blockchain_connector.to_string(),
        node_provider: stack.blockchain_node_provider.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::offline_context;
    use crate::container::testing::RecordingBackend;
    use crate::stack::testing;
    use std::sync::Arc;

    fn resolve(
        family: ChainFamily,
        connector: ConnectorKind,
        node: NodeProvider,
    ) -> Result<Box<dyn BlockchainProvider>, OrchestratorError> {
        let dir = tempfile::tempdir().unwrap();
        let stack = testing::stack(dir.path(), family, connector, node, vec![]);
        new_provider(&stack, offline_context(Arc::new(RecordingBackend::new())))
    }

    #[test]
    fn supported_triples_resolve_with_their_connector() {
        let cases = [
            (ChainFamily::Ethereum, ConnectorKind::Ethconnect, NodeProvider::Geth, 8080),
            (ChainFamily::Ethereum, ConnectorKind::Evmconnect, NodeProvider::Besu, 5008),
            (ChainFamily::Ethereum, ConnectorKind::Evmconnect, NodeProvider::Quorum, 5008),
            (ChainFamily::Ethereum, ConnectorKind::Ethconnect, NodeProvider::RemoteRpc, 8080),
            (ChainFamily::Fabric, ConnectorKind::Fabconnect, NodeProvider::None, 3000),
            (ChainFamily::Tezos, ConnectorKind::Tezosconnect, NodeProvider::RemoteRpc, 5008),
            (ChainFamily::Cardano, ConnectorKind::Cardanoconnect, NodeProvider::RemoteRpc, 3000),
        ];
        for (family, connector, node, port) in cases {
            let provider = resolve(family, connector, node).unwrap();
            assert_eq!(provider.connector_kind(), connector);
            assert_eq!(provider.connector_port(), port);
        }
    }

    #[test]
    fn connector_urls_differ_between_network_and_host() {
        let provider =
            resolve(ChainFamily::Ethereum, ConnectorKind::Evmconnect, NodeProvider::Geth).unwrap();
        let member = testing::ethereum_member(1, "0xbbbb");
        assert_eq!(provider.connector_url(&member), "http://evmconnect_1:5008");
        assert_eq!(
            provider.connector_external_url(&member),
            "http://127.0.0.1:5202"
        );
    }

    #[test]
    fn mismatched_triples_are_configuration_errors() {
        let cases = [
            (ChainFamily::Ethereum, ConnectorKind::Fabconnect, NodeProvider::Geth),
            (ChainFamily::Ethereum, ConnectorKind::Evmconnect, NodeProvider::None),
            (ChainFamily::Tezos, ConnectorKind::Tezosconnect, NodeProvider::Geth),
            (ChainFamily::Cardano, ConnectorKind::Evmconnect, NodeProvider::RemoteRpc),
            (ChainFamily::Fabric, ConnectorKind::Ethconnect, NodeProvider::None),
        ];
        for (family, connector, node) in cases {
            assert!(matches!(
                resolve(family, connector, node),
                Err(OrchestratorError::UnsupportedProviderCombination { .. })
            ));
        }
    }
}
