// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Chain family of the stack. Determines the shape of every member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChainFamily {
    Ethereum,
    Fabric,
    Tezos,
    Cardano,
}

string_enum!(ChainFamily {
    Ethereum => "ethereum",
    Fabric => "fabric",
    Tezos => "tezos",
    Cardano => "cardano",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    Ethconnect,
    Evmconnect,
    Fabconnect,
    Tezosconnect,
    Cardanoconnect,
}

string_enum!(ConnectorKind {
    Ethconnect => "ethconnect",
    Evmconnect => "evmconnect",
    Fabconnect => "fabconnect",
    Tezosconnect => "tezosconnect",
    Cardanoconnect => "cardanoconnect",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NodeProvider {
    Geth,
    Besu,
    Quorum,
    RemoteRpc,
    None,
}

string_enum!(NodeProvider {
    Geth => "geth",
    Besu => "besu",
    Quorum => "quorum",
    RemoteRpc => "remote-rpc",
    None => "none",
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Consensus {
    #[default]
    Clique,
    Ibft,
    Qbft,
    Raft,
}

string_enum!(Consensus {
    Clique => "clique",
    Ibft => "ibft",
    Qbft => "qbft",
    Raft => "raft",
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PrivateTransactionManager {
    #[default]
    None,
    Tessera,
}

string_enum!(PrivateTransactionManager {
    None => "none",
    Tessera => "tessera",
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Database {
    #[default]
    Sqlite3,
    Postgres,
}

string_enum!(Database {
    Sqlite3 => "sqlite3",
    Postgres => "postgres",
});
