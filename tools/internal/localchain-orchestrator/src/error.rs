// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to initialise path '{}': {source}", path.display())]
    PathInitFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file '{}': {source}", path.display())]
    FileWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read file '{}': {source}", path.display())]
    FileReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove '{}': {source}", path.display())]
    PathRemovalFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to inspect '{}': {source}", path.display())]
    PathInspectFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "failed to load config file using path '{}'. detailed message: {source}", path.display()
    )]
    ConfigLoadFailure {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialise config: {0}")]
    ConfigSerialisationFailure(#[from] toml::ser::Error),

    #[error("could not determine the home directory of the current user")]
    NoHomeDirectory,

    #[error("stack '{name}' does not exist")]
    StackNotFound { name: String },

    #[error("stack '{name}' already exists. remove it first if you want to recreate it")]
    StackAlreadyExists { name: String },

    #[error("unsupported combination of blockchain provider '{provider}', connector '{connector}' and node provider '{node_provider}'")]
    UnsupportedProviderCombination {
        provider: String,
        connector: String,
        node_provider: String,
    },

    #[error("invalid stack definition: {message}")]
    InvalidStack { message: String },

    #[error("{usage}")]
    MissingArgument { usage: String },

    #[error("malformed {family} account: {reason}")]
    MalformedAccount { family: String, reason: String },

    #[error("account type mismatch: expected a {expected} account but the member holds a {actual} account")]
    AccountTypeMismatch { expected: String, actual: String },

    #[error("port arithmetic overflowed for base {base} and offset {offset}")]
    PortOutOfRange { base: u16, offset: u32 },

    #[error("{operation} is not supported by the {provider} provider")]
    UnsupportedOperation { provider: String, operation: String },

    #[error("you must pre-deploy your FireFly contract when using a remote RPC endpoint")]
    RemoteContractDeployment,

    #[error("contract '{name}' was not found in '{}'", path.display())]
    ContractNotFound { name: String, path: PathBuf },

    #[error("no contracts were found in '{}'", path.display())]
    NoContractsFound { path: PathBuf },

    #[error("failed to find installed chaincode '{label}'")]
    ChaincodeNotInstalled { label: String },

    #[error("no member of the stack belongs to organisation '{org_name}'")]
    OrganisationNotFound { org_name: String },

    #[error("{command}\nFailed [{code}] {output}")]
    CommandFailure {
        command: String,
        code: i32,
        output: String,
    },

    #[error("failed to spawn '{command}': {source}")]
    CommandSpawnFailure {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to construct the http client: {source}")]
    HttpClientInitFailure {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    TransportFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} [{status}] {body}")]
    UnexpectedHttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("{url} returned a JSON-RPC error [{code}]: {message}")]
    JsonRpcFailure {
        url: String,
        code: i64,
        message: String,
    },

    #[error("'{url}' is not a valid url: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{url} returned an empty response")]
    EmptyResponse { url: String },

    #[error("transaction {id} is still pending")]
    TransactionPending { id: String },

    #[error("transaction {id} failed: {reason}")]
    TransactionFailed { id: String, reason: String },

    #[error("could not reach {resource} after {attempts} attempts: {source}")]
    RetriesExhausted {
        resource: String,
        attempts: u32,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("operation against {resource} was cancelled")]
    Cancelled { resource: String },

    #[error("failed to render template '{name}': {source}")]
    TemplateRenderFailure {
        name: String,
        #[source]
        source: handlebars::TemplateRenderError,
    },

    #[error("no bundled asset is named '{name}'")]
    UnknownAsset { name: String },

    #[error("key generation failure: {message}")]
    KeyGenerationFailure { message: String },

    #[error(transparent)]
    JsonFailure(#[from] serde_json::Error),

    #[error(transparent)]
    YamlFailure(#[from] serde_yaml::Error),
}

impl OrchestratorError {
    pub(crate) fn missing_argument(usage: impl Into<String>) -> Self {
        OrchestratorError::MissingArgument {
            usage: usage.into(),
        }
    }

    pub(crate) fn unsupported(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        OrchestratorError::UnsupportedOperation {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    pub(crate) fn is_cancellation(&self) -> bool {
        matches!(self, OrchestratorError::Cancelled { .. })
    }
}
