// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use handlebars::Handlebars;
use serde::Serialize;

pub const QUORUM_ENTRYPOINT: &str = "quorum/docker-entrypoint.sh";
pub const TESSERA_ENTRYPOINT: &str = "tessera/docker-entrypoint.sh";
pub const FABRIC_CONFIGTX: &str = "fabric/configtx.yaml";

/// Files bundled into the binary, keyed by their logical name.
static ASSETS: &[(&str, &str)] = &[
    (
        QUORUM_ENTRYPOINT,
        include_str!("../../assets/quorum/docker-entrypoint.sh.hbs"),
    ),
    (
        TESSERA_ENTRYPOINT,
        include_str!("../../assets/tessera/docker-entrypoint.sh.hbs"),
    ),
    (
        FABRIC_CONFIGTX,
        include_str!("../../assets/fabric/configtx.yaml"),
    ),
];

pub fn asset(name: &str) -> Result<&'static str, OrchestratorError> {
    ASSETS
        .iter()
        .find(|(asset_name, _)| *asset_name == name)
        .map(|(_, content)| *content)
        .ok_or_else(|| OrchestratorError::UnknownAsset {
            name: name.to_string(),
        })
}

/// Renders the named asset as a handlebars template over the typed parameters.
pub fn render_asset<T: Serialize>(name: &str, params: &T) -> Result<String, OrchestratorError> {
    let template = asset(name)?;

    let mut reg = Handlebars::new();
    reg.register_escape_fn(handlebars::no_escape);
    reg.render_template(template, params)
        .map_err(|source| OrchestratorError::TemplateRenderFailure {
            name: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bundled_asset_is_reachable() {
        for name in [QUORUM_ENTRYPOINT, TESSERA_ENTRYPOINT, FABRIC_CONFIGTX] {
            assert!(!asset(name).unwrap().is_empty());
        }
        assert!(matches!(
            asset("nope"),
            Err(OrchestratorError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn static_assets_are_valid_yaml() {
        let parsed: serde_yaml::Value = serde_yaml::from_str(asset(FABRIC_CONFIGTX).unwrap()).unwrap();
        assert!(parsed["Profiles"]["SingleOrgApplicationGenesis"].is_mapping());
    }
}
