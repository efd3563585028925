// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Writing of per-member service configuration documents, with an optional operator supplied
//! overlay merged on top of the generated content.

use crate::error::OrchestratorError;
use crate::helpers::{read_file, write_file};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

pub mod templates;

/// Recursively merges `overlay` into `base`.
///
/// Mappings merge key by key, while scalars and sequences from the overlay replace
/// whatever the base held under the same key.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => merge_mappings(base, overlay),
        (base, overlay) => *base = overlay.clone(),
    }
}

fn merge_mappings(base: &mut Mapping, overlay: &Mapping) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Serialises the document as YAML into `path`. If `overlay_path` is provided, the overlay
/// file gets merged on top of the freshly written document and the result rewritten.
pub fn write_yaml_config<T: Serialize>(
    document: &T,
    path: &Path,
    overlay_path: Option<&Path>,
) -> Result<(), OrchestratorError> {
    let mut value = serde_yaml::to_value(document)?;

    if let Some(overlay_path) = overlay_path {
        let raw = read_file(overlay_path)?;
        let overlay: Value = serde_yaml::from_slice(&raw)?;
        // an empty overlay file parses as null and must not wipe the generated document
        if !overlay.is_null() {
            deep_merge(&mut value, &overlay);
        }
        debug!(
            "merged {} on top of {}",
            overlay_path.display(),
            path.display()
        );
    }

    write_file(path, serde_yaml::to_string(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(raw: &str) -> Value {
        serde_yaml::from_str(raw).unwrap()
    }

    #[test]
    fn overlay_scalars_and_sequences_replace_while_maps_merge() {
        let mut base = yaml(
            r#"
http:
  port: 5008
  address: 0.0.0.0
confirmations:
  required: 0
peers: [a, b, c]
"#,
        );
        let overlay = yaml(
            r#"
http:
  port: 6000
peers: [z]
extra: true
"#,
        );
        deep_merge(&mut base, &overlay);

        assert_eq!(
            base,
            yaml(
                r#"
http:
  port: 6000
  address: 0.0.0.0
confirmations:
  required: 0
peers: [z]
extra: true
"#
            )
        );
    }

    #[test]
    fn merging_is_idempotent() {
        let base = yaml("a: {b: 1, c: [1, 2]}\nd: x\n");
        let overlay = yaml("a: {c: [3], e: {f: 2}}\n");

        let mut once = base.clone();
        deep_merge(&mut once, &overlay);
        let mut twice = once.clone();
        deep_merge(&mut twice, &overlay);

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_overlay_is_a_no_op() {
        let base = yaml("a: {b: 1}\n");
        let mut merged = base.clone();
        deep_merge(&mut merged, &Value::Mapping(Mapping::new()));
        assert_eq!(merged, base);
    }

    #[test]
    fn written_config_includes_the_overlay() {
        #[derive(Serialize)]
        struct Doc {
            name: String,
            port: u16,
        }

        let dir = tempfile::tempdir().unwrap();
        let overlay_path = dir.path().join("extra.yaml");
        write_file(&overlay_path, "port: 9999\nlog: debug\n").unwrap();

        let target = dir.path().join("config").join("connector.yaml");
        let doc = Doc {
            name: "evmconnect".into(),
            port: 5008,
        };
        write_yaml_config(&doc, &target, Some(&overlay_path)).unwrap();

        let written: Value = serde_yaml::from_slice(&std::fs::read(&target).unwrap()).unwrap();
        assert_eq!(written, yaml("name: evmconnect\nport: 9999\nlog: debug\n"));

        let empty_overlay = dir.path().join("empty.yaml");
        write_file(&empty_overlay, "").unwrap();
        write_yaml_config(&doc, &target, Some(&empty_overlay)).unwrap();
        let written: Value = serde_yaml::from_slice(&std::fs::read(&target).unwrap()).unwrap();
        assert_eq!(written, yaml("name: evmconnect\nport: 5008\n"));
    }
}
