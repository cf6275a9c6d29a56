//! npm lockfile synthesis
//!
//! Serializes a resolved map into the npm lockfile v2 schema, close enough
//! to the real thing that this crate's own `package-lock.json` parser reads
//! it back. Output is byte-deterministic for a fixed resolved map.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::domain::dependency::ResolvedPackage;
use crate::infrastructure::parsers::npm::NpmManifest;

pub struct NpmLockSynthesizer;

impl NpmLockSynthesizer {
    /// Build a lockfile v2 document from the resolved map.
    ///
    /// Returns `None` when the map is empty: an empty lock is never written,
    /// signalling lock-generation failure to the caller instead.
    pub fn synthesize(
        manifest: &NpmManifest,
        resolved: &BTreeMap<String, ResolvedPackage>,
    ) -> Option<String> {
        if resolved.is_empty() {
            return None;
        }

        let mut packages = Map::new();
        packages.insert("".to_string(), Self::root_entry(manifest));

        let mut legacy = Map::new();
        for (name, entry) in resolved {
            packages.insert(
                format!("node_modules/{}", name),
                Self::package_entry(entry, "dependencies"),
            );
            legacy.insert(name.clone(), Self::package_entry(entry, "requires"));
        }

        let lock = json!({
            "name": manifest.name,
            "version": manifest.version,
            "lockfileVersion": 2,
            "requires": true,
            "packages": packages,
            "dependencies": legacy,
        });

        serde_json::to_string_pretty(&lock).ok().map(|s| s + "\n")
    }

    fn root_entry(manifest: &NpmManifest) -> Value {
        let mut root = Map::new();
        root.insert("name".to_string(), json!(manifest.name));
        root.insert("version".to_string(), json!(manifest.version));

        let mut runtime = Map::new();
        let mut dev = Map::new();
        for dep in &manifest.direct {
            let target = if dep.is_dev { &mut dev } else { &mut runtime };
            target.insert(dep.name.clone(), json!(dep.range));
        }
        if !runtime.is_empty() {
            root.insert("dependencies".to_string(), Value::Object(runtime));
        }
        if !dev.is_empty() {
            root.insert("devDependencies".to_string(), Value::Object(dev));
        }

        Value::Object(root)
    }

    /// One resolved package entry. The logical dependency map is stored under
    /// `dependencies` in the `packages` section and `requires` in the legacy
    /// section, matching the v2 schema's duplication.
    fn package_entry(entry: &ResolvedPackage, edges_key: &str) -> Value {
        let mut node = Map::new();
        node.insert("version".to_string(), json!(entry.version));
        if let Some(tarball) = &entry.tarball_url {
            node.insert("resolved".to_string(), json!(tarball));
        }
        if let Some(integrity) = &entry.integrity {
            node.insert("integrity".to_string(), json!(integrity));
        }
        if entry.is_dev {
            node.insert("dev".to_string(), json!(true));
        }
        if !entry.requires.is_empty() {
            let edges: Map<String, Value> = entry
                .requires
                .iter()
                .map(|(name, range)| (name.clone(), json!(range)))
                .collect();
            node.insert(edges_key.to_string(), Value::Object(edges));
        }
        Value::Object(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dependency::DirectDependency;
    use crate::infrastructure::parsers::npm::PackageLockParser;

    fn sample_manifest() -> NpmManifest {
        NpmManifest {
            name: "my-app".to_string(),
            version: "1.0.0".to_string(),
            direct: vec![
                DirectDependency::new("express", "^4.17.1", false),
                DirectDependency::new("jest", "29.0.0", true),
            ],
        }
    }

    fn sample_resolved() -> BTreeMap<String, ResolvedPackage> {
        let mut resolved = BTreeMap::new();
        resolved.insert(
            "express".to_string(),
            ResolvedPackage {
                version: "4.17.1".to_string(),
                tarball_url: Some(
                    "https://registry.npmjs.org/express/-/express-4.17.1.tgz".to_string(),
                ),
                integrity: Some("sha512-express".to_string()),
                is_dev: false,
                requires: BTreeMap::from([("accepts".to_string(), "~1.3.7".to_string())]),
            },
        );
        resolved.insert(
            "accepts".to_string(),
            ResolvedPackage {
                version: "1.3.7".to_string(),
                tarball_url: None,
                integrity: None,
                is_dev: false,
                requires: BTreeMap::new(),
            },
        );
        resolved.insert(
            "jest".to_string(),
            ResolvedPackage {
                version: "29.0.0".to_string(),
                tarball_url: None,
                integrity: None,
                is_dev: true,
                requires: BTreeMap::new(),
            },
        );
        resolved
    }

    #[test]
    fn test_empty_resolved_map_produces_no_lock() {
        let manifest = sample_manifest();
        assert!(NpmLockSynthesizer::synthesize(&manifest, &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_lock_shape() {
        let content = NpmLockSynthesizer::synthesize(&sample_manifest(), &sample_resolved())
            .expect("non-empty map must produce a lock");

        let lock: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(lock["name"], "my-app");
        assert_eq!(lock["lockfileVersion"], 2);
        assert_eq!(lock["requires"], true);
        assert_eq!(lock["packages"][""]["name"], "my-app");
        assert_eq!(
            lock["packages"][""]["dependencies"]["express"],
            "^4.17.1"
        );
        assert_eq!(lock["packages"][""]["devDependencies"]["jest"], "29.0.0");
        assert_eq!(lock["packages"]["node_modules/express"]["version"], "4.17.1");
        assert_eq!(
            lock["packages"]["node_modules/express"]["dependencies"]["accepts"],
            "~1.3.7"
        );
        assert_eq!(lock["packages"]["node_modules/jest"]["dev"], true);
        assert_eq!(lock["dependencies"]["express"]["requires"]["accepts"], "~1.3.7");
    }

    #[test]
    fn test_lock_reparses_with_own_parser() {
        let content =
            NpmLockSynthesizer::synthesize(&sample_manifest(), &sample_resolved()).unwrap();

        let records = PackageLockParser.parse(&content).unwrap();
        assert_eq!(records.len(), 3);

        let express = records.iter().find(|r| r.name == "express").unwrap();
        assert_eq!(express.version, "4.17.1");
        assert_eq!(express.integrity.as_deref(), Some("sha512-express"));

        let jest = records.iter().find(|r| r.name == "jest").unwrap();
        assert!(jest.is_dev);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let manifest = sample_manifest();
        let resolved = sample_resolved();
        let first = NpmLockSynthesizer::synthesize(&manifest, &resolved).unwrap();
        let second = NpmLockSynthesizer::synthesize(&manifest, &resolved).unwrap();
        assert_eq!(first, second);
    }
}
