//! Dependency entities and value objects

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Package ecosystems supported by the resolution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ecosystem {
    Npm,
    PyPI,
}

impl Ecosystem {
    /// Canonical lowercase name used in cache keys and log output
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "pypi",
        }
    }

    pub fn all() -> &'static [Ecosystem] {
        &[Ecosystem::Npm, Ecosystem::PyPI]
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// One resolved dependency as handed to the vulnerability-matching collaborator.
///
/// Identity is `(ecosystem, name)`: the engine resolves one version per
/// package name per run, so two records never share a name within one result
/// set. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub is_dev: bool,
    /// Download URL reported by the registry, when known
    pub resolved_url: Option<String>,
    /// Integrity hash reported by the registry, when known
    pub integrity: Option<String>,
    /// Declared dependencies of this package: name -> range expression
    pub requires: BTreeMap<String, String>,
}

impl DependencyRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
            is_dev: false,
            resolved_url: None,
            integrity: None,
            requires: BTreeMap::new(),
        }
    }

    pub fn with_dev(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }

    pub fn with_resolved_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    pub fn with_integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    pub fn with_requires(mut self, requires: BTreeMap<String, String>) -> Self {
        self.requires = requires;
        self
    }

    /// Identity string, e.g. `npm:lodash`
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.ecosystem.canonical_name(), self.name)
    }
}

/// A direct dependency declared by a manifest, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependency {
    pub name: String,
    /// Range expression as written in the manifest, e.g. `^4.17.1`
    pub range: String,
    pub is_dev: bool,
}

impl DirectDependency {
    pub fn new(name: impl Into<String>, range: impl Into<String>, is_dev: bool) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            is_dev,
        }
    }
}

/// One package's concrete version plus registry metadata, produced by the
/// tree builder and consumed by the lock synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub version: String,
    pub tarball_url: Option<String>,
    pub integrity: Option<String>,
    pub is_dev: bool,
    /// Declared dependencies of the resolved version: name -> range
    pub requires: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_canonical_names() {
        assert_eq!(Ecosystem::Npm.canonical_name(), "npm");
        assert_eq!(Ecosystem::PyPI.canonical_name(), "pypi");
        assert_eq!(Ecosystem::all().len(), 2);
    }

    #[test]
    fn test_record_builder() {
        let record = DependencyRecord::new("lodash", "4.17.21", Ecosystem::Npm)
            .with_resolved_url("https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz")
            .with_integrity("sha512-abc");

        assert_eq!(record.identifier(), "npm:lodash");
        assert!(!record.is_dev);
        assert!(record.resolved_url.is_some());
        assert!(record.requires.is_empty());
    }

    #[test]
    fn test_record_dev_flag() {
        let record = DependencyRecord::new("jest", "29.0.0", Ecosystem::Npm).with_dev(true);
        assert!(record.is_dev);
    }
}
