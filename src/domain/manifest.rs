//! Manifest sets and file format tags

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dependency::Ecosystem;

/// Concrete dependency file formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    PackageJson,
    PackageLockJson,
    YarnLock,
    RequirementsTxt,
    RequirementsLock,
    PyprojectToml,
    Pipfile,
    PipfileLock,
    PoetryLock,
}

impl FileFormat {
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            FileFormat::PackageJson | FileFormat::PackageLockJson | FileFormat::YarnLock => {
                Ecosystem::Npm
            }
            FileFormat::RequirementsTxt
            | FileFormat::RequirementsLock
            | FileFormat::PyprojectToml
            | FileFormat::Pipfile
            | FileFormat::PipfileLock
            | FileFormat::PoetryLock => Ecosystem::PyPI,
        }
    }

    /// Whether the format encodes a fully resolved tree rather than declared ranges
    pub fn is_lockfile(&self) -> bool {
        matches!(
            self,
            FileFormat::PackageLockJson
                | FileFormat::YarnLock
                | FileFormat::RequirementsLock
                | FileFormat::PipfileLock
                | FileFormat::PoetryLock
        )
    }

    /// The filename this format is conventionally stored under
    pub fn canonical_filename(&self) -> &'static str {
        match self {
            FileFormat::PackageJson => "package.json",
            FileFormat::PackageLockJson => "package-lock.json",
            FileFormat::YarnLock => "yarn.lock",
            FileFormat::RequirementsTxt => "requirements.txt",
            FileFormat::RequirementsLock => "requirements.lock",
            FileFormat::PyprojectToml => "pyproject.toml",
            FileFormat::Pipfile => "Pipfile",
            FileFormat::PipfileLock => "Pipfile.lock",
            FileFormat::PoetryLock => "poetry.lock",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_filename())
    }
}

/// The set of dependency files supplied by the caller, filename -> raw text.
///
/// Never mutated in place: transformations such as lock synthesis return an
/// augmented copy via [`ManifestSet::with_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSet {
    files: BTreeMap<String, String>,
}

impl ManifestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, N, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            files: entries
                .into_iter()
                .map(|(name, content)| (name.into(), content.into()))
                .collect(),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.files.get(filename).map(String::as_str)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Return a copy of this set with one file added or replaced.
    pub fn with_file(&self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        let mut files = self.files.clone();
        files.insert(filename.into(), content.into());
        Self { files }
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for ManifestSet {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}
