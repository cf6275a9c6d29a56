//! Python lock generation
//!
//! The Python path differs from npm: a single manifest is chosen
//! (`requirements.txt` first, then `pyproject.toml`, then `Pipfile`, never
//! merged), direct packages keep their pins or resolve to the registry's
//! latest release, and each direct package contributes at most the first few
//! of its declared requirements as transitives. Entries carrying an
//! environment marker are skipped outright; markers are not evaluated.
//!
//! The artifact is line-oriented: a four-line comment header, an
//! alphabetical `# direct` block, then an alphabetical `# transitive` block.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::application::errors::ParseError;
use crate::application::events::ProgressSink;
use crate::domain::manifest::ManifestSet;
use crate::infrastructure::cache::{CacheKey, ResolutionCache};
use crate::infrastructure::parsers::python::{
    RequirementSpec, extract_pipfile, extract_pyproject, extract_requirements_txt,
    parse_requirement_line,
};
use crate::infrastructure::registries::FetchOutcome;
use crate::infrastructure::registries::pypi::PypiRegistryClient;

/// Pick the single manifest to extract from and return its direct
/// requirements, order-preserving and de-duplicated by name.
pub fn extract_direct(
    files: &ManifestSet,
) -> Result<Option<(String, Vec<RequirementSpec>)>, ParseError> {
    if let Some(content) = files.get("requirements.txt") {
        let specs = dedup_by_name(extract_requirements_txt(content));
        return Ok(Some(("requirements.txt".to_string(), specs)));
    }
    if let Some(content) = files.get("pyproject.toml") {
        let specs = dedup_by_name(extract_pyproject(content)?);
        return Ok(Some(("pyproject.toml".to_string(), specs)));
    }
    if let Some(content) = files.get("Pipfile") {
        let specs = dedup_by_name(extract_pipfile(content)?);
        return Ok(Some(("Pipfile".to_string(), specs)));
    }
    Ok(None)
}

fn dedup_by_name(specs: Vec<RequirementSpec>) -> Vec<RequirementSpec> {
    let mut seen = std::collections::HashSet::new();
    specs
        .into_iter()
        .filter(|spec| seen.insert(spec.name.clone()))
        .collect()
}

/// Generates a `requirements.lock` artifact for one project.
///
/// Owns nothing long-lived: the registry client is borrowed for one session
/// and the shared cache is consulted before every latest-version and
/// release-metadata lookup.
pub struct PythonLockGenerator<'a> {
    registry: &'a PypiRegistryClient,
    cache: Arc<ResolutionCache>,
    progress: Arc<dyn ProgressSink>,
    max_transitive: usize,
}

impl<'a> PythonLockGenerator<'a> {
    pub fn new(
        registry: &'a PypiRegistryClient,
        cache: Arc<ResolutionCache>,
        progress: Arc<dyn ProgressSink>,
        max_transitive: usize,
    ) -> Self {
        Self {
            registry,
            cache,
            progress,
            max_transitive,
        }
    }

    /// Produce the lock artifact, or `None` when no dependencies could be
    /// extracted or resolved. Malformed manifest content is fatal; individual
    /// registry failures only omit the affected package.
    pub async fn generate(&self, files: &ManifestSet) -> Result<Option<String>, ParseError> {
        let Some((source, specs)) = extract_direct(files)? else {
            return Ok(None);
        };
        if specs.is_empty() {
            return Ok(None);
        }
        self.progress
            .report(format!(
                "Extracted {} direct dependencies from {}",
                specs.len(),
                source
            ))
            .await;

        let mut direct: BTreeMap<String, String> = BTreeMap::new();
        for spec in &specs {
            let version = match &spec.exact {
                Some(version) => version.clone(),
                None => match self.latest_version(&spec.name).await {
                    Some(version) => version,
                    None => {
                        warn!(package = %spec.name, "could not determine latest version; omitted");
                        continue;
                    }
                },
            };
            direct.insert(spec.name.clone(), version);
        }
        if direct.is_empty() {
            return Ok(None);
        }

        let mut transitive: BTreeMap<String, String> = BTreeMap::new();
        for (name, version) in &direct {
            let Some(declared) = self.declared_requirements(name, version).await else {
                continue;
            };
            for raw in declared.iter().take(self.max_transitive) {
                if raw.contains(';') {
                    // Environment marker; not evaluated
                    continue;
                }
                let Some(spec) = parse_requirement_line(raw) else {
                    continue;
                };
                if direct.contains_key(&spec.name) || transitive.contains_key(&spec.name) {
                    continue;
                }
                let version = match &spec.exact {
                    Some(version) => version.clone(),
                    None => match self.latest_version(&spec.name).await {
                        Some(version) => version,
                        None => continue,
                    },
                };
                transitive.insert(spec.name.clone(), version);
            }
        }

        self.progress
            .report(format!(
                "Lock file generated: {} direct, {} transitive",
                direct.len(),
                transitive.len()
            ))
            .await;

        Ok(Some(Self::render(&source, &direct, &transitive)))
    }

    async fn latest_version(&self, name: &str) -> Option<String> {
        let key = CacheKey::new(name, "latest");
        if let Some(version) = self.cache.get::<String>(&key) {
            return Some(version);
        }

        match self.registry.fetch_project(name).await {
            FetchOutcome::Found(project) => {
                let version = project.info.version;
                self.cache.set(key, &version);
                Some(version)
            }
            FetchOutcome::NotFound => {
                warn!(package = name, "package not found on PyPI");
                None
            }
            FetchOutcome::Failed(err) => {
                warn!(package = name, error = %err, "PyPI fetch failed");
                None
            }
        }
    }

    async fn declared_requirements(&self, name: &str, version: &str) -> Option<Vec<String>> {
        let key = CacheKey::new(name, format!("release:{}", version));
        if let Some(declared) = self.cache.get::<Vec<String>>(&key) {
            return Some(declared);
        }

        match self.registry.fetch_release(name, version).await {
            FetchOutcome::Found(project) => {
                let declared = project.info.requires_dist.unwrap_or_default();
                self.cache.set(key, &declared);
                Some(declared)
            }
            FetchOutcome::NotFound => {
                warn!(package = name, version, "release not found on PyPI");
                None
            }
            FetchOutcome::Failed(err) => {
                warn!(package = name, version, error = %err, "PyPI release fetch failed");
                None
            }
        }
    }

    fn render(
        source: &str,
        direct: &BTreeMap<String, String>,
        transitive: &BTreeMap<String, String>,
    ) -> String {
        let mut out = String::new();
        out.push_str("# Locked requirements generated by lockforge. Do not edit by hand.\n");
        out.push_str(&format!("# Source manifest: {}\n", source));
        out.push_str(&format!("# Direct dependencies: {}\n", direct.len()));
        out.push_str(&format!("# Transitive dependencies: {}\n", transitive.len()));

        for (name, version) in direct {
            out.push_str(&format!("{}=={}  # direct\n", name, version));
        }
        for (name, version) in transitive {
            out.push_str(&format!("{}=={}  # transitive\n", name, version));
        }
        out
    }
}
