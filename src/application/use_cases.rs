//! Resolution use cases
//!
//! The entry points the surrounding service calls: resolve a project's
//! dependency set from whatever files were supplied, and compare two scan
//! summaries for consistency.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::AnalysisError;
use crate::application::events::{NoopProgress, ProgressSink};
use crate::config::Config;
use crate::domain::consistency::{ConsistencyReport, ScanSummary};
use crate::domain::dependency::{DependencyRecord, Ecosystem};
use crate::domain::manifest::{FileFormat, ManifestSet};
use crate::infrastructure::cache::ResolutionCache;
use crate::infrastructure::parsers::{ParserFactory, factory_for, npm};
use crate::infrastructure::registries::npm::NpmRegistryClient;
use crate::infrastructure::registries::pypi::PypiRegistryClient;
use crate::services::npm_lock::NpmLockSynthesizer;
use crate::services::npm_tree::NpmTreeBuilder;
use crate::services::python_lock::PythonLockGenerator;

/// A lock artifact materialized during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedLock {
    pub filename: String,
    pub content: String,
}

/// Result of one resolution call
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// The final dependency set for the vulnerability-matching collaborator
    pub records: Vec<DependencyRecord>,
    /// File the records were parsed from (possibly a synthesized lock)
    pub source_file: String,
    pub format: FileFormat,
    /// Present when a lock artifact was generated during this call
    pub synthesized_lock: Option<SynthesizedLock>,
}

/// Resolves a project's dependency set from the supplied manifest/lock files.
///
/// Owns a handle to the shared resolution cache; registry clients are
/// constructed per call and dropped when the call returns, which tears down
/// their connection pools on success and failure paths alike.
pub struct ResolveDependenciesUseCase {
    config: Config,
    cache: Arc<ResolutionCache>,
    progress: Arc<dyn ProgressSink>,
}

impl ResolveDependenciesUseCase {
    pub fn new(config: Config, cache: Arc<ResolutionCache>) -> Self {
        Self {
            config,
            cache,
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Handle to the shared cache for administrative operations
    /// (`clear`, `stats`, `cleanup`).
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Resolve the dependency set for one ecosystem.
    ///
    /// Picks the most complete available file; when only a manifest is
    /// present, materializes a lock artifact via registry-backed transitive
    /// resolution and parses that. Falls back to manifest-only parsing when
    /// lock generation yields nothing. The input set is never mutated.
    pub async fn resolve(
        &self,
        ecosystem: Ecosystem,
        files: &ManifestSet,
    ) -> Result<ResolutionOutcome, AnalysisError> {
        let factory = factory_for(ecosystem);
        let (filename, format) = factory.detect_best_format(files)?;
        self.progress
            .report(format!("Selected {} for {} resolution", filename, ecosystem))
            .await;

        if format.is_lockfile() {
            let records = Self::parse_file(factory.as_ref(), files, &filename)?;
            info!(
                file = %filename,
                count = records.len(),
                "dependencies parsed from provided lock file"
            );
            return Ok(ResolutionOutcome {
                records,
                source_file: filename,
                format,
                synthesized_lock: None,
            });
        }

        let synthesized = match ecosystem {
            Ecosystem::Npm => self.synthesize_npm_lock(files, &filename).await?,
            Ecosystem::PyPI => self.synthesize_python_lock(files).await?,
        };

        match synthesized {
            Some((lock_name, lock_content, lock_format)) => {
                self.progress
                    .report(format!("Lock file {} generated", lock_name))
                    .await;
                let augmented = files.with_file(lock_name.clone(), lock_content.clone());
                let records = Self::parse_file(factory.as_ref(), &augmented, &lock_name)?;
                Ok(ResolutionOutcome {
                    records,
                    source_file: lock_name.clone(),
                    format: lock_format,
                    synthesized_lock: Some(SynthesizedLock {
                        filename: lock_name,
                        content: lock_content,
                    }),
                })
            }
            None => {
                warn!(
                    file = %filename,
                    "lock generation produced no entries; falling back to manifest parsing"
                );
                let records = Self::parse_file(factory.as_ref(), files, &filename)?;
                Ok(ResolutionOutcome {
                    records,
                    source_file: filename,
                    format,
                    synthesized_lock: None,
                })
            }
        }
    }

    fn parse_file(
        factory: &dyn ParserFactory,
        files: &ManifestSet,
        filename: &str,
    ) -> Result<Vec<DependencyRecord>, AnalysisError> {
        let content = files.get(filename).ok_or(AnalysisError::NoSupportedFile)?;
        let parser = factory.get_parser(filename, content)?;
        Ok(parser.parse(content)?)
    }

    async fn synthesize_npm_lock(
        &self,
        files: &ManifestSet,
        manifest_name: &str,
    ) -> Result<Option<(String, String, FileFormat)>, AnalysisError> {
        let content = files.get(manifest_name).ok_or(AnalysisError::NoSupportedFile)?;
        let manifest = npm::parse_manifest(content)?;
        if manifest.direct.is_empty() {
            // Nothing to resolve; an empty lock is never written
            return Ok(None);
        }

        let registry = match NpmRegistryClient::new(
            &self.config.registry,
            self.config.resolution.batch_size,
        ) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "could not construct npm registry client; skipping lock synthesis");
                return Ok(None);
            }
        };

        let builder = NpmTreeBuilder::new(&registry, self.cache.clone(), self.progress.clone());
        let resolved = builder.resolve(&manifest.direct).await;
        // The registry session ends here; dropping the client closes its pool

        Ok(NpmLockSynthesizer::synthesize(&manifest, &resolved).map(|content| {
            (
                "package-lock.json".to_string(),
                content,
                FileFormat::PackageLockJson,
            )
        }))
    }

    async fn synthesize_python_lock(
        &self,
        files: &ManifestSet,
    ) -> Result<Option<(String, String, FileFormat)>, AnalysisError> {
        let registry = match PypiRegistryClient::new(&self.config.registry) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "could not construct PyPI registry client; skipping lock synthesis");
                return Ok(None);
            }
        };

        let generator = PythonLockGenerator::new(
            &registry,
            self.cache.clone(),
            self.progress.clone(),
            self.config.resolution.max_transitive_requirements,
        );
        let artifact = generator.generate(files).await?;

        Ok(artifact.map(|content| {
            (
                "requirements.lock".to_string(),
                content,
                FileFormat::RequirementsLock,
            )
        }))
    }
}

/// Compare two scan summaries, conventionally manifest-only first and
/// lockfile second. Fails when either summary is missing; the comparison
/// itself cannot fail.
pub fn compare_scan_summaries(
    manifest: Option<&ScanSummary>,
    lockfile: Option<&ScanSummary>,
) -> Result<ConsistencyReport, AnalysisError> {
    let manifest = manifest.ok_or(AnalysisError::MissingComparisonArtifact {
        missing: "manifest",
    })?;
    let lockfile = lockfile.ok_or(AnalysisError::MissingComparisonArtifact {
        missing: "lockfile",
    })?;
    Ok(crate::services::consistency::ConsistencyAnalyzer::compare(
        manifest, lockfile,
    ))
}
