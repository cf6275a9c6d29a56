//! Breadth-first npm dependency tree builder
//!
//! Expands a manifest's direct dependencies into a flat resolved map by
//! driving the registry client batch by batch. Resolution state is keyed by
//! bare package name: two requesters of the same name with different ranges
//! collapse to whichever resolves first. This flat model mirrors legacy npm
//! behavior and is intentional; diamond-dependency version isolation is out
//! of scope.
//!
//! Termination is guaranteed because `processed` only grows and the queue
//! only admits names not yet processed. A package whose fetch fails is logged
//! and absent from the result; it never aborts the run.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::events::ProgressSink;
use crate::domain::dependency::{DirectDependency, ResolvedPackage};
use crate::infrastructure::cache::{CacheKey, ResolutionCache};
use crate::infrastructure::registries::npm::{
    NpmPackageInfo, NpmRegistryClient, NpmVersionMetadata,
};
use crate::infrastructure::registries::{FetchOutcome, PackageRequest};
use crate::services::version_resolution::{RangeResolver, range_is_exact};

/// Resolves the transitive dependency graph for one npm manifest.
///
/// Borrows the registry client for the duration of one resolution session;
/// the session owner drops the client (and its connection pool) when the
/// call returns, on success and failure paths alike.
pub struct NpmTreeBuilder<'a> {
    registry: &'a NpmRegistryClient,
    cache: Arc<ResolutionCache>,
    progress: Arc<dyn ProgressSink>,
}

impl<'a> NpmTreeBuilder<'a> {
    pub fn new(
        registry: &'a NpmRegistryClient,
        cache: Arc<ResolutionCache>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            registry,
            cache,
            progress,
        }
    }

    /// Breadth-first expansion seeded from the manifest's direct
    /// dependencies. Returns the flat name-keyed resolved map; an empty map
    /// means lock generation failed and the caller should fall back.
    pub async fn resolve(
        &self,
        direct: &[DirectDependency],
    ) -> BTreeMap<String, ResolvedPackage> {
        let mut resolved: BTreeMap<String, ResolvedPackage> = BTreeMap::new();
        let mut processed: HashSet<String> = HashSet::new();
        let mut queue: Vec<PackageRequest> = direct
            .iter()
            .map(|dep| PackageRequest::new(dep.name.clone(), dep.range.clone(), dep.is_dev))
            .collect();
        let mut batch_index = 0usize;

        while !queue.is_empty() {
            // Names are marked processed as they are scheduled, so the same
            // package is never fetched twice within one run.
            let mut batch = Vec::new();
            for request in queue.drain(..) {
                if processed.insert(request.name.clone()) {
                    batch.push(request);
                }
            }
            if batch.is_empty() {
                break;
            }

            batch_index += 1;
            self.progress
                .report(format!(
                    "Resolving batch {}: {} packages",
                    batch_index,
                    batch.len()
                ))
                .await;

            let mut infos: Vec<(PackageRequest, NpmPackageInfo)> = Vec::with_capacity(batch.len());
            let mut to_fetch = Vec::new();
            for request in batch {
                let key = Self::cache_key(&request);
                match self.cache.get::<NpmPackageInfo>(&key) {
                    Some(info) => {
                        debug!(package = %request.name, "resolved from cache");
                        infos.push((request, info));
                    }
                    None => to_fetch.push(request),
                }
            }

            for (request, outcome) in self.registry.fetch_batch(to_fetch).await {
                match outcome {
                    FetchOutcome::Found(info) => {
                        self.cache.set(Self::cache_key(&request), &info);
                        infos.push((request, info));
                    }
                    FetchOutcome::NotFound => {
                        warn!(package = %request.name, "package not found in registry; omitted");
                    }
                    FetchOutcome::Failed(err) => {
                        warn!(package = %request.name, error = %err, "registry fetch failed; omitted");
                    }
                }
            }

            for (request, info) in infos {
                let Some(entry) = Self::materialize(&request, info) else {
                    warn!(
                        package = %request.name,
                        range = %request.range,
                        "no resolvable version; omitted"
                    );
                    continue;
                };

                for (dep_name, dep_range) in &entry.requires {
                    if !processed.contains(dep_name) {
                        // Transitive dependencies are never marked dev
                        queue.push(PackageRequest::new(dep_name.clone(), dep_range.clone(), false));
                    }
                }
                resolved.insert(request.name, entry);
            }

            self.progress
                .report(format!(
                    "Batch {} complete: {} packages resolved",
                    batch_index,
                    resolved.len()
                ))
                .await;
        }

        resolved
    }

    fn cache_key(request: &PackageRequest) -> CacheKey {
        if range_is_exact(&request.range) {
            CacheKey::new(&request.name, format!("pinned:{}", request.range.trim()))
        } else {
            CacheKey::new(&request.name, "versions")
        }
    }

    /// Pick a concrete version for the request and shape it into a resolved
    /// entry. A pinned fetch already is one version; a full packument goes
    /// through the range resolver against its ascending version list.
    fn materialize(request: &PackageRequest, info: NpmPackageInfo) -> Option<ResolvedPackage> {
        match info {
            NpmPackageInfo::Pinned(metadata) => {
                Some(Self::entry_from_metadata(metadata, request.is_dev))
            }
            NpmPackageInfo::Full(packument) => {
                let available = packument.available_versions();
                let version = RangeResolver::resolve(&request.range, &available)?;
                let metadata = packument.versions.get(&version)?.clone();
                Some(Self::entry_from_metadata(metadata, request.is_dev))
            }
        }
    }

    fn entry_from_metadata(metadata: NpmVersionMetadata, is_dev: bool) -> ResolvedPackage {
        let (tarball_url, integrity) = match metadata.dist {
            Some(dist) => (dist.tarball, dist.integrity),
            None => (None, None),
        };
        ResolvedPackage {
            version: metadata.version,
            tarball_url,
            integrity,
            is_dev,
            requires: metadata.dependencies,
        }
    }
}
