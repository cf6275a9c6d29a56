//! npm registry client

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::services::version_resolution::range_is_exact;

use super::{FetchOutcome, PackageRequest, RegistryError, get_json, sort_versions_ascending};

/// Full registry document for one package: every published version plus
/// dist-tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmPackument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub versions: BTreeMap<String, NpmVersionMetadata>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
}

impl NpmPackument {
    /// Published versions in ascending order.
    pub fn available_versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.versions.keys().cloned().collect();
        sort_versions_ascending(&mut versions);
        versions
    }
}

/// Registry metadata for a single published version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmVersionMetadata {
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dist: Option<NpmDist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmDist {
    #[serde(default)]
    pub tarball: Option<String>,
    #[serde(default)]
    pub integrity: Option<String>,
}

/// Registry response for one batched request: the full packument when a range
/// must be resolved, or just the pinned version's metadata when the requester
/// declared an exact version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NpmPackageInfo {
    Full(NpmPackument),
    Pinned(NpmVersionMetadata),
}

/// HTTP client for the npm registry, scoped to one resolution session.
///
/// Connection pooling and keep-alive live inside the wrapped
/// [`reqwest::Client`]; dropping this value at the end of the session tears
/// the pool down on success and failure paths alike.
pub struct NpmRegistryClient {
    http: reqwest::Client,
    base_url: String,
    batch_size: usize,
}

impl NpmRegistryClient {
    pub fn new(config: &RegistryConfig, batch_size: usize) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.npm_base_url.trim_end_matches('/').to_string(),
            batch_size,
        })
    }

    /// Fetch the full packument for a package.
    pub async fn fetch_packument(&self, name: &str) -> FetchOutcome<NpmPackument> {
        let url = format!("{}/{}", self.base_url, name);
        debug!(package = name, "fetching npm packument");
        get_json(&self.http, &url).await
    }

    /// Fetch one pinned version's metadata.
    pub async fn fetch_version(&self, name: &str, version: &str) -> FetchOutcome<NpmVersionMetadata> {
        let url = format!("{}/{}/{}", self.base_url, name, version);
        debug!(package = name, version, "fetching pinned npm version");
        get_json(&self.http, &url).await
    }

    /// Fetch a set of packages, at most `batch_size` requests in flight at a
    /// time. Requests within one chunk run concurrently; chunks are strictly
    /// sequential. Every request gets an explicit outcome; a failed fetch
    /// never affects its siblings.
    pub async fn fetch_batch(
        &self,
        requests: Vec<PackageRequest>,
    ) -> Vec<(PackageRequest, FetchOutcome<NpmPackageInfo>)> {
        let mut results = Vec::with_capacity(requests.len());

        for chunk in requests.chunks(self.batch_size) {
            let fetches = chunk.iter().map(|request| async {
                let outcome = if range_is_exact(&request.range) {
                    self.fetch_version(&request.name, request.range.trim())
                        .await
                        .map(NpmPackageInfo::Pinned)
                } else {
                    self.fetch_packument(&request.name)
                        .await
                        .map(NpmPackageInfo::Full)
                };
                (request.clone(), outcome)
            });

            results.extend(futures::future::join_all(fetches).await);
        }

        results
    }
}
