//! PyPI JSON API client

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegistryConfig;

use super::{FetchOutcome, RegistryError, get_json};

/// PyPI project document: `/pypi/{name}/json` returns the latest release,
/// `/pypi/{name}/{version}/json` a specific one. The shape is the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PypiProject {
    pub info: PypiInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PypiInfo {
    pub name: String,
    /// Version this document describes; for the unversioned endpoint this is
    /// the latest release
    pub version: String,
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
}

/// HTTP client for the PyPI JSON API, scoped to one resolution session.
pub struct PypiRegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl PypiRegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.pypi_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the project's latest-release document.
    pub async fn fetch_project(&self, name: &str) -> FetchOutcome<PypiProject> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        debug!(package = name, "fetching pypi project");
        get_json(&self.http, &url).await
    }

    /// Fetch the document for one specific release.
    pub async fn fetch_release(&self, name: &str, version: &str) -> FetchOutcome<PypiProject> {
        let url = format!("{}/pypi/{}/{}/json", self.base_url, name, version);
        debug!(package = name, version, "fetching pypi release");
        get_json(&self.http, &url).await
    }
}
