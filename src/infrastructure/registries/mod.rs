//! Package registry clients
//!
//! HTTP access to the npm registry and the PyPI JSON API. Every fetch is a
//! single attempt with a bounded timeout; the three possible outcomes
//! (found, not found, failed) are all terminal for that fetch and explicit in
//! the result type so callers can tell a missing package from a network
//! failure. One client instance is owned by one resolution session; dropping
//! it tears down the connection pool.

pub mod npm;
pub mod pypi;

use serde::de::DeserializeOwned;

/// Error for a single registry fetch. Non-fatal by design: batch callers log
/// these and omit the affected package.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Network-level failure, including timeouts
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Unexpected HTTP status (404 is reported as `FetchOutcome::NotFound`,
    /// not as an error)
    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body was not the expected JSON shape
    #[error("registry response could not be decoded: {message}")]
    Decode { message: String },
}

/// Outcome of fetching one package's metadata
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Found(T),
    NotFound,
    Failed(RegistryError),
}

impl<T> FetchOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(value) => FetchOutcome::Found(f(value)),
            FetchOutcome::NotFound => FetchOutcome::NotFound,
            FetchOutcome::Failed(err) => FetchOutcome::Failed(err),
        }
    }
}

/// One pending registry lookup scheduled by the tree builder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRequest {
    pub name: String,
    /// Range expression the requester declared, e.g. `^4.17.1`
    pub range: String,
    pub is_dev: bool,
}

impl PackageRequest {
    pub fn new(name: impl Into<String>, range: impl Into<String>, is_dev: bool) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            is_dev,
        }
    }
}

/// GET a JSON document, classifying the response into a fetch outcome.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> FetchOutcome<T> {
    let response = match http.get(url).send().await {
        Ok(response) => response,
        Err(err) => return FetchOutcome::Failed(RegistryError::Transport(err)),
    };

    match response.status().as_u16() {
        200 => match response.json::<T>().await {
            Ok(body) => FetchOutcome::Found(body),
            Err(err) => FetchOutcome::Failed(RegistryError::Decode {
                message: err.to_string(),
            }),
        },
        404 => FetchOutcome::NotFound,
        status => FetchOutcome::Failed(RegistryError::Status {
            status,
            url: url.to_string(),
        }),
    }
}

/// Sort version strings ascending using lenient semver ordering.
///
/// Registries publish the occasional non-semver version (`v` prefixes,
/// four-segment versions); those are compared on a best-effort truncated
/// parse and fall back to lexicographic order among themselves.
pub(crate) fn sort_versions_ascending(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_version_lenient(a), parse_version_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => a.cmp(b),
    });
}

/// Best-effort semver parse: strips a leading `v`, truncates four-segment
/// versions to three.
pub(crate) fn parse_version_lenient(s: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(s) {
        return Some(v);
    }

    let s = s.strip_prefix('v').unwrap_or(s);
    if let Ok(v) = semver::Version::parse(s) {
        return Some(v);
    }

    let (core, pre) = match s.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (s, None),
    };
    let nums: Vec<&str> = core.split('.').collect();
    if nums.len() > 3 {
        let mut base = format!("{}.{}.{}", nums[0], nums[1], nums[2]);
        if let Some(pre) = pre {
            if !pre.is_empty() {
                base = format!("{}-{}", base, pre);
            }
        }
        return semver::Version::parse(&base).ok();
    }
    if nums.len() == 2 {
        return semver::Version::parse(&format!("{}.{}.0", nums[0], nums[1])).ok();
    }
    None
}
