//! Lockforge: dependency resolution and lock-synthesis engine
//!
//! This crate turns whatever manifest or lock artifacts a project happens to
//! provide into a complete, deterministic dependency set suitable for
//! vulnerability matching. When only a manifest is available, the engine
//! resolves the transitive graph against the public registry and synthesizes
//! a canonical lock artifact; when independently produced scans disagree, the
//! consistency analyzer explains how and why.
//!
//! # Supported Ecosystems
//!
//! | Ecosystem | Files |
//! |-----------|-------|
//! | npm | `package.json`, `package-lock.json` (v1–v3), `yarn.lock` |
//! | PyPI | `requirements.txt`, `requirements.lock`, `pyproject.toml`, `Pipfile`, `Pipfile.lock`, `poetry.lock` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use lockforge::application::use_cases::ResolveDependenciesUseCase;
//! use lockforge::config::Config;
//! use lockforge::domain::{Ecosystem, ManifestSet};
//! use lockforge::infrastructure::cache::ResolutionCache;
//! use std::sync::Arc;
//!
//! let cache = Arc::new(ResolutionCache::new());
//! let use_case = ResolveDependenciesUseCase::new(Config::default(), cache);
//! let files = ManifestSet::from_entries([("package.json".to_string(), content)]);
//! let outcome = use_case.resolve(Ecosystem::Npm, &files).await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! lockforge/
//! ├── domain/          # DependencyRecord, ManifestSet, scan summaries
//! ├── application/     # Errors, progress events, resolution use case
//! ├── infrastructure/  # Parsers, registry clients, resolution cache
//! └── services/        # Range resolution, tree building, lock synthesis,
//!                      # consistency analysis
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod services;

pub use application::errors::{AnalysisError, ParseError};
pub use application::use_cases::{ResolutionOutcome, ResolveDependenciesUseCase};
pub use domain::dependency::{DependencyRecord, Ecosystem};
pub use domain::manifest::{FileFormat, ManifestSet};
pub use infrastructure::cache::ResolutionCache;
