//! Application error taxonomy
//!
//! Format and parse failures are fatal to the resolution call and surface to
//! the caller. Per-package registry failures are not represented here: they
//! never propagate past a batch boundary (see the registries module), the
//! affected package is simply omitted from the resolved set.

use thiserror::Error;

/// Malformed manifest or lock content
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid version string: {version}")]
    Version { version: String },

    #[error("malformed content: {message}")]
    Malformed { message: String },
}

/// Errors surfaced to callers of the resolution engine
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No parser matches the given file
    #[error("unsupported dependency file format: {filename}")]
    UnsupportedFormat { filename: String },

    /// None of the provided files matches any supported format
    #[error("no supported dependency file found")]
    NoSupportedFile,

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Consistency comparison requested without both scan summaries present
    #[error("consistency comparison requires both scans; missing the {missing} summary")]
    MissingComparisonArtifact { missing: &'static str },
}
