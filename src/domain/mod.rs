//! Domain Layer - Core entities and value objects
//!
//! Dependency records, manifest sets, file format tags, and the scan summary
//! types consumed by the consistency analyzer.

pub mod consistency;
pub mod dependency;
pub mod manifest;

pub use consistency::{ConsistencyReport, PackageDiff, ScanSummary, Severity, VulnerabilityRecord};
pub use dependency::{DependencyRecord, DirectDependency, Ecosystem, ResolvedPackage};
pub use manifest::{FileFormat, ManifestSet};
