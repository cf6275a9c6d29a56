//! Scan summary and consistency report types
//!
//! A [`ScanSummary`] aggregates one scan's vulnerability findings; the
//! consistency analyzer compares two of them and emits a
//! [`ConsistencyReport`]. Summaries are derived, read-only, and recomputed
//! per comparison; they are never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Vulnerability severity buckets, ordered least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// A single vulnerability finding attached to a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// Advisory identifier, e.g. `GHSA-xxxx` or `CVE-2024-12345`
    pub id: String,
    pub severity: Severity,
    pub summary: String,
}

impl VulnerabilityRecord {
    pub fn new(id: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            summary: summary.into(),
        }
    }
}

/// Per-scan aggregate of one artifact's vulnerability findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_vulnerabilities: usize,
    pub total_dependencies: usize,
    pub vulnerable_package_count: usize,
    /// Package name -> findings for that package
    pub vulnerabilities_by_package: BTreeMap<String, Vec<VulnerabilityRecord>>,
    pub severity_counts: BTreeMap<Severity, usize>,
}

impl ScanSummary {
    /// Build a summary from the raw per-package findings of one scan.
    pub fn from_findings(
        total_dependencies: usize,
        vulnerabilities_by_package: BTreeMap<String, Vec<VulnerabilityRecord>>,
    ) -> Self {
        let total_vulnerabilities = vulnerabilities_by_package.values().map(Vec::len).sum();
        let vulnerable_package_count = vulnerabilities_by_package
            .values()
            .filter(|findings| !findings.is_empty())
            .count();

        let mut severity_counts = BTreeMap::new();
        for finding in vulnerabilities_by_package.values().flatten() {
            *severity_counts.entry(finding.severity).or_insert(0) += 1;
        }

        Self {
            total_vulnerabilities,
            total_dependencies,
            vulnerable_package_count,
            vulnerabilities_by_package,
            severity_counts,
        }
    }
}

/// Differences between the vulnerable-package maps of two scans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDiff {
    /// Packages reported vulnerable only by the first scan
    pub only_in_first: Vec<String>,
    /// Packages reported vulnerable only by the second scan
    pub only_in_second: Vec<String>,
    /// Packages in both scans whose finding counts differ: name -> (first, second)
    pub count_mismatches: BTreeMap<String, (usize, usize)>,
}

impl PackageDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_first.is_empty()
            && self.only_in_second.is_empty()
            && self.count_mismatches.is_empty()
    }
}

/// Result of comparing two scan summaries. Built once per comparison; immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub is_consistent: bool,
    pub package_diffs: PackageDiff,
    /// Severity buckets whose counts differ: severity -> (first, second)
    pub severity_diffs: BTreeMap<Severity, (usize, usize)>,
    /// Second scan's dependency total minus the first's. Positive when the
    /// lockfile-derived scan covers more dependencies, which is expected and
    /// does not affect the verdict.
    pub dependency_count_difference: i64,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}
