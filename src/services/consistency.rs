//! Cross-artifact consistency analysis
//!
//! Compares two already-materialized scan summaries (typically manifest-only
//! vs. lockfile for the same project) and explains discrepancies. Pure
//! computation, no I/O.

use std::collections::BTreeMap;

use crate::domain::consistency::{ConsistencyReport, PackageDiff, ScanSummary, Severity};

pub struct ConsistencyAnalyzer;

impl ConsistencyAnalyzer {
    /// Compare two summaries. The first is conventionally the manifest-only
    /// scan, the second the lockfile scan.
    ///
    /// The verdict considers vulnerability totals, vulnerable-package counts,
    /// and per-package diffs. Severity deltas and the dependency-count
    /// difference are surfaced but exempt: a lockfile scan covering more
    /// dependencies than its manifest is expected, not an inconsistency.
    pub fn compare(first: &ScanSummary, second: &ScanSummary) -> ConsistencyReport {
        let totals_match = first.total_vulnerabilities == second.total_vulnerabilities;
        let package_counts_match =
            first.vulnerable_package_count == second.vulnerable_package_count;

        let mut package_diffs = PackageDiff::default();
        for name in first.vulnerabilities_by_package.keys() {
            if !second.vulnerabilities_by_package.contains_key(name) {
                package_diffs.only_in_first.push(name.clone());
            }
        }
        for name in second.vulnerabilities_by_package.keys() {
            if !first.vulnerabilities_by_package.contains_key(name) {
                package_diffs.only_in_second.push(name.clone());
            }
        }
        for (name, first_findings) in &first.vulnerabilities_by_package {
            if let Some(second_findings) = second.vulnerabilities_by_package.get(name) {
                if first_findings.len() != second_findings.len() {
                    package_diffs
                        .count_mismatches
                        .insert(name.clone(), (first_findings.len(), second_findings.len()));
                }
            }
        }

        let mut severity_diffs: BTreeMap<Severity, (usize, usize)> = BTreeMap::new();
        for severity in Severity::all() {
            let a = first.severity_counts.get(severity).copied().unwrap_or(0);
            let b = second.severity_counts.get(severity).copied().unwrap_or(0);
            if a != b {
                severity_diffs.insert(*severity, (a, b));
            }
        }

        let dependency_count_difference =
            second.total_dependencies as i64 - first.total_dependencies as i64;

        let is_consistent = totals_match
            && package_counts_match
            && package_diffs.is_empty();

        let (recommendations, warnings) = Self::generate_recommendations(
            first,
            second,
            &package_diffs,
            &severity_diffs,
            dependency_count_difference,
            is_consistent,
        );

        ConsistencyReport {
            is_consistent,
            package_diffs,
            severity_diffs,
            dependency_count_difference,
            recommendations,
            warnings,
        }
    }

    /// Deterministically map each detected condition to a human-readable
    /// string. The positive confirmation is appended iff the scans are
    /// consistent.
    fn generate_recommendations(
        first: &ScanSummary,
        second: &ScanSummary,
        package_diffs: &PackageDiff,
        severity_diffs: &BTreeMap<Severity, (usize, usize)>,
        dependency_count_difference: i64,
        is_consistent: bool,
    ) -> (Vec<String>, Vec<String>) {
        let mut recommendations = Vec::new();
        let mut warnings = Vec::new();

        if first.total_vulnerabilities != second.total_vulnerabilities {
            warnings.push(format!(
                "Total vulnerability counts differ: {} in the manifest scan vs {} in the lockfile scan.",
                first.total_vulnerabilities, second.total_vulnerabilities
            ));
        }

        if !package_diffs.only_in_first.is_empty() {
            warnings.push(format!(
                "Vulnerable packages reported only by the manifest scan: {}. The lockfile may pin different versions.",
                package_diffs.only_in_first.join(", ")
            ));
        }
        if !package_diffs.only_in_second.is_empty() {
            recommendations.push(format!(
                "The lockfile scan found vulnerable packages the manifest scan missed: {}. Prefer lockfile-based scanning for complete coverage.",
                package_diffs.only_in_second.join(", ")
            ));
        }
        for (name, (a, b)) in &package_diffs.count_mismatches {
            warnings.push(format!(
                "Package {} has {} finding(s) in the manifest scan but {} in the lockfile scan.",
                name, a, b
            ));
        }

        if !severity_diffs.is_empty() {
            let detail: Vec<String> = severity_diffs
                .iter()
                .map(|(severity, (a, b))| format!("{}: {} vs {}", severity, a, b))
                .collect();
            recommendations.push(format!(
                "Severity distribution differs between scans ({}). Review version pins for the affected packages.",
                detail.join(", ")
            ));
        }

        if dependency_count_difference > 0 {
            recommendations.push(format!(
                "The lockfile scan covers {} more dependencies than the manifest scan. This is expected: lock files include transitive dependencies.",
                dependency_count_difference
            ));
        } else if dependency_count_difference < 0 {
            warnings.push(format!(
                "The manifest scan reports {} more dependencies than the lockfile scan. The lockfile may be stale.",
                -dependency_count_difference
            ));
        }

        if is_consistent {
            recommendations.push(
                "Manifest and lockfile scans are consistent. Vulnerability results can be trusted for this project.".to_string(),
            );
        }

        (recommendations, warnings)
    }
}
