//! Integration tests for cross-artifact consistency analysis

use std::collections::BTreeMap;

use lockforge::application::errors::AnalysisError;
use lockforge::application::use_cases::compare_scan_summaries;
use lockforge::domain::consistency::{ScanSummary, Severity, VulnerabilityRecord};
use lockforge::services::consistency::ConsistencyAnalyzer;

fn scan(total_dependencies: usize, findings: &[(&str, &str, Severity)]) -> ScanSummary {
    let mut by_package: BTreeMap<String, Vec<VulnerabilityRecord>> = BTreeMap::new();
    for (package, id, severity) in findings {
        by_package
            .entry(package.to_string())
            .or_default()
            .push(VulnerabilityRecord::new(*id, *severity, "fixture"));
    }
    ScanSummary::from_findings(total_dependencies, by_package)
}

#[test]
fn test_reflexivity() {
    let summary = scan(
        25,
        &[
            ("lodash", "CVE-2021-23337", Severity::High),
            ("minimist", "CVE-2021-44906", Severity::Critical),
        ],
    );

    let report = ConsistencyAnalyzer::compare(&summary, &summary.clone());
    assert!(report.is_consistent);
    assert!(report.package_diffs.is_empty());
    assert!(report.severity_diffs.is_empty());
    assert_eq!(report.dependency_count_difference, 0);
}

#[test]
fn test_identical_vulns_with_more_lockfile_dependencies_is_consistent() {
    // Manifest-only scan sees fewer dependencies; vulnerability sets match
    let manifest_scan = scan(5, &[("lodash", "CVE-2021-23337", Severity::High)]);
    let lockfile_scan = scan(38, &[("lodash", "CVE-2021-23337", Severity::High)]);

    let report = ConsistencyAnalyzer::compare(&manifest_scan, &lockfile_scan);
    assert!(report.is_consistent);
    assert_eq!(report.dependency_count_difference, 33);
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.contains("transitive"))
    );
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.contains("consistent"))
    );
}

#[test]
fn test_divergent_vulnerability_sets() {
    let manifest_scan = scan(
        10,
        &[
            ("lodash", "CVE-2021-23337", Severity::High),
            ("old-only", "CVE-2019-0001", Severity::Low),
        ],
    );
    let lockfile_scan = scan(
        10,
        &[
            ("lodash", "CVE-2021-23337", Severity::High),
            ("minimist", "CVE-2021-44906", Severity::Critical),
        ],
    );

    let report = ConsistencyAnalyzer::compare(&manifest_scan, &lockfile_scan);
    assert!(!report.is_consistent);
    assert_eq!(report.package_diffs.only_in_first, vec!["old-only"]);
    assert_eq!(report.package_diffs.only_in_second, vec!["minimist"]);
    assert_eq!(report.severity_diffs.get(&Severity::Low), Some(&(1, 0)));
    assert_eq!(report.severity_diffs.get(&Severity::Critical), Some(&(0, 1)));
    assert!(!report.warnings.is_empty());
    assert!(
        !report
            .recommendations
            .iter()
            .any(|r| r.contains("can be trusted"))
    );
}

#[test]
fn test_comparison_precondition() {
    let summary = scan(1, &[]);

    assert!(matches!(
        compare_scan_summaries(None, Some(&summary)),
        Err(AnalysisError::MissingComparisonArtifact { missing: "manifest" })
    ));
    assert!(matches!(
        compare_scan_summaries(Some(&summary), None),
        Err(AnalysisError::MissingComparisonArtifact { missing: "lockfile" })
    ));

    let report = compare_scan_summaries(Some(&summary), Some(&summary)).unwrap();
    assert!(report.is_consistent);
}

#[test]
fn test_recommendations_are_deterministic() {
    let first = scan(5, &[("lodash", "CVE-2021-23337", Severity::High)]);
    let second = scan(38, &[("lodash", "CVE-2021-23337", Severity::High)]);

    let a = ConsistencyAnalyzer::compare(&first, &second);
    let b = ConsistencyAnalyzer::compare(&first, &second);
    assert_eq!(a.recommendations, b.recommendations);
    assert_eq!(a.warnings, b.warnings);
}
