//! Integration tests for the npm resolution path, against a mock registry

mod common;

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lockforge::application::events::VecProgress;
use lockforge::application::use_cases::ResolveDependenciesUseCase;
use lockforge::config::{Config, RegistryConfig};
use lockforge::domain::{Ecosystem, ManifestSet};
use lockforge::infrastructure::cache::ResolutionCache;

use common::fixtures::{npm_packument, npm_version_metadata, package_json};
use common::helpers::{ArrivalRecorder, test_config};

fn use_case(config: Config) -> ResolveDependenciesUseCase {
    ResolveDependenciesUseCase::new(config, Arc::new(ResolutionCache::new()))
}

#[tokio::test]
async fn test_exact_version_manifest_resolves_single_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lodash/4.17.15"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(npm_version_metadata("lodash", "4.17.15", &[])),
        )
        .mount(&mock_server)
        .await;

    let files = ManifestSet::from_entries([(
        "package.json",
        package_json(&[("lodash", "4.17.15")]),
    )]);

    let outcome = use_case(test_config(&mock_server.uri()))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let lodash = &outcome.records[0];
    assert_eq!(lodash.name, "lodash");
    assert_eq!(lodash.version, "4.17.15");
    assert!(
        lodash
            .resolved_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    );

    let lock = outcome.synthesized_lock.expect("lock must be synthesized");
    assert_eq!(lock.filename, "package-lock.json");
    assert!(lock.content.contains("\"lockfileVersion\": 2"));
}

#[tokio::test]
async fn test_transitive_expansion_and_progress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/express"))
        .respond_with(ResponseTemplate::new(200).set_body_json(npm_packument(
            "express",
            &[("4.17.1", &[("accepts", "~1.3.7")])],
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accepts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(npm_packument("accepts", &[("1.3.7", &[])])),
        )
        .mount(&mock_server)
        .await;

    let files = ManifestSet::from_entries([(
        "package.json",
        package_json(&[("express", "^4.17.1")]),
    )]);

    let progress = Arc::new(VecProgress::new());
    let outcome = use_case(test_config(&mock_server.uri()))
        .with_progress(progress.clone())
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    let express = outcome.records.iter().find(|r| r.name == "express").unwrap();
    assert_eq!(express.version, "4.17.1");
    let accepts = outcome.records.iter().find(|r| r.name == "accepts").unwrap();
    assert_eq!(accepts.version, "1.3.7");
    // Transitive dependencies are never marked dev
    assert!(!accepts.is_dev);

    let messages = progress.messages().await;
    assert!(messages.iter().any(|m| m.contains("package.json")));
    assert!(messages.iter().any(|m| m.contains("Resolving batch 1")));
    assert!(messages.iter().any(|m| m.contains("Resolving batch 2")));
    assert!(messages.iter().any(|m| m.contains("generated")));
}

#[tokio::test]
async fn test_empty_manifest_produces_no_lock() {
    let files = ManifestSet::from_entries([("package.json", package_json(&[]))]);

    // No registry needed: zero direct dependencies means zero fetches
    let outcome = use_case(test_config("http://127.0.0.1:9"))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert!(outcome.synthesized_lock.is_none());
    assert_eq!(outcome.source_file, "package.json");
}

#[tokio::test]
async fn test_at_most_25_fetches_in_flight_per_batch() {
    let mock_server = MockServer::start().await;

    let recorder = ArrivalRecorder::new(
        ResponseTemplate::new(200)
            .set_body_json(npm_version_metadata("any", "1.0.0", &[]))
            .set_delay(Duration::from_millis(300)),
    );
    Mock::given(method("GET"))
        .respond_with(recorder.clone())
        .mount(&mock_server)
        .await;

    // 30 exact-pinned direct dependencies: one registry request each, no
    // transitives, so the builder issues a single 30-item batch that the
    // client must split into chunks of 25 and 5
    let deps: Vec<(String, String)> = (0..30)
        .map(|i| (format!("pkg-{:02}", i), "1.0.0".to_string()))
        .collect();
    let dep_refs: Vec<(&str, &str)> = deps
        .iter()
        .map(|(name, range)| (name.as_str(), range.as_str()))
        .collect();
    let files = ManifestSet::from_entries([("package.json", package_json(&dep_refs))]);

    let outcome = use_case(test_config(&mock_server.uri()))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 30);

    let arrivals = recorder.arrivals();
    assert_eq!(arrivals.len(), 30);

    // First 25 requests arrive together; the trailing 5 only after the first
    // chunk's 300ms responses have all settled
    let first_chunk_spread = arrivals[24].duration_since(arrivals[0]);
    assert!(
        first_chunk_spread < Duration::from_millis(250),
        "first chunk spread too wide: {:?}",
        first_chunk_spread
    );
    let chunk_gap = arrivals[25].duration_since(arrivals[24]);
    assert!(
        chunk_gap >= Duration::from_millis(150),
        "second chunk started before the first settled: {:?}",
        chunk_gap
    );
}

#[tokio::test]
async fn test_single_timeout_drops_only_that_package() {
    let mock_server = MockServer::start().await;

    for i in 0..4 {
        let name = format!("stable-{}", i);
        Mock::given(method("GET"))
            .and(path(format!("/{}/1.0.0", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(npm_version_metadata(&name, "1.0.0", &[])),
            )
            .mount(&mock_server)
            .await;
    }
    // One package hangs past the client timeout
    Mock::given(method("GET"))
        .and(path("/hanging/1.0.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(npm_version_metadata("hanging", "1.0.0", &[]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = Config {
        registry: RegistryConfig {
            npm_base_url: mock_server.uri(),
            request_timeout_seconds: 1,
            ..Default::default()
        },
        ..Default::default()
    };

    let files = ManifestSet::from_entries([(
        "package.json",
        package_json(&[
            ("stable-0", "1.0.0"),
            ("stable-1", "1.0.0"),
            ("stable-2", "1.0.0"),
            ("stable-3", "1.0.0"),
            ("hanging", "1.0.0"),
        ]),
    )]);

    let outcome = use_case(config)
        .resolve(Ecosystem::Npm, &files)
        .await
        .expect("one timeout must not fail the resolution");

    assert_eq!(outcome.records.len(), 4);
    assert!(!outcome.records.iter().any(|r| r.name == "hanging"));
    assert!(outcome.synthesized_lock.is_some());
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/express"))
        .respond_with(ResponseTemplate::new(200).set_body_json(npm_packument(
            "express",
            &[
                ("4.16.0", &[]),
                ("4.17.1", &[("accepts", "~1.3.7")]),
            ],
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accepts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(npm_packument("accepts", &[("1.3.7", &[])])),
        )
        .mount(&mock_server)
        .await;

    let files = ManifestSet::from_entries([(
        "package.json",
        package_json(&[("express", "^4.17.1")]),
    )]);

    // Fresh cache each run: byte-identical output is required regardless
    let first = use_case(test_config(&mock_server.uri()))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();
    let second = use_case(test_config(&mock_server.uri()))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert_eq!(
        first.synthesized_lock.unwrap().content,
        second.synthesized_lock.unwrap().content
    );
}

#[tokio::test]
async fn test_cache_avoids_repeat_registry_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lodash/4.17.21"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(npm_version_metadata("lodash", "4.17.21", &[])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let files = ManifestSet::from_entries([(
        "package.json",
        package_json(&[("lodash", "4.17.21")]),
    )]);

    let shared = use_case(test_config(&mock_server.uri()));
    let first = shared.resolve(Ecosystem::Npm, &files).await.unwrap();
    let second = shared.resolve(Ecosystem::Npm, &files).await.unwrap();

    assert_eq!(first.records.len(), 1);
    assert_eq!(second.records.len(), 1);
    // The expect(1) above verifies the second run was served from the cache
}

#[tokio::test]
async fn test_provided_lockfile_wins_over_manifest() {
    // When a lock file is provided, no registry work happens at all
    let lock_content = r#"
    {
        "name": "fixture-app",
        "version": "1.0.0",
        "lockfileVersion": 2,
        "packages": {
            "": { "name": "fixture-app", "version": "1.0.0" },
            "node_modules/left-pad": { "version": "1.3.0" }
        }
    }
    "#;
    let files = ManifestSet::from_entries([
        ("package.json", package_json(&[("left-pad", "^1.0.0")])),
        ("package-lock.json", lock_content.to_string()),
    ]);

    let outcome = use_case(test_config("http://127.0.0.1:9"))
        .resolve(Ecosystem::Npm, &files)
        .await
        .unwrap();

    assert_eq!(outcome.source_file, "package-lock.json");
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].name, "left-pad");
    assert!(outcome.synthesized_lock.is_none());
}
