//! Test data fixtures

use serde_json::{Value, json};

/// A `package.json` with the given runtime dependencies.
pub fn package_json(deps: &[(&str, &str)]) -> String {
    let mut dependencies = serde_json::Map::new();
    for (name, range) in deps {
        dependencies.insert(name.to_string(), json!(range));
    }
    json!({
        "name": "fixture-app",
        "version": "1.0.0",
        "dependencies": dependencies,
    })
    .to_string()
}

/// npm version metadata document, as returned by `/{name}/{version}`.
pub fn npm_version_metadata(name: &str, version: &str, deps: &[(&str, &str)]) -> Value {
    let mut dependencies = serde_json::Map::new();
    for (dep_name, range) in deps {
        dependencies.insert(dep_name.to_string(), json!(range));
    }
    json!({
        "name": name,
        "version": version,
        "dependencies": dependencies,
        "dist": {
            "tarball": format!("https://registry.npmjs.org/{name}/-/{name}-{version}.tgz"),
            "integrity": format!("sha512-{name}-{version}")
        }
    })
}

/// Full npm packument, as returned by `/{name}`. Each entry is
/// `(version, declared dependencies)`.
pub fn npm_packument(name: &str, versions: &[(&str, &[(&str, &str)])]) -> Value {
    let mut versions_map = serde_json::Map::new();
    let mut latest = "";
    for &(version, deps) in versions {
        versions_map.insert(version.to_string(), npm_version_metadata(name, version, deps));
        latest = version;
    }
    json!({
        "name": name,
        "dist-tags": { "latest": latest },
        "versions": versions_map,
    })
}

/// PyPI project document, as returned by `/pypi/{name}/json` and
/// `/pypi/{name}/{version}/json`.
pub fn pypi_project(name: &str, version: &str, requires_dist: &[&str]) -> Value {
    json!({
        "info": {
            "name": name,
            "version": version,
            "requires_dist": requires_dist,
        }
    })
}
