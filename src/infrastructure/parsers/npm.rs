//! Node.js ecosystem parsers

use std::collections::BTreeMap;

use serde_json::Value;

use crate::application::errors::ParseError;
use crate::domain::dependency::{DependencyRecord, DirectDependency, Ecosystem};

/// Check if a version specifier points outside the registry (git, tarball,
/// path, workspace refs). Such dependencies cannot be resolved or scanned.
fn is_non_registry_specifier(version_str: &str) -> bool {
    let v = version_str.trim();
    v.starts_with("git+")
        || v.starts_with("git://")
        || v.starts_with("file:")
        || v.starts_with("link:")
        || v.starts_with("workspace:")
        || v.starts_with("npm:")
        || v.starts_with("github:")
        || v.starts_with("gitlab:")
        || v.starts_with("bitbucket:")
        || v.contains("://")
        || (v.contains('/') && v.contains('#'))
        || v == "."
        || v == ".."
        || v.starts_with("./")
        || v.starts_with("../")
}

/// Reduce an npm range expression to a bare version string for record output.
/// `*` and `latest` collapse to `0.0.0` as an unknown-version placeholder.
fn clean_range(range: &str) -> Result<String, ParseError> {
    let range = range.trim();
    if range.is_empty() {
        return Err(ParseError::Version {
            version: range.to_string(),
        });
    }
    if range == "*" || range == "latest" {
        return Ok("0.0.0".to_string());
    }

    let cleaned = range.trim_start_matches(['^', '~', '>', '<', '=', '!']);
    let cleaned = cleaned.split(' ').next().unwrap_or(cleaned);
    let cleaned = cleaned.split("||").next().unwrap_or(cleaned).trim();

    if cleaned.is_empty() {
        return Err(ParseError::Version {
            version: range.to_string(),
        });
    }
    Ok(cleaned.to_string())
}

/// Direct dependencies declared by a `package.json`
#[derive(Debug, Clone)]
pub struct NpmManifest {
    pub name: String,
    pub version: String,
    pub direct: Vec<DirectDependency>,
}

/// Parse a `package.json` into project metadata plus declared direct ranges.
/// Non-registry specifiers (git, file, workspace, URLs) are skipped.
pub fn parse_manifest(content: &str) -> Result<NpmManifest, ParseError> {
    let json: Value = serde_json::from_str(content)?;

    let name = json
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("root")
        .to_string();
    let version = json
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("0.0.0")
        .to_string();

    let mut direct = Vec::new();
    for (section, is_dev) in [("dependencies", false), ("devDependencies", true)] {
        if let Some(deps) = json.get(section).and_then(|d| d.as_object()) {
            for (dep_name, range_value) in deps {
                let range = range_value
                    .as_str()
                    .ok_or_else(|| ParseError::MissingField {
                        field: format!("version range for package {}", dep_name),
                    })?;
                if is_non_registry_specifier(range) {
                    continue;
                }
                direct.push(DirectDependency::new(dep_name.clone(), range, is_dev));
            }
        }
    }

    Ok(NpmManifest {
        name,
        version,
        direct,
    })
}

/// Parser for `package.json` files
#[derive(Debug, Clone, Copy)]
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let manifest = parse_manifest(content)?;

        let mut records = Vec::with_capacity(manifest.direct.len());
        let mut seen = std::collections::HashSet::new();
        for dep in manifest.direct {
            if !seen.insert(dep.name.clone()) {
                continue;
            }
            let version = clean_range(&dep.range)?;
            records.push(
                DependencyRecord::new(dep.name, version, Ecosystem::Npm).with_dev(dep.is_dev),
            );
        }
        Ok(records)
    }
}

/// Parser for `package-lock.json` files (lockfileVersion 1 through 3)
#[derive(Debug, Clone, Copy)]
pub struct PackageLockParser;

impl PackageLockParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let json: Value = serde_json::from_str(content)?;
        let mut records: BTreeMap<String, DependencyRecord> = BTreeMap::new();

        // lockfileVersion 2/3 carries a flat "packages" map; v1 nests under
        // "dependencies". Prefer the flat section when both are present.
        if let Some(packages) = json.get("packages").and_then(|p| p.as_object()) {
            for (key, info) in packages {
                if key.is_empty() {
                    // Root project entry, not a dependency
                    continue;
                }
                let name = match key.rsplit_once("node_modules/") {
                    Some((_, stripped)) => stripped.to_string(),
                    None => key.clone(),
                };
                if let Some(record) = Self::record_from_entry(&name, info) {
                    records.entry(name).or_insert(record);
                }
            }
        } else if let Some(deps) = json.get("dependencies") {
            Self::collect_v1(deps, &mut records);
        }

        Ok(records.into_values().collect())
    }

    /// Walk a lockfileVersion 1 "dependencies" tree, including nested copies.
    fn collect_v1(deps: &Value, records: &mut BTreeMap<String, DependencyRecord>) {
        let Some(deps_obj) = deps.as_object() else {
            return;
        };
        for (name, info) in deps_obj {
            if let Some(record) = Self::record_from_entry(name, info) {
                records.entry(name.clone()).or_insert(record);
            }
            if let Some(nested) = info.get("dependencies") {
                // v1 nests physical copies as objects; logical requires are
                // string-valued and handled in record_from_entry
                if nested
                    .as_object()
                    .is_some_and(|o| o.values().any(Value::is_object))
                {
                    Self::collect_v1(nested, records);
                }
            }
        }
    }

    fn record_from_entry(name: &str, info: &Value) -> Option<DependencyRecord> {
        let version = info.get("version").and_then(|v| v.as_str())?;
        if is_non_registry_specifier(version) {
            return None;
        }

        let mut record = DependencyRecord::new(name, version, Ecosystem::Npm)
            .with_dev(info.get("dev").and_then(|d| d.as_bool()).unwrap_or(false));

        if let Some(resolved) = info.get("resolved").and_then(|r| r.as_str()) {
            record = record.with_resolved_url(resolved);
        }
        if let Some(integrity) = info.get("integrity").and_then(|i| i.as_str()) {
            record = record.with_integrity(integrity);
        }

        // Logical dependency edges: "requires" in v1, string-valued
        // "dependencies" in v2/3 package entries
        let mut requires = BTreeMap::new();
        for edge_key in ["requires", "dependencies"] {
            if let Some(edges) = info.get(edge_key).and_then(|r| r.as_object()) {
                for (dep_name, range) in edges {
                    if let Some(range) = range.as_str() {
                        requires.insert(dep_name.clone(), range.to_string());
                    }
                }
            }
        }
        if !requires.is_empty() {
            record = record.with_requires(requires);
        }

        Some(record)
    }
}

/// Parser for `yarn.lock` files (v1 text format)
#[derive(Debug, Clone, Copy)]
pub struct YarnLockParser;

impl YarnLockParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let mut records: BTreeMap<String, DependencyRecord> = BTreeMap::new();

        let mut entry_names: Vec<String> = Vec::new();
        let mut version: Option<String> = None;
        let mut resolved: Option<String> = None;
        let mut integrity: Option<String> = None;
        let mut requires: BTreeMap<String, String> = BTreeMap::new();
        let mut in_dependencies = false;

        let mut flush = |names: &[String],
                         version: &Option<String>,
                         resolved: &Option<String>,
                         integrity: &Option<String>,
                         requires: &BTreeMap<String, String>| {
            let Some(version) = version else {
                return;
            };
            for name in names {
                let pkg_name = Self::strip_range_suffix(name);
                let mut record = DependencyRecord::new(pkg_name, version.clone(), Ecosystem::Npm);
                if let Some(url) = resolved {
                    record = record.with_resolved_url(url.clone());
                }
                if let Some(hash) = integrity {
                    record = record.with_integrity(hash.clone());
                }
                if !requires.is_empty() {
                    record = record.with_requires(requires.clone());
                }
                records.entry(pkg_name.to_string()).or_insert(record);
            }
        };

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let indent = line.len() - line.trim_start().len();
            if indent == 0 {
                flush(&entry_names, &version, &resolved, &integrity, &requires);

                entry_names.clear();
                version = None;
                resolved = None;
                integrity = None;
                requires.clear();
                in_dependencies = false;

                for part in trimmed.trim_end_matches(':').split(',') {
                    entry_names.push(part.trim().trim_matches('"').to_string());
                }
            } else if indent == 2 {
                if let Some(rest) = trimmed.strip_prefix("version ") {
                    version = Some(rest.trim().trim_matches('"').to_string());
                    in_dependencies = false;
                } else if let Some(rest) = trimmed.strip_prefix("resolved ") {
                    resolved = Some(rest.trim().trim_matches('"').to_string());
                    in_dependencies = false;
                } else if let Some(rest) = trimmed.strip_prefix("integrity ") {
                    integrity = Some(rest.trim().trim_matches('"').to_string());
                    in_dependencies = false;
                } else if trimmed == "dependencies:" {
                    in_dependencies = true;
                } else {
                    in_dependencies = false;
                }
            } else if indent >= 4 && in_dependencies {
                if let Some(space_pos) = trimmed.find(' ') {
                    let dep_name = trimmed[..space_pos].trim_matches('"');
                    let range = trimmed[space_pos..].trim().trim_matches('"');
                    requires.insert(dep_name.to_string(), range.to_string());
                }
            }
        }
        flush(&entry_names, &version, &resolved, &integrity, &requires);

        Ok(records.into_values().collect())
    }

    /// `lodash@^4.17.0` -> `lodash`; `@babel/core@^7.0.0` -> `@babel/core`
    fn strip_range_suffix(entry: &str) -> &str {
        match entry.rfind('@') {
            Some(pos) if pos > 0 => &entry[..pos],
            _ => entry,
        }
    }
}
