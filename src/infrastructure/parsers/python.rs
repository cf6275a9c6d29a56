//! Python ecosystem parsers
//!
//! Covers the pip/poetry/pipenv family: `requirements.txt`, the generated
//! `requirements.lock`, `pyproject.toml` (PEP 621 and poetry tables),
//! `Pipfile`, `Pipfile.lock`, and `poetry.lock`. Package names are
//! PEP 503-normalized so `Django` and `django` collapse to one identity.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::application::errors::ParseError;
use crate::domain::dependency::{DependencyRecord, Ecosystem};

/// PEP 503 name normalization: lowercase, runs of `-`, `_`, `.` become `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_dash = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !prev_dash {
                out.push('-');
                prev_dash = true;
            }
        } else {
            out.extend(c.to_lowercase());
            prev_dash = false;
        }
    }
    out
}

/// One requirement as declared by a manifest: a name plus an exact pin when
/// the declaration used `==`, otherwise the raw constraint text (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSpec {
    pub name: String,
    pub exact: Option<String>,
    pub constraint: Option<String>,
}

impl RequirementSpec {
    /// Best-effort concrete version for record output: the exact pin, the
    /// first version named by the constraint, or the unknown placeholder.
    pub fn record_version(&self) -> String {
        if let Some(exact) = &self.exact {
            return exact.clone();
        }
        if let Some(constraint) = &self.constraint {
            let first = constraint.split(',').next().unwrap_or(constraint);
            let cleaned = first
                .trim()
                .trim_start_matches(['>', '<', '=', '!', '~', '^'])
                .trim();
            if !cleaned.is_empty() && cleaned != "*" {
                return cleaned.to_string();
            }
        }
        "0.0.0".to_string()
    }
}

/// Parse one requirement line or PEP 508 specifier.
///
/// Handles extras (`name[extra]`), inline comments, environment markers
/// (everything after `;` is dropped), and parenthesized constraints as they
/// appear in `requires_dist`. Returns `None` for blank lines, comments, and
/// pip options.
pub fn parse_requirement_line(line: &str) -> Option<RequirementSpec> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    let line = line.split(';').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let name_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(line.len());
    if name_end == 0 {
        return None;
    }
    let name = normalize_name(&line[..name_end]);

    // Skip extras, keep what follows
    let mut rest = line[name_end..].trim();
    if rest.starts_with('[') {
        match rest.find(']') {
            Some(close) => rest = rest[close + 1..].trim(),
            None => return None,
        }
    }
    let rest = rest.trim_matches(['(', ')']).trim();

    let exact = rest.find("==").map(|pos| {
        rest[pos + 2..]
            .split([',', ')', ' '])
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    });
    let exact = exact.filter(|v| !v.is_empty());

    let constraint = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };

    Some(RequirementSpec {
        name,
        exact,
        constraint,
    })
}

/// Extract `(name, optional exact pin)` pairs from a `requirements.txt`.
pub fn extract_requirements_txt(content: &str) -> Vec<RequirementSpec> {
    content.lines().filter_map(parse_requirement_line).collect()
}

/// Extract direct requirements from a `pyproject.toml` (PEP 621
/// `project.dependencies` plus `tool.poetry.dependencies`).
pub fn extract_pyproject(content: &str) -> Result<Vec<RequirementSpec>, ParseError> {
    let doc: toml::Value = toml::from_str(content)?;
    let mut specs = Vec::new();

    if let Some(deps) = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        for entry in deps {
            if let Some(text) = entry.as_str() {
                if let Some(spec) = parse_requirement_line(text) {
                    specs.push(spec);
                }
            }
        }
    }

    if let Some(deps) = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        for (name, value) in deps {
            if name.eq_ignore_ascii_case("python") {
                continue;
            }
            specs.push(spec_from_toml_value(name, value));
        }
    }

    Ok(specs)
}

/// Extract direct requirements from a `Pipfile`'s `[packages]` table.
pub fn extract_pipfile(content: &str) -> Result<Vec<RequirementSpec>, ParseError> {
    let doc: toml::Value = toml::from_str(content)?;
    let mut specs = Vec::new();

    if let Some(packages) = doc.get("packages").and_then(|p| p.as_table()) {
        for (name, value) in packages {
            specs.push(spec_from_toml_value(name, value));
        }
    }

    Ok(specs)
}

/// Turn a poetry/pipenv constraint value (`"==1.2.3"`, `"^3.2"`, `"*"`, or a
/// table with a `version` key) into a requirement spec.
fn spec_from_toml_value(name: &str, value: &toml::Value) -> RequirementSpec {
    let constraint_text = match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    };

    let constraint = constraint_text.filter(|c| !c.is_empty() && c != "*");
    let exact = constraint.as_deref().and_then(|c| {
        let trimmed = c.trim();
        if let Some(pinned) = trimmed.strip_prefix("==") {
            return Some(pinned.trim().to_string());
        }
        // A bare version with no operator is an exact declaration
        if trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '+'))
        {
            return Some(trimmed.to_string());
        }
        None
    });

    RequirementSpec {
        name: normalize_name(name),
        exact,
        constraint,
    }
}

/// Parser for `requirements.txt` files
#[derive(Debug, Clone, Copy)]
pub struct RequirementsTxtParser;

impl RequirementsTxtParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        Ok(specs_to_records(extract_requirements_txt(content), false))
    }
}

/// Parser for generated `requirements.lock` files: the same line shape as
/// `requirements.txt`, every entry pinned, `# direct` / `# transitive`
/// markers tolerated as comments.
#[derive(Debug, Clone, Copy)]
pub struct RequirementsLockParser;

impl RequirementsLockParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        Ok(specs_to_records(extract_requirements_txt(content), false))
    }
}

/// Parser for `pyproject.toml` files (PEP 621 and poetry)
#[derive(Debug, Clone, Copy)]
pub struct PyprojectParser;

impl PyprojectParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let doc: toml::Value = toml::from_str(content)?;
        let mut records = specs_to_records(extract_pyproject(content)?, false);

        // Poetry dev dependencies: modern group table plus the legacy section
        let poetry = doc.get("tool").and_then(|t| t.get("poetry"));
        let mut dev_tables = Vec::new();
        if let Some(poetry) = poetry {
            if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
                for group in groups.values() {
                    if let Some(deps) = group.get("dependencies").and_then(|d| d.as_table()) {
                        dev_tables.push(deps);
                    }
                }
            }
            if let Some(deps) = poetry.get("dev-dependencies").and_then(|d| d.as_table()) {
                dev_tables.push(deps);
            }
        }
        for table in dev_tables {
            for (name, value) in table {
                if name.eq_ignore_ascii_case("python") {
                    continue;
                }
                let spec = spec_from_toml_value(name, value);
                push_unique(&mut records, spec, true);
            }
        }

        Ok(records)
    }
}

/// Parser for `Pipfile` files
#[derive(Debug, Clone, Copy)]
pub struct PipfileParser;

impl PipfileParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let doc: toml::Value = toml::from_str(content)?;
        let mut records = Vec::new();

        for (section, is_dev) in [("packages", false), ("dev-packages", true)] {
            if let Some(table) = doc.get(section).and_then(|p| p.as_table()) {
                for (name, value) in table {
                    let spec = spec_from_toml_value(name, value);
                    push_unique(&mut records, spec, is_dev);
                }
            }
        }

        Ok(records)
    }
}

/// Parser for `Pipfile.lock` files (JSON)
#[derive(Debug, Clone, Copy)]
pub struct PipfileLockParser;

impl PipfileLockParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let json: Value = serde_json::from_str(content)?;
        let mut records: BTreeMap<String, DependencyRecord> = BTreeMap::new();

        for (section, is_dev) in [("default", false), ("develop", true)] {
            if let Some(packages) = json.get(section).and_then(|s| s.as_object()) {
                for (name, info) in packages {
                    let Some(version) = info.get("version").and_then(|v| v.as_str()) else {
                        continue;
                    };
                    let version = version.trim_start_matches("==").to_string();
                    let name = normalize_name(name);

                    let mut record =
                        DependencyRecord::new(name.clone(), version, Ecosystem::PyPI)
                            .with_dev(is_dev);
                    if let Some(hash) = info
                        .get("hashes")
                        .and_then(|h| h.as_array())
                        .and_then(|h| h.first())
                        .and_then(|h| h.as_str())
                    {
                        record = record.with_integrity(hash);
                    }
                    records.entry(name).or_insert(record);
                }
            }
        }

        Ok(records.into_values().collect())
    }
}

/// Parser for `poetry.lock` files
#[derive(Debug, Clone, Copy)]
pub struct PoetryLockParser;

impl PoetryLockParser {
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        let doc: toml::Value = toml::from_str(content)?;
        let mut records: BTreeMap<String, DependencyRecord> = BTreeMap::new();

        if let Some(packages) = doc.get("package").and_then(|p| p.as_array()) {
            for entry in packages {
                let Some(name) = entry.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                let Some(version) = entry.get("version").and_then(|v| v.as_str()) else {
                    continue;
                };
                let is_dev = entry
                    .get("category")
                    .and_then(|c| c.as_str())
                    .is_some_and(|c| c == "dev");

                let name = normalize_name(name);
                let mut record = DependencyRecord::new(name.clone(), version, Ecosystem::PyPI)
                    .with_dev(is_dev);

                if let Some(deps) = entry.get("dependencies").and_then(|d| d.as_table()) {
                    let mut requires = BTreeMap::new();
                    for (dep_name, constraint) in deps {
                        let range = match constraint {
                            toml::Value::String(s) => s.clone(),
                            toml::Value::Table(t) => t
                                .get("version")
                                .and_then(|v| v.as_str())
                                .unwrap_or("*")
                                .to_string(),
                            _ => "*".to_string(),
                        };
                        requires.insert(normalize_name(dep_name), range);
                    }
                    record = record.with_requires(requires);
                }

                records.entry(name).or_insert(record);
            }
        }

        Ok(records.into_values().collect())
    }
}

fn specs_to_records(specs: Vec<RequirementSpec>, is_dev: bool) -> Vec<DependencyRecord> {
    let mut records = Vec::with_capacity(specs.len());
    for spec in specs {
        push_unique(&mut records, spec, is_dev);
    }
    records
}

fn push_unique(records: &mut Vec<DependencyRecord>, spec: RequirementSpec, is_dev: bool) {
    if records.iter().any(|r| r.name == spec.name) {
        return;
    }
    let version = spec.record_version();
    records.push(DependencyRecord::new(spec.name, version, Ecosystem::PyPI).with_dev(is_dev));
}
