//! Ecosystem-independent file format detection

use crate::domain::manifest::FileFormat;

/// Detects the concrete format of a dependency file from its name and, when
/// the name is unfamiliar, its content.
pub struct FormatDetector;

impl FormatDetector {
    /// Classify a file. Returns `None` when neither the filename nor the
    /// content matches any supported format.
    pub fn detect(filename: &str, content: &str) -> Option<FileFormat> {
        let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

        match basename {
            "package.json" => Some(FileFormat::PackageJson),
            "package-lock.json" | "npm-shrinkwrap.json" => Some(FileFormat::PackageLockJson),
            "yarn.lock" => Some(FileFormat::YarnLock),
            "requirements.txt" => Some(FileFormat::RequirementsTxt),
            "requirements.lock" => Some(FileFormat::RequirementsLock),
            "pyproject.toml" => Some(FileFormat::PyprojectToml),
            "Pipfile" => Some(FileFormat::Pipfile),
            "Pipfile.lock" => Some(FileFormat::PipfileLock),
            "poetry.lock" => Some(FileFormat::PoetryLock),
            _ => Self::sniff(content),
        }
    }

    /// Permissive content-based classification for unrecognized filenames.
    fn sniff(content: &str) -> Option<FileFormat> {
        let trimmed = content.trim_start();

        if trimmed.starts_with('{') {
            if content.contains("\"lockfileVersion\"") {
                return Some(FileFormat::PackageLockJson);
            }
            if content.contains("\"pipfile-spec\"") {
                return Some(FileFormat::PipfileLock);
            }
            if content.contains("\"dependencies\"") || content.contains("\"devDependencies\"") {
                return Some(FileFormat::PackageJson);
            }
            return None;
        }

        if trimmed.starts_with("# yarn lockfile") || content.contains("# yarn lockfile v1") {
            return Some(FileFormat::YarnLock);
        }

        // TOML-shaped candidates
        if content.contains("[[package]]") {
            return Some(FileFormat::PoetryLock);
        }
        if content.contains("[packages]") || content.contains("[dev-packages]") {
            return Some(FileFormat::Pipfile);
        }
        if content.contains("[project]") || content.contains("[tool.poetry") {
            return Some(FileFormat::PyprojectToml);
        }

        // Requirement-line shaped content. At least one line must carry a
        // version operator, otherwise prose would classify as requirements.
        let mut saw_operator = false;
        let mut saw_lock_marker = false;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                continue;
            }
            if !Self::looks_like_requirement(line) {
                return None;
            }
            if line.contains("==") || line.contains(">=") || line.contains("<=") {
                saw_operator = true;
            }
            if line.contains("# direct") || line.contains("# transitive") {
                saw_lock_marker = true;
            }
        }
        if saw_operator {
            if saw_lock_marker {
                return Some(FileFormat::RequirementsLock);
            }
            return Some(FileFormat::RequirementsTxt);
        }

        None
    }

    fn looks_like_requirement(line: &str) -> bool {
        let mut chars = line.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return false,
        }
        line.contains("==")
            || line.contains(">=")
            || line.contains("<=")
            || line.contains('~')
            || line
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '[' | ']'))
    }
}
