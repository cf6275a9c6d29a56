//! Dependency file parsers
//!
//! One parser per concrete format per ecosystem. Each ecosystem owns a
//! [`ParserFactory`] that applies a priority order over the provided files:
//! lock files encode a complete resolved tree while manifests only declare
//! direct ranges, so the factory always prefers the most complete source.

pub mod detector;
pub mod npm;
pub mod python;

use crate::application::errors::{AnalysisError, ParseError};
use crate::domain::dependency::{DependencyRecord, Ecosystem};
use crate::domain::manifest::{FileFormat, ManifestSet};

pub use detector::FormatDetector;

/// Closed set of concrete parsers, dispatched by format
#[derive(Debug, Clone, Copy)]
pub enum Parser {
    PackageJson(npm::PackageJsonParser),
    PackageLock(npm::PackageLockParser),
    YarnLock(npm::YarnLockParser),
    RequirementsTxt(python::RequirementsTxtParser),
    RequirementsLock(python::RequirementsLockParser),
    Pyproject(python::PyprojectParser),
    Pipfile(python::PipfileParser),
    PipfileLock(python::PipfileLockParser),
    PoetryLock(python::PoetryLockParser),
}

impl Parser {
    /// Parse file content into dependency records.
    pub fn parse(&self, content: &str) -> Result<Vec<DependencyRecord>, ParseError> {
        match self {
            Parser::PackageJson(p) => p.parse(content),
            Parser::PackageLock(p) => p.parse(content),
            Parser::YarnLock(p) => p.parse(content),
            Parser::RequirementsTxt(p) => p.parse(content),
            Parser::RequirementsLock(p) => p.parse(content),
            Parser::Pyproject(p) => p.parse(content),
            Parser::Pipfile(p) => p.parse(content),
            Parser::PipfileLock(p) => p.parse(content),
            Parser::PoetryLock(p) => p.parse(content),
        }
    }

    pub fn format(&self) -> FileFormat {
        match self {
            Parser::PackageJson(_) => FileFormat::PackageJson,
            Parser::PackageLock(_) => FileFormat::PackageLockJson,
            Parser::YarnLock(_) => FileFormat::YarnLock,
            Parser::RequirementsTxt(_) => FileFormat::RequirementsTxt,
            Parser::RequirementsLock(_) => FileFormat::RequirementsLock,
            Parser::Pyproject(_) => FileFormat::PyprojectToml,
            Parser::Pipfile(_) => FileFormat::Pipfile,
            Parser::PipfileLock(_) => FileFormat::PipfileLock,
            Parser::PoetryLock(_) => FileFormat::PoetryLock,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.format().ecosystem()
    }
}

/// Per-ecosystem parser registry with format-priority selection
pub trait ParserFactory: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Formats this ecosystem understands, most complete first
    fn priority_order(&self) -> &'static [FileFormat];

    /// Parser for a given format, if this ecosystem owns one
    fn parser_for(&self, format: FileFormat) -> Option<Parser>;

    /// Detect the file's format and return the matching parser.
    fn get_parser(&self, filename: &str, content: &str) -> Result<Parser, AnalysisError> {
        let format = FormatDetector::detect(filename, content).ok_or_else(|| {
            AnalysisError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;
        self.parser_for(format)
            .ok_or_else(|| AnalysisError::UnsupportedFormat {
                filename: filename.to_string(),
            })
    }

    /// Pick the best available file from the provided set.
    ///
    /// Walks the priority order over canonical filenames first, then falls
    /// back to a permissive scan of any remaining file whose content the
    /// detector can classify for this ecosystem.
    fn detect_best_format(&self, files: &ManifestSet) -> Result<(String, FileFormat), AnalysisError> {
        for format in self.priority_order() {
            let filename = format.canonical_filename();
            if files.contains(filename) {
                return Ok((filename.to_string(), *format));
            }
        }

        for (filename, content) in files.iter() {
            if let Some(format) = FormatDetector::detect(filename, content) {
                if format.ecosystem() == self.ecosystem() && self.parser_for(format).is_some() {
                    return Ok((filename.to_string(), format));
                }
            }
        }

        Err(AnalysisError::NoSupportedFile)
    }
}

/// Parser factory for the npm ecosystem
pub struct NpmParserFactory;

impl ParserFactory for NpmParserFactory {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn priority_order(&self) -> &'static [FileFormat] {
        &[
            FileFormat::PackageLockJson,
            FileFormat::YarnLock,
            FileFormat::PackageJson,
        ]
    }

    fn parser_for(&self, format: FileFormat) -> Option<Parser> {
        match format {
            FileFormat::PackageJson => Some(Parser::PackageJson(npm::PackageJsonParser)),
            FileFormat::PackageLockJson => Some(Parser::PackageLock(npm::PackageLockParser)),
            FileFormat::YarnLock => Some(Parser::YarnLock(npm::YarnLockParser)),
            _ => None,
        }
    }
}

/// Parser factory for the PyPI ecosystem
pub struct PypiParserFactory;

impl ParserFactory for PypiParserFactory {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPI
    }

    fn priority_order(&self) -> &'static [FileFormat] {
        &[
            FileFormat::RequirementsLock,
            FileFormat::PoetryLock,
            FileFormat::PipfileLock,
            FileFormat::RequirementsTxt,
            FileFormat::PyprojectToml,
            FileFormat::Pipfile,
        ]
    }

    fn parser_for(&self, format: FileFormat) -> Option<Parser> {
        match format {
            FileFormat::RequirementsTxt => {
                Some(Parser::RequirementsTxt(python::RequirementsTxtParser))
            }
            FileFormat::RequirementsLock => {
                Some(Parser::RequirementsLock(python::RequirementsLockParser))
            }
            FileFormat::PyprojectToml => Some(Parser::Pyproject(python::PyprojectParser)),
            FileFormat::Pipfile => Some(Parser::Pipfile(python::PipfileParser)),
            FileFormat::PipfileLock => Some(Parser::PipfileLock(python::PipfileLockParser)),
            FileFormat::PoetryLock => Some(Parser::PoetryLock(python::PoetryLockParser)),
            _ => None,
        }
    }
}

/// The factory owning parsers for a given ecosystem
pub fn factory_for(ecosystem: Ecosystem) -> Box<dyn ParserFactory> {
    match ecosystem {
        Ecosystem::Npm => Box::new(NpmParserFactory),
        Ecosystem::PyPI => Box::new(PypiParserFactory),
    }
}
