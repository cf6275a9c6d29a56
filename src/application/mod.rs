//! Application Layer - errors, progress events, and resolution use cases

pub mod errors;
pub mod events;
pub mod use_cases;

pub use errors::{AnalysisError, ParseError};
pub use events::{NoopProgress, ProgressSink, VecProgress};
pub use use_cases::{ResolutionOutcome, ResolveDependenciesUseCase, compare_scan_summaries};
