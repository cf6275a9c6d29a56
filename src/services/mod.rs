//! Services Layer - resolution algorithms and lock synthesis

pub mod consistency;
pub mod npm_lock;
pub mod npm_tree;
pub mod python_lock;
pub mod version_resolution;

pub use consistency::ConsistencyAnalyzer;
pub use npm_lock::NpmLockSynthesizer;
pub use npm_tree::NpmTreeBuilder;
pub use python_lock::PythonLockGenerator;
pub use version_resolution::RangeResolver;
