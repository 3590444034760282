//! Build matrix generation and filtering.

pub mod filter;
pub mod generator;

pub use filter::{FilterOutcome, SharedBuildFilter};
pub use generator::{DefaultGenerator, GenerationMode, MatrixAxes, MatrixGenerator};
