//! High-level operations.
//!
//! This module contains the implementation of buildmatrix commands.

pub mod packager;
pub mod resolve;

pub use packager::{plan_builds, run_builds, BuildPlan};
pub use resolve::resolve_coordinate;
