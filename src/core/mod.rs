//! Core data structures for buildmatrix.
//!
//! - Package coordinates (`name/version@user/channel`)
//! - Typed option keys and values
//! - Build configurations and the matrix that holds them

pub mod configuration;
pub mod coordinate;
pub mod options;
pub mod settings;

pub use configuration::{BuildConfiguration, BuildMatrix};
pub use coordinate::{PackageCoordinate, ReferenceParts};
pub use options::{OptionKey, OptionSet, OptionValue};
pub use settings::Settings;
