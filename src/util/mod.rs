//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod errors;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::PackagerConfig;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
pub use errors::ConfigError;
pub use shell::Shell;
