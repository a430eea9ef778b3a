mod loader;
mod types;
mod validate;

pub use loader::*;
pub use types::*;
pub use validate::*;

use thiserror::Error;

/// Loading either fails to find or parse the file, or rejects its values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("invalid config: {0}")]
    ParseError(String),

    #[error("config rejected: {0}")]
    ValidationError(String),
}
