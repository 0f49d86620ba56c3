mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str, save_config, ENV_PREFIX};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to save configuration to {path}: {reason}")]
    SaveError { path: String, reason: String },
}
