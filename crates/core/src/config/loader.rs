use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `MEDIAFETCH_DOWNLOAD__WORKERS=4`.
pub const ENV_PREFIX: &str = "MEDIAFETCH_";

/// Load configuration from file with environment variable overrides.
///
/// A missing file is not an error: defaults apply, then the environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Write configuration back as TOML.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let save_error = |reason: String| ConfigError::SaveError {
        path: path.display().to_string(),
        reason,
    };

    let contents = toml::to_string_pretty(config).map_err(|e| save_error(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| save_error(e.to_string()))?;
    }
    std::fs::write(path, contents).map_err(|e| save_error(e.to_string()))
}
