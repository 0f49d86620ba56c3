use super::{types::Config, ConfigError};
use crate::scheduler::MAX_WORKERS;

/// Validate configuration
/// Currently validates:
/// - Worker count within 1..=MAX_WORKERS
/// - At least one fetch attempt
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let workers = config.download.workers;
    if workers == 0 || workers > MAX_WORKERS {
        return Err(ConfigError::ValidationError(format!(
            "download.workers must be between 1 and {}, got {}",
            MAX_WORKERS, workers
        )));
    }

    if config.download.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "download.max_retries cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_worker_bounds() {
        let mut config = Config::default();
        config.download.workers = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));

        config.download.workers = MAX_WORKERS + 1;
        assert!(validate_config(&config).is_err());

        config.download.workers = MAX_WORKERS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_retries_fails() {
        let mut config = Config::default();
        config.download.max_retries = 0;
        assert!(validate_config(&config).is_err());
    }
}
