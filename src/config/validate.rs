use super::{types::AppConfig, ConfigError};

/// Reject settings the server cannot start with
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid("server.port cannot be 0".to_string()));
    }
    if config.server.workers == 0 {
        return Err(ConfigError::Invalid("server.workers cannot be 0".to_string()));
    }
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "retry.max_attempts cannot be 0".to_string(),
        ));
    }
    if config.rate_limit.window_ms == 0 {
        return Err(ConfigError::Invalid(
            "rate_limit.window_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_defaults() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut port = AppConfig::default();
        port.server.port = 0;

        let mut workers = AppConfig::default();
        workers.server.workers = 0;

        let mut attempts = AppConfig::default();
        attempts.retry.max_attempts = 0;

        let mut window = AppConfig::default();
        window.rate_limit.window_ms = 0;

        for config in [port, workers, attempts, window] {
            let err = validate_config(&config).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }
    }
}
