use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Workflow makes at least one attempt
/// - Uploads accept at least one row
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.workflow.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "workflow.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.upload.max_rows == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_rows must be at least 1".to_string(),
        ));
    }

    Ok(())
}
