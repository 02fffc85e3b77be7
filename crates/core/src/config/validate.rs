use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pool bounds (at least one connection, pre-fill within the bound)
/// - Pagination bounds (page size positive and within the maximum)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pool.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "pool.max_connections cannot be 0".to_string(),
        ));
    }
    if config.pool.initial_connections > config.pool.max_connections {
        return Err(ConfigError::ValidationError(
            "pool.initial_connections cannot exceed pool.max_connections".to_string(),
        ));
    }

    if config.pagination.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "pagination.page_size cannot be 0".to_string(),
        ));
    }
    if config.pagination.page_size > config.pagination.max_page_size {
        return Err(ConfigError::ValidationError(
            "pagination.page_size cannot exceed pagination.max_page_size".to_string(),
        ));
    }

    Ok(())
}
