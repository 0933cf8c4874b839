use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("search endpoint '{0}' must be an http/https url")]
    InvalidEndpoint(String),

    #[error("search.max_results must be positive")]
    InvalidMaxResults,

    #[error("server.max_count must be positive")]
    InvalidMaxCount,

    #[error("server.default_count ({default}) must be between 1 and {max}")]
    InvalidDefaultCount { default: usize, max: usize },

    #[error("timeout must be positive: {field}")]
    InvalidTimeout { field: &'static str },

    #[error("fetch.max_image_bytes must be positive")]
    InvalidMaxImageBytes,

    #[error("server.max_payload_bytes must be positive")]
    InvalidMaxPayloadBytes,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_search(config)?;
    validate_server(config)?;
    validate_fetch(config)?;
    Ok(())
}

fn validate_search(config: &Config) -> Result<(), ValidationError> {
    let endpoint = &config.search.endpoint;
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ValidationError::InvalidEndpoint(endpoint.clone()));
    }

    if config.search.max_results == 0 {
        return Err(ValidationError::InvalidMaxResults);
    }

    if config.search.timeout_secs == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "search.timeout_secs",
        });
    }

    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let server = &config.server;

    if server.max_count == 0 {
        return Err(ValidationError::InvalidMaxCount);
    }

    if !(1..=server.max_count).contains(&server.default_count) {
        return Err(ValidationError::InvalidDefaultCount {
            default: server.default_count,
            max: server.max_count,
        });
    }

    if server.max_payload_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidMaxPayloadBytes);
    }

    Ok(())
}

fn validate_fetch(config: &Config) -> Result<(), ValidationError> {
    let fetch = &config.fetch;

    if fetch.timeout_secs == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "fetch.timeout_secs",
        });
    }

    if fetch.connect_timeout_secs == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "fetch.connect_timeout_secs",
        });
    }

    if fetch.max_image_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidMaxImageBytes);
    }

    Ok(())
}
