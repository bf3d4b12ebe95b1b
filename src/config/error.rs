//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Public URL must start with http:// or https://")]
    InvalidPublicUrl,

    #[error("Public URL must use HTTPS in production")]
    PublicUrlMustBeHttps,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool max_connections must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Gateway base URL must start with http:// or https://")]
    InvalidGatewayUrl,

    #[error("Gateway base URL must use HTTPS in production")]
    GatewayUrlMustBeHttps,
}
