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

    #[error("Invalid listen address: {0}")]
    InvalidListenAddress(String),

    #[error("Request timeout must be between 1 and 60 seconds")]
    InvalidTimeout,

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Duplicate wait must be shorter than the request timeout")]
    DuplicateWaitExceedsRequestTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Production requires the postgres database backend")]
    MemoryBackendInProduction,

    #[error("Invalid messaging account SID format")]
    InvalidAccountSid,

    #[error("Invalid messaging API base URL")]
    InvalidMessagingUrl,

    #[error("Messaging sender must include the channel prefix")]
    SenderMissingChannelPrefix,

    #[error("Invalid send timeout")]
    InvalidSendTimeout,

    #[error("Conflict retries must be between 1 and 50")]
    InvalidConflictRetries,

    #[error("Reconciliation interval, grace and batch size must be positive")]
    InvalidReconcileSettings,

    #[error("Stale claim age must be longer than the duplicate wait")]
    InvalidDuplicateSettings,
}
