//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CLINIC_ASSISTANT`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use clinic_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod clinic;
mod database;
mod error;
mod messaging;
mod server;

pub use clinic::ClinicConfig;
pub use database::{DatabaseBackend, DatabaseConfig};
pub use error::{ConfigError, ValidationError};
pub use messaging::MessagingConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup (memory backend, logging gateway).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend selection and PostgreSQL pool
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Messaging provider credentials
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Doctor identification and flow tuning
    #[serde(default)]
    pub clinic: ClinicConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CLINIC_ASSISTANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CLINIC_ASSISTANT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CLINIC_ASSISTANT__MESSAGING__SENDER=...` -> `messaging.sender = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CLINIC_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires durable storage, enabled messaging
    /// and doctor identification.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.messaging.validate()?;
        self.clinic.validate()?;

        // A duplicate webhook waits inside the request.
        if self.clinic.duplicate_wait() >= self.server.request_timeout() {
            return Err(ValidationError::DuplicateWaitExceedsRequestTimeout);
        }

        if self.is_production() {
            if !self.database.is_postgres() {
                return Err(ValidationError::MemoryBackendInProduction);
            }
            if !self.messaging.enabled {
                return Err(ValidationError::MissingRequired("MESSAGING__ENABLED"));
            }
            self.clinic.validate_for_production()?;
        }

        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.environment.is_production()
    }
}
