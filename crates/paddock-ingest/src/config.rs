//! Configuration management
//!
//! All configuration is loaded once at startup and passed into components as
//! an immutable value. A bad configuration is fatal: the run must not begin.

use paddock_common::{PaddockError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Configuration Constants
// ============================================================================

/// Default provider query endpoint (persisted GraphQL operations).
pub const DEFAULT_PROVIDER_URL: &str = "https://puntapi.com/racing";

/// Default per-event odds endpoint.
pub const DEFAULT_ODDS_URL: &str = "https://puntapi.com/odds/au/event";

/// Default brand parameter sent with every provider operation.
pub const DEFAULT_BRAND: &str = "punters";

/// Default sport filter.
pub const DEFAULT_SPORT: &str = "HorseRacing";

/// Default authorization bearer token. The provider accepts anonymous reads
/// but rejects requests without the header.
pub const DEFAULT_BEARER_TOKEN: &str = "none";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Countries whose meetings are ingested when no override is configured.
pub const DEFAULT_ALLOWED_COUNTRIES: &[&str] = &["Australia", "New Zealand", "Hong Kong"];

// ============================================================================
// Database Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/paddock";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database acquire timeout in seconds.
pub const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Sync Configuration Constants
// ============================================================================

/// Default bounded fan-out for per-event fetches within one meeting.
/// Set to 1 for strictly sequential processing.
pub const DEFAULT_EVENT_FAN_OUT: usize = 4;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

/// Provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub odds_base_url: String,
    pub brand: String,
    pub sport: String,
    pub bearer_token: String,
    pub request_timeout_secs: u64,
    /// Meetings outside these countries are dropped before flattening.
    pub allowed_countries: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub event_fan_out: usize,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            provider: ProviderConfig {
                base_url: std::env::var("PADDOCK_PROVIDER_URL")
                    .unwrap_or_else(|_| DEFAULT_PROVIDER_URL.to_string()),
                odds_base_url: std::env::var("PADDOCK_ODDS_URL")
                    .unwrap_or_else(|_| DEFAULT_ODDS_URL.to_string()),
                brand: std::env::var("PADDOCK_BRAND")
                    .unwrap_or_else(|_| DEFAULT_BRAND.to_string()),
                sport: std::env::var("PADDOCK_SPORT")
                    .unwrap_or_else(|_| DEFAULT_SPORT.to_string()),
                bearer_token: std::env::var("PADDOCK_BEARER_TOKEN")
                    .unwrap_or_else(|_| DEFAULT_BEARER_TOKEN.to_string()),
                request_timeout_secs: std::env::var("PADDOCK_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                allowed_countries: std::env::var("PADDOCK_ALLOWED_COUNTRIES")
                    .map(|s| {
                        s.split(',')
                            .map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty())
                            .collect()
                    })
                    .unwrap_or_else(|_| {
                        DEFAULT_ALLOWED_COUNTRIES
                            .iter()
                            .map(|c| c.to_string())
                            .collect()
                    }),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                acquire_timeout_secs: std::env::var("DATABASE_ACQUIRE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS),
            },
            sync: SyncConfig {
                event_fan_out: std::env::var("PADDOCK_EVENT_FAN_OUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_EVENT_FAN_OUT),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration; any failure here aborts startup
    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.is_empty() {
            return Err(PaddockError::config("Provider URL cannot be empty"));
        }

        if self.provider.allowed_countries.is_empty() {
            return Err(PaddockError::config(
                "Allowed-country list cannot be empty (set PADDOCK_ALLOWED_COUNTRIES)",
            ));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(PaddockError::config("Request timeout must be greater than 0"));
        }

        if self.database.url.is_empty() {
            return Err(PaddockError::config("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(PaddockError::config(
                "Database max_connections must be greater than 0",
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(PaddockError::config(format!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.sync.event_fan_out == 0 {
            return Err(PaddockError::config("Event fan-out must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                base_url: DEFAULT_PROVIDER_URL.to_string(),
                odds_base_url: DEFAULT_ODDS_URL.to_string(),
                brand: DEFAULT_BRAND.to_string(),
                sport: DEFAULT_SPORT.to_string(),
                bearer_token: DEFAULT_BEARER_TOKEN.to_string(),
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                allowed_countries: DEFAULT_ALLOWED_COUNTRIES
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                acquire_timeout_secs: DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            },
            sync: SyncConfig {
                event_fan_out: DEFAULT_EVENT_FAN_OUT,
            },
        }
    }
}
