//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Cache invalidation configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Denormalized counter configuration.
    #[serde(default)]
    pub counters: CountersConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Cache invalidation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether invalidation signals are sent to Redis.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pub/Sub channel the invalidated tags are published on.
    #[serde(default = "default_invalidation_channel")]
    pub channel: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: default_invalidation_channel(),
        }
    }
}

/// Denormalized counter configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountersConfig {
    /// How counters are kept in step with relationship rows.
    #[serde(default)]
    pub mode: CounterMode,
}

/// Counter maintenance strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterMode {
    /// Apply a single atomic `+1`/`-1` when the relationship write changed a row.
    #[default]
    Atomic,
    /// Count the relationship rows and overwrite the counter.
    ///
    /// Concurrent toggles against the same target may lose updates.
    Recount,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    50
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "carmeet".to_string()
}

fn default_invalidation_channel() -> String {
    "carmeet:invalidate".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `CARMEET_ENV`)
    /// 4. Environment variables with `CARMEET__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();

        let env = std::env::var("CARMEET_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CARMEET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CARMEET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
