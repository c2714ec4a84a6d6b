//! Configuration management for the Divino Alimento server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DIVINO_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Composition engine settings
    #[serde(default)]
    pub composition: CompositionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompositionConfig {
    /// Share of an offer assumed ordered when a cycle has no order data
    pub order_ratio: Decimal,

    /// Basket cap used for markets without their own valorMaximoCesta
    pub default_basket_cap: Option<Decimal>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("DIVINO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("composition.order_ratio", "0.4")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DIVINO_ prefix)
            .add_source(
                Environment::with_prefix("DIVINO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        shared::validate_order_ratio(self.composition.order_ratio)
            .map_err(|msg| ConfigError::Message(format!("composition.order_ratio: {}", msg)))?;
        if let Some(cap) = self.composition.default_basket_cap {
            shared::validate_basket_cap(cap).map_err(|msg| {
                ConfigError::Message(format!("composition.default_basket_cap: {}", msg))
            })?;
        }
        Ok(())
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            order_ratio: shared::DEFAULT_ORDER_RATIO,
            default_basket_cap: None,
        }
    }
}
