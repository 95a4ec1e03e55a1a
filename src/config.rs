//! Configuration management using Figment
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. A TOML file (`books.toml` in the working directory unless a path is given)
//! 3. Environment variables prefixed with `BOOKS_`, nested with `__`
//!    (`BOOKS_SERVER__PORT=9000`, `BOOKS_BROKER__URL=nats://localhost:4222`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::broker::PUBLISH_BOOK;

pub const DEFAULT_CONFIG_FILE: &str = "books.toml";
const ENV_PREFIX: &str = "BOOKS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of the `X-{app}-alert` / `X-{app}-params` response headers.
    pub app_name: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// NATS server; messages are only logged when unset.
    pub url: Option<String>,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "booksApp".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            broker: BrokerConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://books.db?mode=rwc".to_string(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: None,
            topic: PUBLISH_BOOK.to_string(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 2000,
        }
    }
}

impl Config {
    /// Load configuration from `books.toml` (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns the figment error when a source holds a value of the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns the figment error when a source holds a value of the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load_from(path: &str) -> Result<Self, figment::Error> {
        tracing::debug!(path, "Loading configuration");
        Self::figment(path).extract()
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
