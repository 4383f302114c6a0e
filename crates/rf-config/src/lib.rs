//! # rf-config
//!
//! Layered settings for the Rusty-Forum binary.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults (the `Default` impls below)
//! 2. `rusty-forum.toml`, or the file named by `RUSTY_FORUM_CONFIG` (optional)
//! 3. environment variables such as `RUSTY_FORUM__SERVER__PORT=9000`
//!
//! `auth.session_secret` has no default and must come from a file or the
//! environment.

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RUSTY_FORUM";
pub const CONFIG_PATH_VAR: &str = "RUSTY_FORUM_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "rusty-forum";
const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub limits: LimitsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Worker threads; actix picks one per core when unset.
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite:rusty_forum.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// HMAC key used to sign and verify session tokens.
    pub session_secret: SecretString,
}

/// Request bounds applied by the HTTP layer before calling the core.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsSettings {
    pub trending_default_limit: usize,
    pub trending_max_limit: usize,
    pub trending_default_days: u32,
    pub trending_max_days: u32,
    /// Reply nesting shown before a thread continues on its own page.
    pub comment_max_depth: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            trending_default_limit: 10,
            trending_max_limit: 20,
            trending_default_days: 7,
            trending_max_days: 365,
            comment_max_depth: 6,
        }
    }
}

impl LimitsSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.trending_max_limit == 0 || self.trending_max_days == 0 {
            return Err(ConfigError::Invalid(
                "trending maxima must be positive".to_string(),
            ));
        }
        if self.trending_default_limit == 0 || self.trending_default_limit > self.trending_max_limit {
            return Err(ConfigError::Invalid(format!(
                "trending_default_limit must be within 1..={}",
                self.trending_max_limit
            )));
        }
        if self.trending_default_days == 0 || self.trending_default_days > self.trending_max_days {
            return Err(ConfigError::Invalid(format!(
                "trending_default_days must be within 1..={}",
                self.trending_max_days
            )));
        }
        Ok(())
    }
}

impl Settings {
    /// Loads settings from the config file (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        log::debug!("reading configuration from '{path}' and {ENV_PREFIX}__* variables");

        let builder = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    /// Builds settings from an inline TOML document, without touching the
    /// environment.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.session_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".to_string(),
            ));
        }
        self.limits.validate()
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

/// Loads `.env` into the process environment if present. Call before the
/// logger is initialized so `RUST_LOG` can live there too.
pub fn load_dotenv() {
    // A missing .env is the normal production case.
    let _ = dotenvy::dotenv();
}
