//! Layered settings: built-in defaults, then an optional TOML file, then
//! `FACILITIES_*` environment variables (`__` separates nested keys).
//! `MONGODB_URI` and `PORT` are accepted as shorthands.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::middleware::TokenVerifier;

/// Looked up next to the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "facilities";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub mongodb: MongoSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub enabled: bool,
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from every source. An explicit `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix("FACILITIES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("mongodb.uri", std::env::var("MONGODB_URI").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?;
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.enabled && self.jwt_secret().is_none() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set when auth.enabled is true".to_string(),
            ));
        }
        Ok(())
    }

    fn jwt_secret(&self) -> Option<&str> {
        self.auth
            .jwt_secret
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }

    /// The verifier guarding `/api`, or `None` when auth is disabled.
    pub fn token_verifier(&self) -> Option<TokenVerifier> {
        if !self.auth.enabled {
            return None;
        }
        self.jwt_secret().map(TokenVerifier::new)
    }

    /// Verifier for minting tokens, regardless of `auth.enabled`.
    pub fn signing_verifier(&self) -> Result<TokenVerifier, ConfigError> {
        self.jwt_secret()
            .map(TokenVerifier::new)
            .ok_or_else(|| ConfigError::Message("auth.jwt_secret is not set".to_string()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("mongodb.uri", "mongodb://localhost:27017")?
        .set_default("mongodb.database", "facilities")?
        .set_default("auth.enabled", true)?
        .set_default("log.filter", "facilities=info,tower_http=info")?
        .set_default("log.json", false)
}
