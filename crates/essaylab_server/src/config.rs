//! Process settings loaded from the environment.
//!
//! Every knob has a default suitable for local development, so an empty
//! environment yields a working server bound to loopback.

use essaylab_core::ObjectStoreConfig;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE_NAME: &str = "app.db";
pub const DEFAULT_FRONTEND_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "https://localhost:8000",
    "null",
    "file://",
];

/// Deployment environment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(raw.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ESSAYLAB_ENV must be development, staging or production, got `{0}`")]
    InvalidEnvironment(String),
    #[error("{name} must be a boolean, got `{value}`")]
    InvalidBool { name: &'static str, value: String },
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: Environment,
    pub debug: bool,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    /// Allowed CORS origins; `*` allows any origin.
    pub frontend_origins: Vec<String>,
    /// Local directory receiving essay copies.
    pub backup_dir: Option<PathBuf>,
    /// Object-store backup target, present only when fully configured.
    pub object_store: Option<ObjectStoreConfig>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let environment = match var("ESSAYLAB_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Development,
        };
        let debug = match var("ESSAYLAB_DEBUG") {
            Some(raw) => parse_bool("ESSAYLAB_DEBUG", &raw)?,
            None => environment == Environment::Development,
        };
        // Production never runs with debug output.
        let debug = debug && environment != Environment::Production;

        let data_dir = var("ESSAYLAB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let database_path = var("ESSAYLAB_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE_NAME));
        let log_level = var("ESSAYLAB_LOG_LEVEL")
            .map(|level| level.to_ascii_lowercase())
            .unwrap_or_else(|| {
                let level = if debug { "debug" } else { "info" };
                level.to_string()
            });
        let frontend_origins = match var("ESSAYLAB_FRONTEND_ORIGINS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_FRONTEND_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
        };

        let store_enabled = match var("STORE_ESSAY_S3") {
            Some(raw) => parse_bool("STORE_ESSAY_S3", &raw)?,
            None => false,
        };
        let object_store = ObjectStoreConfig::from_settings(
            store_enabled,
            var("AWS_REGION").as_deref(),
            var("AWS_S3_BUCKET").as_deref(),
            var("AWS_S3_PREFIX").as_deref(),
            var("AWS_PROFILE").as_deref(),
            var("AWS_KMS_KEY_ID").as_deref(),
        );

        Ok(Self {
            environment,
            debug,
            bind_addr: var("ESSAYLAB_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            data_dir,
            database_path,
            log_level,
            log_dir: var("ESSAYLAB_LOG_DIR"),
            frontend_origins,
            backup_dir: var("ESSAYLAB_BACKUP_DIR").map(PathBuf::from),
            object_store,
        })
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: raw.to_string(),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
