//! Runtime configuration for the voting core.
//!
//! # Responsibility
//! - Describe database, eligibility, messaging and logging settings.
//! - Load them from TOML with environment-variable overrides.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - `validate()` must pass before a runtime is built from the config.

use crate::logging::default_log_level;
use crate::notify::DEFAULT_QUEUE_CAPACITY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_ELIGIBILITY_URL: &str = "https://user-info.herokuapp.com";
pub const DEFAULT_ELIGIBILITY_TIMEOUT_MS: u64 = 3_000;

pub const ENV_DB_PATH: &str = "ASSEMBLY_DB_PATH";
pub const ENV_ELIGIBILITY_ENABLED: &str = "ASSEMBLY_ELIGIBILITY_ENABLED";
pub const ENV_ELIGIBILITY_URL: &str = "ASSEMBLY_ELIGIBILITY_URL";
pub const ENV_ELIGIBILITY_TIMEOUT_MS: &str = "ASSEMBLY_ELIGIBILITY_TIMEOUT_MS";
pub const ENV_MESSAGING_ENABLED: &str = "ASSEMBLY_MESSAGING_ENABLED";
pub const ENV_MESSAGING_CAPACITY: &str = "ASSEMBLY_MESSAGING_CAPACITY";
pub const ENV_LOG_LEVEL: &str = "ASSEMBLY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ASSEMBLY_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    InvalidEnv { name: &'static str, value: String },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidEnv { name, value } => {
                write!(f, "environment variable {name} has invalid value `{value}`")
            }
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `None` keeps everything in a private in-memory database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EligibilityConfig {
    /// `false` approves every voter (development only).
    pub enabled: bool,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_ELIGIBILITY_URL.to_string(),
            timeout_ms: DEFAULT_ELIGIBILITY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagingConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rotated log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub eligibility: EligibilityConfig,
    pub messaging: MessagingConfig,
    pub logging: LoggingConfig,
}

impl CoreConfig {
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        toml::from_str(document).map_err(ConfigError::Parse)
    }

    /// Reads `path` (if given), applies process environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&document)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup; unset variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.database.path = non_blank(value).map(PathBuf::from);
        }
        if let Some(value) = lookup(ENV_ELIGIBILITY_ENABLED) {
            self.eligibility.enabled = parse_bool(ENV_ELIGIBILITY_ENABLED, &value)?;
        }
        if let Some(value) = lookup(ENV_ELIGIBILITY_URL) {
            self.eligibility.base_url = value;
        }
        if let Some(value) = lookup(ENV_ELIGIBILITY_TIMEOUT_MS) {
            self.eligibility.timeout_ms = parse_number(ENV_ELIGIBILITY_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MESSAGING_ENABLED) {
            self.messaging.enabled = parse_bool(ENV_MESSAGING_ENABLED, &value)?;
        }
        if let Some(value) = lookup(ENV_MESSAGING_CAPACITY) {
            self.messaging.capacity = parse_number(ENV_MESSAGING_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.logging.dir = non_blank(value).map(PathBuf::from);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.messaging.capacity == 0 {
            return Err(ConfigError::Invalid(
                "messaging.capacity must be at least 1".to_string(),
            ));
        }
        if self.eligibility.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "eligibility.timeout_ms must be positive".to_string(),
            ));
        }
        if self.eligibility.enabled && self.eligibility.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "eligibility.base_url is required when eligibility is enabled".to_string(),
            ));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}
