//! Service configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | HITS_CONFIG | - | Path to a TOML config file |
//! | HITS_BIND | 0.0.0.0:8000 | Listen address |
//! | HITS_SERVICE_NAME | hiiiits | Name reported by `GET /` |
//! | SECRET | - | Shared secret for deletes (unset: deletes refused) |
//! | HITS_REQUIRED_USER_AGENT | - | Substring required in the hit route's User-Agent |
//! | HITS_STORE | memory | memory or localfs |
//! | HITS_DATA_PATH | ./data | LocalFs base directory |
//! | HITS_KEY_PREFIX | hits | Store key prefix |
//! | HITS_YEARLY_WINDOW | 5 | Years of yearly buckets |
//! | HITS_MONTHLY_WINDOW | 48 | Months of monthly buckets |
//! | HITS_DAILY_WINDOW | 360 | Days of daily buckets |
//! | HITS_MAX_TIMESTAMPS | 1440 | Hit instants kept per record |
//! | HITS_LOG_LEVEL | info | Log filter when RUST_LOG is unset |
//! | HITS_LOG_JSON | false | JSON log lines |

use crate::counter::RetentionConfig;
use crate::store::DEFAULT_KEY_PREFIX;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_SERVICE_NAME: &str = "hiiiits";
const DEFAULT_DATA_PATH: &str = "./data";

/// Error loading or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for `ServiceConfig`
    Parse(toml::de::Error),
    /// A value is out of range or unparseable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Cannot read config {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "Invalid config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Storage backend for counter records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory; lost on restart
    Memory,
    /// One file per record under `data_path`
    LocalFs,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "localfs" => Ok(StoreBackend::LocalFs),
            other => Err(ConfigError::Invalid(format!("unknown store backend {:?}", other))),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// LocalFs base directory
    pub data_path: PathBuf,
    /// Prefix for every counter key
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Memory,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Reported by `GET /`
    pub service_name: String,
    /// Shared secret for deletes
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// When set, hits without this substring in User-Agent get the warning pixel
    pub required_user_agent: Option<String>,
    pub store: StoreConfig,
    pub retention: RetentionConfig,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind_addr: DEFAULT_BIND
                .parse()
                .expect("hardcoded address must parse"),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            secret: None,
            required_user_agent: None,
            store: StoreConfig::default(),
            retention: RetentionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from `HITS_CONFIG` (if set) and the environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("HITS_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Apply overrides from a variable lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HITS_BIND") {
            self.bind_addr = parse_var("HITS_BIND", &v)?;
        }
        if let Some(v) = lookup("HITS_SERVICE_NAME") {
            self.service_name = v;
        }
        if let Some(v) = lookup("SECRET") {
            self.secret = Some(v);
        }
        if let Some(v) = lookup("HITS_REQUIRED_USER_AGENT") {
            self.required_user_agent = Some(v);
        }
        if let Some(v) = lookup("HITS_STORE") {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = lookup("HITS_DATA_PATH") {
            self.store.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("HITS_KEY_PREFIX") {
            self.store.key_prefix = v;
        }
        if let Some(v) = lookup("HITS_YEARLY_WINDOW") {
            self.retention.yearly_window = parse_var("HITS_YEARLY_WINDOW", &v)?;
        }
        if let Some(v) = lookup("HITS_MONTHLY_WINDOW") {
            self.retention.monthly_window = parse_var("HITS_MONTHLY_WINDOW", &v)?;
        }
        if let Some(v) = lookup("HITS_DAILY_WINDOW") {
            self.retention.daily_window = parse_var("HITS_DAILY_WINDOW", &v)?;
        }
        if let Some(v) = lookup("HITS_MAX_TIMESTAMPS") {
            self.retention.max_timestamps = parse_var("HITS_MAX_TIMESTAMPS", &v)?;
        }
        if let Some(v) = lookup("HITS_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("HITS_LOG_JSON") {
            self.log.json = v == "true" || v == "1";
        }
        Ok(())
    }

    /// Reject configurations the engine cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retention;
        if r.yearly_window == 0 || r.monthly_window == 0 || r.daily_window == 0 {
            return Err(ConfigError::Invalid(
                "retention windows must be at least 1".to_string(),
            ));
        }
        if r.max_timestamps == 0 {
            return Err(ConfigError::Invalid(
                "max_timestamps must be at least 1".to_string(),
            ));
        }
        if self.store.key_prefix.is_empty() || self.store.key_prefix.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "key_prefix {:?} must be non-empty and contain no '/'",
                self.store.key_prefix
            )));
        }
        if self.secret.as_deref() == Some("") {
            return Err(ConfigError::Invalid("secret must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{}={:?} is not valid", name, value)))
}
