use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default address for the health and metrics server.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// How long the watch may take to complete its initial listing.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the cached ConfigMap is re-delivered to the reconciler.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub const AVAILABLE_LOG_LEVELS: &str = "all, debug, info, warn, error, none";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--{flag} is required")]
    Missing { flag: &'static str },

    #[error("--{flag} must be greater than zero")]
    ZeroDuration { flag: &'static str },

    #[error("log level {value} unknown; possible values are: {AVAILABLE_LOG_LEVELS}")]
    UnknownLogLevel { value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    All,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    None,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(LogLevel::All),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "none" => Ok(LogLevel::None),
            other => Err(ConfigError::UnknownLogLevel {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::All => "all",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        };
        f.write_str(name)
    }
}

/// Everything the process needs to know, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit kubeconfig path. When unset the client config is inferred.
    pub kubeconfig: Option<PathBuf>,
    /// Namespace of the ConfigMap. Falls back to the client's default namespace.
    pub namespace: Option<String>,
    /// Where to write the file.
    pub path: PathBuf,
    /// The ConfigMap name.
    pub name: String,
    /// The ConfigMap key to read.
    pub key: String,
    /// Address for the health and metrics server.
    pub listen: String,
    pub log_level: LogLevel,
    /// Sync a single time and exit instead of watching.
    pub one_time: bool,
    pub sync_timeout: Duration,
    pub resync_interval: Duration,
}

impl Settings {
    /// Creates settings for the given target with every other field defaulted.
    pub fn new(name: impl Into<String>, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: None,
            namespace: None,
            path: path.into(),
            name: name.into(),
            key: key.into(),
            listen: DEFAULT_LISTEN.to_string(),
            log_level: LogLevel::default(),
            one_time: false,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Missing { flag: "name" });
        }
        if self.key.is_empty() {
            return Err(ConfigError::Missing { flag: "key" });
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Missing { flag: "path" });
        }
        if self.one_time {
            return Ok(());
        }
        if self.listen.is_empty() {
            return Err(ConfigError::Missing { flag: "listen" });
        }
        if self.sync_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                flag: "sync-timeout",
            });
        }
        if self.resync_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                flag: "resync-interval",
            });
        }
        Ok(())
    }
}
