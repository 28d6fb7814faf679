//! Runtime settings for both operating modes.

pub mod schema;

pub use schema::{
    ConfigError, LogLevel, Settings, AVAILABLE_LOG_LEVELS, DEFAULT_LISTEN,
    DEFAULT_RESYNC_INTERVAL, DEFAULT_SYNC_TIMEOUT,
};
