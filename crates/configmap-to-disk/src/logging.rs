//! JSON log output on stdout.
//!
//! Library code logs through the `log` facade; records are bridged into a
//! `tracing` subscriber that writes one JSON object per line with a UTC
//! timestamp and the caller's file and line.

use chrono::{SecondsFormat, Utc};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use crate::config::LogLevel;
use crate::error::{Error, Result};

/// RFC 3339 UTC timestamps with millisecond precision.
struct UtcTimestamp;

impl FormatTime for UtcTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::All => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::None => LevelFilter::OFF,
    }
}

fn log_filter(level: LogLevel) -> log::LevelFilter {
    match level {
        LogLevel::All => log::LevelFilter::Trace,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::None => log::LevelFilter::Off,
    }
}

/// Installs the global logger. Call once, before anything logs.
pub fn init(level: LogLevel) -> Result<()> {
    tracing_log::LogTracer::init_with_filter(log_filter(level))
        .map_err(|e| Error::Logging(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stdout)
        .with_timer(UtcTimestamp)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_max_level(level_filter(level))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_filter(LogLevel::All), LevelFilter::TRACE);
        assert_eq!(level_filter(LogLevel::Info), LevelFilter::INFO);
        assert_eq!(level_filter(LogLevel::None), LevelFilter::OFF);
        assert_eq!(log_filter(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(log_filter(LogLevel::None), log::LevelFilter::Off);
    }

    #[test]
    fn test_timestamp_format() {
        let mut out = String::new();
        UtcTimestamp.format_time(&mut Writer::new(&mut out)).unwrap();
        assert!(out.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok());
    }
}
