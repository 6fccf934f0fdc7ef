//! Logging bootstrap shared by `agrd-proxy` and `agrd-client`
//!
//! `RUST_LOG` wins when set; otherwise the `[logging] level` from TOML is used.
//! With `[logging] file` set, output goes to that file (appended, no ANSI colors)
//! instead of stderr.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Fails with `Error::Config` on an unknown level, an unwritable log file, or
/// when a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = normalize_level(&config.level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("Cannot open log file {}: {}", path.display(), e))
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}

/// Map a configured level onto a directive `EnvFilter` accepts
pub fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(Error::Config(format!(
            "Unsupported log level `{}`; expected trace|debug|info|warn|error",
            other
        ))),
    }
}
