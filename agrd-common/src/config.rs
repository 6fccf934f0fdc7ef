//! Configuration loading and root folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing default TOML file is not an error: the built-in defaults are used
//! and startup continues.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the client data folder
pub const ROOT_FOLDER_ENV: &str = "AGRD_ROOT_FOLDER";

/// Environment variable carrying the identity provider client identifier
pub const CLIENT_ID_ENV: &str = "TWITCH_CLIENT_ID";

/// Environment variable carrying the identity provider client secret
pub const CLIENT_SECRET_ENV: &str = "TWITCH_CLIENT_SECRET";

const APP_DIR: &str = "agrd";

/// Configuration loaded from `config.toml`
///
/// Every section is optional; absent keys take the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the client's durable storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub proxy: ProxySection,

    #[serde(default)]
    pub client: ClientSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// `[proxy]` section: search proxy server and upstream endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity provider token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Catalog API base URL (the `/games` endpoint is appended)
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token_url: default_token_url(),
            catalog_url: default_catalog_url(),
            client_id: None,
            client_secret: None,
        }
    }
}

/// `[client]` section: terminal front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    /// Base URL of the search proxy
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Debounce quiet window in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Name of the durable storage slot holding the backlog
    #[serde(default = "default_slot_name")]
    pub slot_name: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            debounce_ms: default_debounce_ms(),
            slot_name: default_slot_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    5780
}

fn default_token_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}

fn default_catalog_url() -> String {
    "https://api.igdb.com/v4".to_string()
}

fn default_server_url() -> String {
    format!("http://127.0.0.1:{}", default_port())
}

pub fn default_debounce_ms() -> u64 {
    600
}

fn default_slot_name() -> String {
    "pile_of_shame".to_string()
}

/// Default configuration file location (`~/.config/agrd/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load TOML configuration
///
/// - `explicit`: path given on the command line. It must exist.
/// - `None`: the platform default path is tried; when it is absent the
///   built-in defaults are returned.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write TOML configuration atomically (temp file + fsync + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;

    debug!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Treat empty or whitespace-only values as absent
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve one secret-like setting from ENV then TOML
///
/// Warns when both sources carry a value (the environment wins).
pub fn resolve_env_or_toml(
    env_var_name: &str,
    toml_value: Option<&str>,
    label: &str,
) -> Option<String> {
    let env_value = std::env::var(env_var_name).ok().filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v));

    match (env_value, toml_value) {
        (Some(env), Some(_)) => {
            warn!(
                "{} found in both environment ({}) and TOML config. Using environment.",
                label, env_var_name
            );
            Some(env)
        }
        (Some(env), None) => {
            info!("{} loaded from environment variable", label);
            Some(env)
        }
        (None, Some(toml)) => {
            info!("{} loaded from TOML config", label);
            Some(toml.to_string())
        }
        (None, None) => None,
    }
}

/// Root folder resolution for the client's durable storage
///
/// Priority: CLI argument → `AGRD_ROOT_FOLDER` → TOML `root_folder` → OS default.
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    toml_config: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new(cli_arg: Option<PathBuf>, toml_config: Option<&'a TomlConfig>) -> Self {
        Self {
            cli_arg,
            toml_config,
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if is_valid_value(&path) {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml_config.and_then(|c| c.root_folder.clone()) {
            return path;
        }

        default_root_folder()
    }
}

/// OS-dependent default data folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./agrd_data"))
}
