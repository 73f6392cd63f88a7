//! Configuration loading for transmission-telegram.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default Transmission RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:9091/transmission/rpc";

const REDACTED: &str = "***";

/// Get the home directory for settings (~/.transmission-telegram).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".transmission-telegram"))
}

/// Get the default settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// The settings file to read: `path` when given, else the default location.
pub fn settings_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => get_settings_path(),
    }
}

/// Load settings from `path`, or from ~/.transmission-telegram/settings.json.
///
/// A missing file is not an error: flags and environment variables can
/// supply everything, so defaults are returned instead.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = settings_path(path)?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Check everything the bot needs before it connects anywhere.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    match settings.telegram.bot_token.as_deref() {
        Some(token) if !token.trim().is_empty() => {}
        _ => {
            return Err(Error::Config(
                "telegram.bot_token is not set (use --token or TT_BOTT)".to_string(),
            ))
        }
    }

    if settings.telegram.masters.iter().all(|m| m.trim().is_empty()) {
        return Err(Error::Config(
            "telegram.masters must name at least one user (use --master or TT_MASTER)".to_string(),
        ));
    }

    validate_transmission(&settings.transmission)
}

/// Check the daemon connection settings only.
pub fn validate_transmission(transmission: &TransmissionConfig) -> Result<()> {
    reqwest::Url::parse(&transmission.url).map_err(|e| {
        Error::Config(format!("transmission.url '{}' is invalid: {}", transmission.url, e))
    })?;
    Ok(())
}

/// Telegram configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Usernames or numeric user ids allowed to command the bot.
    #[serde(default)]
    pub masters: Vec<String>,
}

/// Transmission daemon connection.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransmissionConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            username: None,
            password: None,
        }
    }
}

/// Logging configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directives, e.g. `warn` or `info,transmission_telegram=debug`.
    pub level: Option<String>,
}

/// transmission-telegram settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub transmission: TransmissionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Settings {
        let mut out = self.clone();
        if out.telegram.bot_token.is_some() {
            out.telegram.bot_token = Some(REDACTED.to_string());
        }
        if out.transmission.password.is_some() {
            out.transmission.password = Some(REDACTED.to_string());
        }
        out
    }
}
