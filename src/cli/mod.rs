//! CLI commands for transmission-telegram using clap.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{
    load_settings, settings_path, validate_settings, validate_transmission, Settings,
    TransmissionConfig,
};
use crate::logging;
use crate::transmission::{TorrentDaemon, TransmissionClient};

/// transmission-telegram - control Transmission from a Telegram chat.
#[derive(Parser, Debug)]
#[command(name = "transmission-telegram")]
#[command(version)]
#[command(about = "Telegram bot for a Transmission daemon", long_about = None)]
pub struct Commands {
    /// Settings file (default: ~/.transmission-telegram/settings.json)
    #[arg(long, short, global = true, env = "TT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot
    Run(BotArgs),

    /// Connect to the daemon and print its version
    Check(ConnectionArgs),

    /// Print the effective settings with secrets hidden
    Config(BotArgs),
}

/// Daemon connection overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Transmission RPC URL
    #[arg(long, env = "TR_URL")]
    pub url: Option<String>,

    /// Transmission RPC username
    #[arg(long, env = "TR_AUTH_USER")]
    pub username: Option<String>,

    /// Transmission RPC password
    #[arg(long, env = "TR_AUTH_PASS", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn apply(&self, transmission: &mut TransmissionConfig) {
        if let Some(url) = &self.url {
            transmission.url = url.clone();
        }
        if let Some(username) = &self.username {
            transmission.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            transmission.password = Some(password.clone());
        }
    }
}

/// Bot overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct BotArgs {
    /// Telegram bot token
    #[arg(long, env = "TT_BOTT", hide_env_values = true)]
    pub token: Option<String>,

    /// Username or user id allowed to command the bot (repeatable)
    #[arg(long = "master", env = "TT_MASTER", value_delimiter = ',')]
    pub masters: Vec<String>,

    /// Directory for log files
    #[arg(long, env = "TT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log filter directives, e.g. `warn` (RUST_LOG takes precedence)
    #[arg(long, env = "TT_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl BotArgs {
    /// Flags replace file values; masters given on the command line replace
    /// the configured list.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(token) = &self.token {
            settings.telegram.bot_token = Some(token.clone());
        }
        if !self.masters.is_empty() {
            settings.telegram.masters = self.masters.clone();
        }
        if let Some(dir) = &self.log_dir {
            settings.logging.directory = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = Some(level.clone());
        }
        self.connection.apply(&mut settings.transmission);
    }
}

impl Commands {
    /// Effective settings for the chosen subcommand.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = load_settings(self.config.as_deref()).context("Failed to load settings")?;
        match &self.command {
            Command::Run(args) | Command::Config(args) => args.apply(&mut settings),
            Command::Check(args) => args.apply(&mut settings.transmission),
        }
        Ok(settings)
    }

    /// Logged once the subscriber exists, so it reaches the log file.
    fn log_settings_source(&self) -> Result<()> {
        let path = settings_path(self.config.as_deref())?;
        if path.exists() {
            tracing::info!("Loaded settings from {}", path.display());
        } else {
            tracing::info!("No settings file at {}, using flags and defaults", path.display());
        }
        Ok(())
    }

    pub async fn run(&self) -> Result<()> {
        let settings = self.settings()?;

        match &self.command {
            Command::Run(_) => {
                validate_settings(&settings)?;
                let _guard = logging::init(&settings.logging)?;
                self.log_settings_source()?;
                crate::telegram::run_telegram_daemon(&settings).await?;
            }
            Command::Check(_) => {
                validate_transmission(&settings.transmission)?;
                let client = TransmissionClient::from_config(&settings.transmission);
                let version = client
                    .version()
                    .await
                    .with_context(|| format!("Could not reach Transmission at {}", client.url()))?;
                println!("Transmission {} at {}", version, client.url());
            }
            Command::Config(_) => {
                println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
            }
        }

        Ok(())
    }
}
