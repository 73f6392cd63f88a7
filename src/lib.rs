//! transmission-telegram library root.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod telegram;
pub mod transmission;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use telegram::run_telegram_daemon;
pub use transmission::{SortSpec, TorrentDaemon, TransmissionClient};
