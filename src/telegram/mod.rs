//! Telegram bot integration.

pub mod auth;
pub mod client;
pub mod commands;
pub mod handler;
pub mod messenger;
pub mod update;

pub use client::run_telegram_daemon;
pub use commands::Command;
pub use handler::handle;
pub use messenger::{Messenger, Reply};
pub use update::Update;
