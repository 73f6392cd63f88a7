//! Telegram bot client - simple polling version.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use teloxide::RequestError;
use tokio::sync::Mutex;

use super::auth::Masters;
use super::commands::Command;
use super::handler::handle;
use super::messenger::{split_message, Messenger, MESSAGE_LIMIT};
use super::update::{Attachment, Sender, Update};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::transmission::{TorrentDaemon, TransmissionClient};

/// Legacy Markdown matches the `*bold*` and `` `code` `` replies.
#[allow(deprecated)]
const PARSE_MODE: ParseMode = ParseMode::Markdown;

/// Shared by every polling task.
struct BotState {
    /// Held for a whole update, so updates are handled one at a time.
    daemon: Mutex<TransmissionClient>,
    masters: Masters,
}

/// Messenger backed by the Bot API.
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: i64, text: &str) {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            let sent = self
                .bot
                .send_message(ChatId(chat_id), chunk)
                .parse_mode(PARSE_MODE)
                .await;

            match sent {
                Ok(_) => {}
                Err(e) if is_api_rejection(&e) => {
                    tracing::warn!(chat_id, "Markdown message rejected, resending as plain text: {}", e);
                    if let Err(e) = self.bot.send_message(ChatId(chat_id), chunk).await {
                        tracing::error!(chat_id, "Failed to deliver message: {}", e);
                    }
                }
                Err(e) => tracing::error!(chat_id, "Failed to deliver message: {}", e),
            }
        }
    }

    async fn resolve_attachment(&self, file_id: &str) -> Result<String> {
        let file = self.bot.get_file(file_id.to_string()).await?;
        Ok(format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        ))
    }
}

/// Run the telegram bot until interrupted.
pub async fn run_telegram_daemon(settings: &Settings) -> Result<()> {
    tracing::info!("Starting Telegram bot...");

    let token = settings
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| Error::Telegram("No bot token configured".to_string()))?;

    let masters = Masters::new(&settings.telegram.masters);
    if masters.is_empty() {
        return Err(Error::Config("No master users configured".to_string()));
    }

    let daemon = TransmissionClient::from_config(&settings.transmission);
    match daemon.version().await {
        Ok(version) => tracing::info!("Connected to Transmission {} at {}", version, daemon.url()),
        Err(e) => tracing::warn!("Transmission at {} is not reachable yet: {}", daemon.url(), e),
    }

    let bot = Bot::new(token);

    let commands = Command::MENU
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect::<Vec<_>>();
    if let Err(e) = bot.set_my_commands(commands).await {
        tracing::warn!("Failed to set commands: {}", e);
    }

    tracing::info!("Telegram bot commands set");

    let state = Arc::new(BotState {
        daemon: Mutex::new(daemon),
        masters,
    });

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let state = Arc::clone(&state);
        async move {
            handle_message(bot, msg, &state).await;
            respond(())
        }
    })
    .await;

    tracing::info!("Telegram bot stopped");
    Ok(())
}

/// Handle an incoming message.
async fn handle_message(bot: Bot, msg: Message, state: &BotState) {
    let update = to_update(&msg);
    if !is_actionable(&update) {
        return;
    }

    if !state.masters.allows(update.sender.as_ref()) {
        tracing::warn!(
            chat_id = update.chat_id,
            sender = ?update.sender,
            "Ignoring message from unauthorized sender"
        );
        return;
    }

    let messenger = TelegramMessenger::new(bot);
    let mut daemon = state.daemon.lock().await;
    handle(&mut *daemon, &messenger, &update).await;
}

fn to_update(msg: &Message) -> Update {
    Update {
        chat_id: msg.chat.id.0,
        text: msg.text().unwrap_or_default().to_string(),
        attachment: msg.document().map(|doc| Attachment {
            file_id: doc.file.id.to_string(),
        }),
        sender: msg.from.as_ref().map(|user| Sender {
            id: user.id.0,
            username: user.username.clone(),
        }),
    }
}

/// Telegram answered and refused the message, as it does for text whose
/// Markdown does not parse. Transport failures are not retried.
fn is_api_rejection(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(_))
}

/// Stickers, photos and service messages carry nothing to act on.
fn is_actionable(update: &Update) -> bool {
    update.attachment.is_some() || !update.text.trim().is_empty()
}
