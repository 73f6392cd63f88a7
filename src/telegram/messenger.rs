//! Outgoing chat messages.

use async_trait::async_trait;

use crate::error::Result;

/// Telegram's per-message text limit, in bytes.
pub const MESSAGE_LIMIT: usize = 4096;

/// Chat transport used by the command handlers.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver `text` to `chat_id`. Delivery problems stay inside the
    /// transport.
    async fn send(&self, chat_id: i64, text: &str);

    /// Turn an attachment's file id into a URL the daemon can fetch.
    async fn resolve_attachment(&self, file_id: &str) -> Result<String>;
}

/// Replies to the chat an update came from.
pub struct Reply<'a, M: ?Sized> {
    messenger: &'a M,
    chat_id: i64,
}

impl<'a, M: Messenger + ?Sized> Reply<'a, M> {
    pub fn new(messenger: &'a M, chat_id: i64) -> Self {
        Self { messenger, chat_id }
    }

    pub async fn send(&self, text: impl AsRef<str>) {
        self.messenger.send(self.chat_id, text.as_ref()).await;
    }

    pub fn messenger(&self) -> &'a M {
        self.messenger
    }
}

/// Split `text` into chunks of at most `limit` bytes, preferring line
/// breaks. Never splits inside a UTF-8 character.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > limit {
        let mut cut = limit;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            break;
        }
        let cut = match rest[..cut].rfind('\n') {
            Some(i) if i > 0 => i,
            _ => cut,
        };
        chunks.push(&rest[..cut]);
        rest = rest[cut..].trim_start_matches('\n');
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}
