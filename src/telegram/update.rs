//! Inbound chat updates and tokenizing.

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_id: String,
}

/// Who sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub username: Option<String>,
}

/// A single inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub chat_id: i64,
    pub text: String,
    pub attachment: Option<Attachment>,
    pub sender: Option<Sender>,
}

impl Update {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            attachment: None,
            sender: None,
        }
    }

    /// Normalized command verb, empty when the text is blank.
    pub fn verb(&self) -> String {
        self.text
            .split_whitespace()
            .next()
            .map(normalize_verb)
            .unwrap_or_default()
    }

    /// Arguments following the verb.
    pub fn tokens(&self) -> Vec<&str> {
        tokenize(&self.text)
    }
}

/// Split message text on whitespace and drop the leading verb.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

/// `/Stop@my_bot` -> `stop`
fn normalize_verb(raw: &str) -> String {
    let verb = raw.strip_prefix('/').unwrap_or(raw);
    let verb = match verb.split_once('@') {
        Some((verb, _bot)) => verb,
        None => verb,
    };
    verb.to_lowercase()
}
