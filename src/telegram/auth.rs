//! Who may command the bot.

use super::update::Sender;

/// Allow-list of master users, by username or numeric id.
#[derive(Debug, Clone, Default)]
pub struct Masters {
    usernames: Vec<String>,
    ids: Vec<u64>,
}

impl Masters {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut masters = Masters::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            match entry.parse::<u64>() {
                Ok(id) => masters.ids.push(id),
                Err(_) => masters
                    .usernames
                    .push(entry.trim_start_matches('@').to_lowercase()),
            }
        }
        masters
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty() && self.ids.is_empty()
    }

    /// Anonymous senders are never masters.
    pub fn allows(&self, sender: Option<&Sender>) -> bool {
        let Some(sender) = sender else {
            return false;
        };
        if self.ids.contains(&sender.id) {
            return true;
        }
        sender
            .username
            .as_deref()
            .map(|name| name.to_lowercase())
            .is_some_and(|name| self.usernames.contains(&name))
    }
}
