//! Command dispatch for inbound updates.

use super::commands::Command;
use super::messenger::{Messenger, Reply};
use super::update::Update;
use crate::transmission::TorrentDaemon;

/// Handle one update to completion. Every effect is a message sent
/// through `messenger`.
pub async fn handle<D, M>(daemon: &mut D, messenger: &M, update: &Update)
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let command = Command::for_update(update);
    tracing::info!(
        chat_id = update.chat_id,
        command = command.name(),
        "Handling command"
    );

    let reply = Reply::new(messenger, update.chat_id);
    command.run(daemon, &reply, update).await;
}
