//! Daemon interface used by the command handlers.

use async_trait::async_trait;

use super::sort::SortSpec;
use super::types::{AddedTorrent, Torrent};
use crate::error::Result;

/// Operations the bot issues against a torrent daemon.
///
/// Torrent ids are the daemon's; nothing here checks them locally.
#[async_trait]
pub trait TorrentDaemon: Send + Sync {
    async fn stop_all(&self) -> Result<()>;

    async fn start_all(&self) -> Result<()>;

    async fn verify_all(&self) -> Result<()>;

    /// Returns the daemon's status string for the call.
    async fn stop_torrent(&self, id: i64) -> Result<String>;

    async fn start_torrent(&self, id: i64) -> Result<String>;

    async fn verify_torrent(&self, id: i64) -> Result<String>;

    /// Remove a torrent, optionally with its downloaded data. Returns the
    /// name of the removed torrent.
    async fn delete_torrent(&self, id: i64, delete_data: bool) -> Result<String>;

    /// Fails with `Error::NotFound` when no torrent has this id.
    async fn get_torrent(&self, id: i64) -> Result<Torrent>;

    /// Add a `.torrent` URL or magnet link.
    async fn add_by_url(&self, url: &str) -> Result<AddedTorrent>;

    async fn version(&self) -> Result<String>;

    /// All torrents, in the current sort order.
    async fn list_torrents(&self) -> Result<Vec<Torrent>>;

    /// Change the order used by `list_torrents`.
    fn set_sort(&mut self, spec: SortSpec);
}
