//! Transmission daemon client.

pub mod client;
pub mod daemon;
pub mod sort;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::TransmissionClient;
pub use daemon::TorrentDaemon;
pub use sort::{SortField, SortSpec};
pub use types::{AddedTorrent, Torrent, TorrentStatus};
