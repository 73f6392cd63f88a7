//! Torrent data as reported by the daemon.

use serde::Deserialize;

/// Fields requested from `torrent-get`.
pub(crate) const TORRENT_FIELDS: &[&str] = &[
    "id",
    "name",
    "status",
    "percentDone",
    "rateDownload",
    "rateUpload",
    "sizeWhenDone",
    "addedDate",
    "downloadedEver",
    "uploadedEver",
    "uploadRatio",
];

/// A torrent known to the daemon.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    pub id: i64,
    pub name: String,
    pub status: i64,
    pub percent_done: f64,
    pub rate_download: i64,
    pub rate_upload: i64,
    pub size_when_done: i64,
    /// Unix timestamp.
    pub added_date: i64,
    pub downloaded_ever: i64,
    pub uploaded_ever: i64,
    pub upload_ratio: f64,
}

impl Torrent {
    pub fn state(&self) -> TorrentStatus {
        TorrentStatus::from_code(self.status)
    }
}

/// Result of adding a torrent. An empty name means the daemon did not
/// accept it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddedTorrent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Transmission's numeric torrent status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentStatus {
    Stopped,
    CheckWait,
    Checking,
    DownloadWait,
    Downloading,
    SeedWait,
    Seeding,
    Unknown,
}

impl TorrentStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TorrentStatus::Stopped,
            1 => TorrentStatus::CheckWait,
            2 => TorrentStatus::Checking,
            3 => TorrentStatus::DownloadWait,
            4 => TorrentStatus::Downloading,
            5 => TorrentStatus::SeedWait,
            6 => TorrentStatus::Seeding,
            _ => TorrentStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TorrentStatus::Stopped => "stopped",
            TorrentStatus::CheckWait => "queued to verify",
            TorrentStatus::Checking => "verifying",
            TorrentStatus::DownloadWait => "queued to download",
            TorrentStatus::Downloading => "downloading",
            TorrentStatus::SeedWait => "queued to seed",
            TorrentStatus::Seeding => "seeding",
            TorrentStatus::Unknown => "unknown",
        }
    }
}

/// Format a byte count with binary units, e.g. `1.5 MiB`.
pub fn humanize_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes.max(0))
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
