//! Torrent listing order.

use std::cmp::Ordering;
use std::fmt;

use super::types::Torrent;

/// Fields a torrent listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Age,
    Size,
    Progress,
    DownSpeed,
    UpSpeed,
    Download,
    Upload,
    Ratio,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Id,
        SortField::Name,
        SortField::Age,
        SortField::Size,
        SortField::Progress,
        SortField::DownSpeed,
        SortField::UpSpeed,
        SortField::Download,
        SortField::Upload,
        SortField::Ratio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Age => "age",
            SortField::Size => "size",
            SortField::Progress => "progress",
            SortField::DownSpeed => "downspeed",
            SortField::UpSpeed => "upspeed",
            SortField::Download => "download",
            SortField::Upload => "upload",
            SortField::Ratio => "ratio",
        }
    }

    /// Exact, case-insensitive lookup by field name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }

    fn compare(self, a: &Torrent, b: &Torrent) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            // youngest first
            SortField::Age => b.added_date.cmp(&a.added_date),
            SortField::Size => a.size_when_done.cmp(&b.size_when_done),
            SortField::Progress => a.percent_done.total_cmp(&b.percent_done),
            SortField::DownSpeed => a.rate_download.cmp(&b.rate_download),
            SortField::UpSpeed => a.rate_upload.cmp(&b.rate_upload),
            SortField::Download => a.downloaded_ever.cmp(&b.downloaded_ever),
            SortField::Upload => a.uploaded_ever.cmp(&b.uploaded_ever),
            SortField::Ratio => a.upload_ratio.total_cmp(&b.upload_ratio),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub reversed: bool,
}

impl SortSpec {
    pub fn new(field: SortField, reversed: bool) -> Self {
        Self { field, reversed }
    }

    /// Resolve a user supplied field name. Unknown names yield `None`.
    pub fn resolve(field: &str, reversed: bool) -> Option<Self> {
        SortField::parse(field).map(|field| Self::new(field, reversed))
    }

    pub fn compare(&self, a: &Torrent, b: &Torrent) -> Ordering {
        let ord = self.field.compare(a, b);
        if self.reversed {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Stable sort, ties keep daemon order.
    pub fn apply(&self, torrents: &mut [Torrent]) {
        torrents.sort_by(|a, b| self.compare(a, b));
    }
}
