// Common data models for the downloader

use std::fmt;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::errors::DownloadError;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.]{1,24}$").unwrap();
    static ref HASHTAG_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{1,64}$").unwrap();
}

/// One video as reported by the metadata source. Immutable after fetch;
/// the direct media URL is produced later by the resolver and never
/// stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: String,
    /// Owning account's unique id (no leading @)
    pub author: String,
    pub view_count: u64,
    /// Publish time; None when the source omitted it
    pub created_at: Option<OffsetDateTime>,
}

impl VideoRecord {
    /// Public page URL, the form the converter accepts
    pub fn share_url(&self) -> String {
        format!("https://www.tiktok.com/@{}/video/{}", self.author, self.id)
    }

    /// Publish date as YYYY-MM-DD, or "N/A"
    pub fn publish_date(&self) -> String {
        let fmt = format_description!("[year]-[month]-[day]");
        self.created_at
            .and_then(|t| t.format(&fmt).ok())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Scope of a fetch: one account or one hashtag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    User(String),
    Hashtag(String),
}

impl Subject {
    /// Build from raw input, stripping a leading `@`
    pub fn user(raw: &str) -> Result<Self, DownloadError> {
        let name = raw.trim().trim_start_matches('@');
        if USERNAME_RE.is_match(name) {
            Ok(Self::User(name.to_string()))
        } else {
            Err(DownloadError::InvalidSubject(format!("username '{}'", raw.trim())))
        }
    }

    /// Build from raw input, stripping a leading `#`
    pub fn hashtag(raw: &str) -> Result<Self, DownloadError> {
        let name = raw.trim().trim_start_matches('#');
        if HASHTAG_RE.is_match(name) {
            Ok(Self::Hashtag(name.to_string()))
        } else {
            Err(DownloadError::InvalidSubject(format!("hashtag '{}'", raw.trim())))
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::User(v) | Self::Hashtag(v) => v,
        }
    }

    /// Folder name under the base download directory
    pub fn dir_label(&self) -> String {
        match self {
            Self::User(v) => v.clone(),
            Self::Hashtag(v) => format!("tag_{}", v),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(v) => write!(f, "@{}", v),
            Self::Hashtag(v) => write!(f, "#{}", v),
        }
    }
}

/// Total order applied to the fetched window before truncation.
/// Ties break stably on fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortSpec {
    #[default]
    Recent,
    MostViewed,
    Oldest,
    OriginalOrder,
}

impl SortSpec {
    /// Whether this sort needs a window larger than the requested count
    /// to be meaningful
    pub fn needs_window(&self) -> bool {
        matches!(self, Self::MostViewed | Self::Oldest)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recent => write!(f, "most recent"),
            Self::MostViewed => write!(f, "most viewed"),
            Self::Oldest => write!(f, "oldest"),
            Self::OriginalOrder => write!(f, "original order"),
        }
    }
}

/// Hard stop for `FetchWindow::All`: the API pages at ~33 records, a
/// cursor that never reports completion must still terminate.
pub const MAX_FETCH_WINDOW: usize = 5000;

/// Bound on how many records are pulled from the metadata source before
/// sorting and truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    Limited(usize),
    All,
}

impl FetchWindow {
    pub fn cap(&self) -> usize {
        match self {
            Self::Limited(n) => (*n).min(MAX_FETCH_WINDOW),
            Self::All => MAX_FETCH_WINDOW,
        }
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "recent {}", n),
            Self::All => write!(f, "ALL"),
        }
    }
}

/// Account statistics shown before a username download
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub video_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    pub heart_count: u64,
}

/// Compact count display: 1_500_000 -> "1.5M", 2_300 -> "2.3K"
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Terminal state of one download task
#[derive(Debug)]
pub enum DownloadOutcome {
    Completed(PathBuf),
    Skipped(PathBuf),
    Failed(DownloadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_strips_at_and_validates() {
        let s = Subject::user("@alice.b_99").unwrap();
        assert_eq!(s, Subject::User("alice.b_99".to_string()));
        assert_eq!(s.to_string(), "@alice.b_99");
    }

    #[test]
    fn hashtag_strips_hash_and_validates() {
        let s = Subject::hashtag("#dance_2024").unwrap();
        assert_eq!(s.value(), "dance_2024");
        assert_eq!(s.dir_label(), "tag_dance_2024");
    }

    #[test]
    fn rejects_subject_with_path_characters() {
        assert!(Subject::user("../etc").is_err());
        assert!(Subject::hashtag("a b").is_err());
    }

    #[test]
    fn share_url_embeds_author_and_id() {
        let rec = VideoRecord {
            id: "7123".to_string(),
            author: "alice".to_string(),
            view_count: 0,
            created_at: None,
        };
        assert_eq!(rec.share_url(), "https://www.tiktok.com/@alice/video/7123");
        assert_eq!(rec.publish_date(), "N/A");
    }

    #[test]
    fn publish_date_formats_unix_time() {
        let rec = VideoRecord {
            id: "1".to_string(),
            author: "a".to_string(),
            view_count: 0,
            created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).ok(),
        };
        assert_eq!(rec.publish_date(), "2023-11-14");
    }

    #[test]
    fn count_formatting_uses_suffixes() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(2_300), "2.3K");
        assert_eq!(format_count(1_500_000), "1.5M");
    }

    #[test]
    fn window_all_is_capped() {
        assert_eq!(FetchWindow::All.cap(), MAX_FETCH_WINDOW);
        assert_eq!(FetchWindow::Limited(50).cap(), 50);
        assert_eq!(FetchWindow::Limited(9_999_999).cap(), MAX_FETCH_WINDOW);
    }
}
