//! Core data model: feeds, entries, and the persisted snapshot.
//!
//! The snapshot JSON shape is an external contract shared with previous
//! versions of the cache file:
//!
//! ```json
//! { "fetched": 1700000000, "feeds": [
//!   { "url": "...", "title": "...", "id": "...",
//!     "entries": [ {"id": "...", "title": "...", "updated": 1700000000} ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::feed::RecentEntries;

/// Which syndication dialect a feed document uses.
///
/// Determined from the document root while parsing (`<rss>` vs `<feed>`)
/// and used to select the timestamp format for entry dates. Not part of
/// the snapshot shape, so it is skipped during (de)serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedKind {
    #[default]
    Rss,
    Atom,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::Rss => write!(f, "rss"),
            FeedKind::Atom => write!(f, "atom"),
        }
    }
}

/// One post within a feed.
///
/// `id` is feed-local and non-empty after a successful parse (a hash
/// fallback covers documents that omit guid/id). A missing timestamp
/// stays 0, which sorts behind every dated entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub updated: i64,
}

impl Entry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, updated: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            updated,
        }
    }
}

/// One tracked syndication source and its retained entries.
///
/// Created once per blogroll line and fully repopulated each fetch
/// cycle; merging against history is the change detector's job, not the
/// feed's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub url: String,
    pub title: String,
    /// Feed-level identity: Atom `<id>`, RSS channel `<link>`, falling
    /// back to the blogroll URL when the document provides neither.
    pub id: String,
    #[serde(skip)]
    pub kind: FeedKind,
    pub entries: RecentEntries,
}

impl Feed {
    /// A fresh feed seeded from a blogroll URL, retaining at most
    /// `cap` entries.
    pub fn new(url: impl Into<String>, cap: usize) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            url,
            title: String::new(),
            kind: FeedKind::default(),
            entries: RecentEntries::new(cap),
        }
    }
}

/// Persisted record of the previous run: every feed's retained entries
/// plus the fetch timestamp. Read once at run start, wholly replaced at
/// run end. Entries that aged out of the bounded sets between runs are
/// silently forgotten by design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub fetched: i64,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

impl Snapshot {
    pub fn feed_by_id(&self, id: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id == id)
    }
}
