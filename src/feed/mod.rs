//! Feed ingestion: streaming RSS/Atom parsing, bounded retention, and
//! document fetching.
//!
//! - [`parser`] - single-pass state-machine parser over raw XML
//! - [`recent`] - per-feed bounded set of most-recent entries
//! - [`fetcher`] - concurrent HTTP retrieval of raw documents

mod fetcher;
mod parser;
mod recent;

pub use fetcher::{client, fetch_all, fetch_one, FetchError, USER_AGENT};
pub use parser::{parse_into, ParseError, ParseReport};
pub use recent::RecentEntries;
