//! feedping — new-post notifier for a blogroll of RSS/Atom feeds.
//!
//! The pipeline each run: read the blogroll, fetch every feed, stream-
//! parse each document into a bounded set of its most-recent entries,
//! diff against the previous run's snapshot, notify about anything new,
//! and persist the fresh snapshot as the next baseline.

pub mod config;
pub mod diff;
pub mod feed;
pub mod model;
pub mod notify;
pub mod storage;
pub mod util;
