//! Thin persistence collaborators: the blogroll file and the snapshot
//! cache.

pub mod blogroll;
pub mod snapshot;

pub use blogroll::BlogrollError;
pub use snapshot::SnapshotError;
