//! Snapshot persistence: the JSON record of the previous run.
//!
//! A missing or unreadable snapshot is not an error for the run as a
//! whole — it just means there is no baseline, so everything looks new.
//! Writes go through a temp file and an atomic rename so the cache is
//! never left half-written.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::model::Snapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load the previous run's snapshot.
///
/// Missing file means a first run; unreadable or corrupt files are
/// warned about and treated the same way. Either way the caller gets an
/// empty baseline and the run proceeds.
pub async fn load(path: &Path) -> Snapshot {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No previous snapshot, starting fresh");
            return Snapshot::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable snapshot, treating as first run");
            return Snapshot::default();
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Corrupt snapshot, treating as first run");
            Snapshot::default()
        }
    }
}

/// Persist the snapshot atomically: write to a randomized temp file in
/// the same directory, sync, then rename over the destination.
pub fn store(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_vec_pretty(snapshot)?;

    // Randomized temp filename so a concurrent run cannot collide.
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    if let Err(e) = std::io::Write::write_all(&mut file, &content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = file.sync_all() {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    drop(file);

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), feeds = snapshot.feeds.len(), "Snapshot stored");
    Ok(())
}

/// Delete the snapshot file. Returns whether anything was removed.
pub fn clean(path: &Path) -> Result<bool, SnapshotError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
