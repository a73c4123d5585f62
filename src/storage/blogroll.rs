//! The blogroll: one feed URL per line.

use std::path::Path;
use thiserror::Error;

use crate::util::validate_url;

#[derive(Debug, Error)]
pub enum BlogrollError {
    #[error("Failed to read blogroll file: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the blogroll and return its feed URLs in file order.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Lines
/// that fail URL validation are warned about and skipped rather than
/// poisoning the run.
pub async fn read(path: &Path) -> Result<Vec<String>, BlogrollError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(parse_lines(&raw))
}

fn parse_lines(raw: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match validate_url(trimmed) {
            Ok(_) => urls.push(trimmed.to_string()),
            Err(e) => {
                tracing::warn!(line = %trimmed, error = %e, "Skipping invalid blogroll entry");
            }
        }
    }
    urls
}
