//! Change detection between the previous snapshot and freshly parsed
//! feeds.

use crate::model::{Entry, Feed, Snapshot};

/// New entries detected for one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    pub title: String,
    pub url: String,
    pub entries: Vec<Entry>,
}

/// Everything new since the previous run, in blogroll order.
///
/// `new_posts` counts per entry for feeds absent from the snapshot and
/// once per feed for known feeds with changes. The asymmetry is
/// long-standing observed behavior; the formatting layer only uses it
/// for the summary line.
#[derive(Debug, Default)]
pub struct Report {
    pub updates: Vec<FeedUpdate>,
    pub new_posts: usize,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Short notification summary, e.g. `3 new posts`.
    pub fn summary(&self) -> String {
        if self.new_posts == 1 {
            "1 new post".to_string()
        } else {
            format!("{} new posts", self.new_posts)
        }
    }

    /// Notification body: blank-line-separated blocks, each a
    /// `[feed title]` header followed by one line per new entry title.
    pub fn body(&self) -> String {
        let blocks: Vec<String> = self
            .updates
            .iter()
            .map(|update| {
                let mut block = format!("[{}]", update.title);
                for entry in &update.entries {
                    block.push('\n');
                    block.push_str(&entry.title);
                }
                block
            })
            .collect();
        blocks.join("\n\n")
    }
}

/// Compare freshly parsed feeds against the previous snapshot.
///
/// A feed whose identity the snapshot has never seen is new wholesale:
/// every retained entry is included verbatim. For a known feed, an
/// entry is new iff its identity is absent from the snapshot's retained
/// set or present with a strictly older timestamp — equal-or-older
/// means already seen. The retained sets are bounded, so an entry that
/// aged out of the snapshot between runs is simply forgotten rather
/// than re-reported as new only if it also aged out of the current
/// fetch; that tolerance is inherent to comparing two top-N windows.
pub fn diff(previous: &Snapshot, current: &[Feed]) -> Report {
    let mut report = Report::default();

    for remote in current {
        match previous.feed_by_id(&remote.id) {
            Some(local) => {
                let new_entries: Vec<Entry> = remote
                    .entries
                    .iter()
                    .filter(|entry| !already_seen(local, entry))
                    .cloned()
                    .collect();

                if !new_entries.is_empty() {
                    report.updates.push(FeedUpdate {
                        title: remote.title.clone(),
                        url: remote.url.clone(),
                        entries: new_entries,
                    });
                    report.new_posts += 1;
                }
            }
            None => {
                // Whole feed is new. A feed that fetched or parsed to
                // nothing has nothing to report and would only produce
                // an empty notification block.
                if remote.entries.is_empty() {
                    continue;
                }
                report.new_posts += remote.entries.len();
                report.updates.push(FeedUpdate {
                    title: remote.title.clone(),
                    url: remote.url.clone(),
                    entries: remote.entries.iter().cloned().collect(),
                });
            }
        }
    }

    report
}

fn already_seen(local: &Feed, entry: &Entry) -> bool {
    local
        .entries
        .get(&entry.id)
        .is_some_and(|known| entry.updated <= known.updated)
}
