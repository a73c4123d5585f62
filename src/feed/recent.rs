//! Bounded set of a feed's most-recently-updated entries.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::model::Entry;

/// Fixed-capacity, recency-descending collection of entries keyed by
/// identity.
///
/// The capacity bound is enforced here, not by callers: inserting into
/// a full set evicts whatever is least recent afterwards, which may be
/// the incoming entry itself. Entries with equal timestamps keep their
/// insertion order. Linear scans are fine at the capacities this tool
/// uses (ten or fewer entries per feed).
///
/// Serializes as a plain JSON array of entries to match the snapshot
/// shape. A deserialized set takes its length as capacity; snapshots
/// are read-only diff baselines and are never inserted into.
#[derive(Debug, Clone)]
pub struct RecentEntries {
    cap: usize,
    entries: Vec<Entry>,
}

impl RecentEntries {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: Vec::with_capacity(cap),
        }
    }

    /// Build a set by inserting each entry in turn. Test and snapshot
    /// construction helper; goes through the same upsert path as the
    /// parser.
    pub fn from_entries(cap: usize, entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut set = Self::new(cap);
        for entry in entries {
            set.insert_or_refresh(entry);
        }
        set
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.cap
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Most-recent-first iteration.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Upsert by identity.
    ///
    /// An already-present identity has its timestamp raised to the
    /// incoming one only when strictly newer, then moves forward to its
    /// new recency position; equal-or-older refreshes are no-ops. An
    /// absent identity is inserted at its recency position, after which
    /// anything past capacity is evicted.
    pub fn insert_or_refresh(&mut self, entry: Entry) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == entry.id) {
            if entry.updated > self.entries[pos].updated {
                self.entries[pos].updated = entry.updated;
                self.float_up(pos);
            }
            return;
        }

        // First slot strictly older than the incoming entry; ties stay
        // in insertion order.
        let at = self
            .entries
            .iter()
            .position(|e| e.updated < entry.updated)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
        self.entries.truncate(self.cap);
    }

    /// Restore recency order after the entry at `pos` got a newer
    /// timestamp. Only ever needs to move toward the front.
    fn float_up(&mut self, mut pos: usize) {
        while pos > 0 && self.entries[pos - 1].updated < self.entries[pos].updated {
            self.entries.swap(pos - 1, pos);
            pos -= 1;
        }
    }
}

impl Serialize for RecentEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecentEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = Vec::<Entry>::deserialize(deserializer)?;
        // Keep the recency invariant even for hand-edited cache files.
        entries.sort_by(|a, b| b.updated.cmp(&a.updated));
        Ok(Self {
            cap: entries.len(),
            entries,
        })
    }
}
