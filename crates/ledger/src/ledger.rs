use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::ItemId;

use crate::entry::LedgerEntry;

/// Append-only movement history, most recent first.
///
/// There is no way to reach an entry mutably; a ledger only ever grows by
/// building a successor with [`Ledger::prepend`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries that are already ordered most recent first.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Successor ledger with `batch` in front of the existing entries.
    pub fn prepend(&self, batch: Vec<LedgerEntry>) -> Self {
        let mut entries = batch;
        entries.extend(self.entries.iter().cloned());
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry has been booked against `item_id`.
    pub fn has_item(&self, item_id: &ItemId) -> bool {
        self.entries.iter().any(|e| &e.item_id == item_id)
    }

    /// Newest timestamp across all entries.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().filter_map(|e| e.timestamp).max()
    }

    /// Entries dated within `window_days` of `now`.
    ///
    /// Entries without a timestamp never qualify.
    pub fn recent(&self, now: DateTime<Utc>, window_days: u32) -> Vec<&LedgerEntry> {
        let threshold = now - Duration::days(i64::from(window_days));
        self.entries
            .iter()
            .filter(|e| e.timestamp.is_some_and(|t| t >= threshold))
            .collect()
    }

    /// Entries matching a free-text query and an optional category.
    pub fn filter(&self, query: &str, category: Option<&str>) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.matches(query, category))
            .collect()
    }

    /// Distinct entry categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !entry.category.is_empty() && !seen.contains(&entry.category) {
                seen.push(entry.category.clone());
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerEntry;
    type IntoIter = core::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Totals over a (possibly filtered) set of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub adjustments: usize,
    pub sold: f64,
    pub received: f64,
    pub units: f64,
    pub value: f64,
    pub latest: Option<DateTime<Utc>>,
}

impl LedgerSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, entry| {
            acc.adjustments += 1;
            acc.sold += entry.sold;
            acc.received += entry.received;
            acc.units += entry.delta;
            acc.value += entry.value_impact;
            acc.latest = acc.latest.max(entry.timestamp);
            acc
        })
    }
}
