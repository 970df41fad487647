//! Movement statistics over a window of ledger entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stocktake_inventory::InventoryItem;

use crate::entry::LedgerEntry;

/// Flow totals for a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummary {
    /// Entries with any sold or received units.
    pub entries: usize,
    pub sold: f64,
    pub received: f64,
    pub value_out: f64,
    pub value_in: f64,
}

impl MovementSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, entry| {
            if entry.sold > 0.0 || entry.received > 0.0 {
                acc.entries += 1;
            }
            acc.sold += entry.sold;
            acc.received += entry.received;
            acc.value_out += entry.sold_value;
            acc.value_in += entry.received_value;
            acc
        })
    }

    pub fn net_units(&self) -> f64 {
        self.received - self.sold
    }

    pub fn net_value(&self) -> f64 {
        self.value_in - self.value_out
    }
}

/// Per-item flow totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverTotal {
    pub key: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub sold: f64,
    pub sold_value: f64,
    pub received: f64,
    pub received_value: f64,
}

impl MoverTotal {
    fn empty(key: String, sku: &str, name: &str, category: &str) -> Self {
        Self {
            key,
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            sold: 0.0,
            sold_value: 0.0,
            received: 0.0,
            received_value: 0.0,
        }
    }
}

/// Every current item plus any item only known from the entries, with the
/// entries' flows summed per item.
pub fn mover_totals<'a>(
    items: &[InventoryItem],
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> Vec<MoverTotal> {
    let mut totals: Vec<MoverTotal> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());

    for item in items {
        let key = item.id.to_string();
        index.insert(key.clone(), totals.len());
        totals.push(MoverTotal::empty(key, &item.sku, &item.name, &item.category));
    }

    for entry in entries {
        let key = entry.item_id.to_string();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            totals.push(MoverTotal::empty(key, &entry.sku, &entry.name, &entry.category));
            totals.len() - 1
        });
        let bucket = &mut totals[slot];
        bucket.sold += entry.sold;
        bucket.received += entry.received;
        bucket.sold_value += entry.sold_value;
        bucket.received_value += entry.received_value;
    }

    totals
}

/// Items with outflow, largest first.
pub fn top_outflow(movers: &[MoverTotal], limit: usize) -> Vec<MoverTotal> {
    let mut sorted: Vec<MoverTotal> = movers.iter().filter(|m| m.sold > 0.0).cloned().collect();
    sorted.sort_by(|a, b| b.sold.total_cmp(&a.sold));
    sorted.truncate(limit);
    sorted
}

/// Items with the least outflow, including those that did not move at all.
pub fn least_moved(movers: &[MoverTotal], limit: usize) -> Vec<MoverTotal> {
    let mut sorted = movers.to_vec();
    sorted.sort_by(|a, b| a.sold.total_cmp(&b.sold));
    sorted.truncate(limit);
    sorted
}
