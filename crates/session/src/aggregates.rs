//! Derived views over the current snapshot.
//!
//! Everything here is a pure function recomputed on demand; previews never
//! write back into item layers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_inventory::InventoryItem;
use stocktake_ledger::{Ledger, LedgerEntry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_skus: usize,
    pub total_current: f64,
    pub total_last: f64,
    pub total_delta: f64,
    /// On-hand value at layer cost.
    pub total_value: f64,
}

pub fn totals(items: &[InventoryItem]) -> Totals {
    let total_current: f64 = items.iter().map(|i| i.current_count).sum();
    let total_last: f64 = items.iter().map(|i| i.last_count).sum();
    Totals {
        total_skus: items.len(),
        total_current,
        total_last,
        total_delta: total_current - total_last,
        total_value: items.iter().map(InventoryItem::layer_value).sum(),
    }
}

/// Pending (uncommitted) adjustments across the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub items: usize,
    pub sold: f64,
    pub received: f64,
    /// Previewed received value minus sold value.
    pub value: f64,
}

impl DraftSummary {
    pub fn net_units(&self) -> f64 {
        self.received - self.sold
    }
}

pub fn draft_summary(items: &[InventoryItem]) -> DraftSummary {
    items
        .iter()
        .filter(|item| item.has_draft())
        .fold(DraftSummary::default(), |mut acc, item| {
            let (sold, received) = item.parsed_drafts();
            let preview = item.preview_drafts();
            acc.items += 1;
            acc.sold += sold;
            acc.received += received;
            acc.value += preview.value_impact();
            acc
        })
}

/// Ledger entries inside the movement window ending at `now`.
pub fn recent_movements(
    ledger: &Ledger,
    now: DateTime<Utc>,
    window_days: u32,
) -> Vec<&LedgerEntry> {
    ledger.recent(now, window_days)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub units: f64,
    pub value: f64,
    /// Fraction of total value, 0 when the collection holds no value.
    pub value_share: f64,
}

/// Units and layer value per category, most valuable first.
pub fn category_breakdown(items: &[InventoryItem], default_category: &str) -> Vec<CategoryShare> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, (f64, f64)> = HashMap::new();

    for item in items {
        let key = if item.category.is_empty() {
            default_category.to_string()
        } else {
            item.category.clone()
        };
        let bucket = buckets.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0.0, 0.0)
        });
        bucket.0 += item.current_count;
        bucket.1 += item.layer_value();
    }

    let total_value: f64 = buckets.values().map(|(_, value)| value).sum();
    let mut shares: Vec<CategoryShare> = order
        .into_iter()
        .map(|category| {
            let (units, value) = buckets[&category];
            CategoryShare {
                category,
                units,
                value,
                value_share: if total_value != 0.0 { value / total_value } else { 0.0 },
            }
        })
        .collect();
    shares.sort_by(|a, b| b.value.total_cmp(&a.value));
    shares
}
