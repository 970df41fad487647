//! Manual item registration: a new SKU whose whole count is booked as an
//! opening receipt.
//!
//! A registered item has never been through a commit, so its `last_count`
//! starts at zero and the opening entry is what records its stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stocktake_core::{ItemId, parse_adjustment, parse_numeric};
use stocktake_inventory::{InventoryItem, initial_layers};
use stocktake_ledger::{Attribution, LedgerEntry};

use crate::config::StocktakeConfig;

/// Raw form input for a manually added item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualItem {
    pub name: String,
    pub category: String,
    pub unit_cost: String,
    pub current_count: String,
    pub performed_by: String,
    /// Stored both as the item note and the entry notes.
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub item: InventoryItem,
    pub entry: LedgerEntry,
}

/// Length of the random tail on a registered item's id.
pub const ID_SUFFIX_LEN: usize = 6;

/// Fresh random tail for a registered item's id.
pub fn id_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(ID_SUFFIX_LEN);
    suffix
}

/// Build the item and its opening entry for SKU number `sku_number`.
///
/// The item id is `<sku>-<id_suffix>`.
pub fn register(
    form: &ManualItem,
    sku_number: u64,
    id_suffix: &str,
    config: &StocktakeConfig,
    at: DateTime<Utc>,
) -> Registration {
    let sku = config.sku.format(sku_number);
    let name = non_blank(&form.name).unwrap_or_else(|| format!("Manual Item {sku_number}"));
    let category = non_blank(&form.category).unwrap_or_else(|| config.default_category.clone());
    let unit_cost = parse_numeric(&form.unit_cost, 0.0).max(0.0);
    let count = parse_adjustment(&form.current_count);
    let note = form.notes.trim().to_string();

    let item = InventoryItem {
        id: ItemId::new(format!("{sku}-{id_suffix}")),
        sku,
        name,
        category,
        unit_cost,
        current_count: count,
        last_count: 0.0,
        cost_layers: initial_layers(count, unit_cost, Some(at)),
        draft_sold: String::new(),
        draft_received: String::new(),
        item_note: note.clone(),
        last_updated: Some(at),
    };

    let performed_by =
        non_blank(&form.performed_by).unwrap_or_else(|| config.manual_operator.clone());
    let entry = LedgerEntry::opening_balance(&item, at, &Attribution::new(performed_by, note), "");

    Registration { item, entry }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
