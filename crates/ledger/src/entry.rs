use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{EPSILON, Entity, EntryId, ItemId, is_negligible};
use stocktake_inventory::{CostMovement, InventoryItem};

/// Who performed a movement and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub performed_by: String,
    pub notes: String,
}

impl Attribution {
    pub fn new(performed_by: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            performed_by: performed_by.into(),
            notes: notes.into(),
        }
    }
}

/// One item's quantity and value change in a stocktake round (immutable).
///
/// Entries are only ever created here and appended to a [`crate::Ledger`],
/// which hands out shared references only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: EntryId,
    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub previous_count: f64,
    pub new_count: f64,
    pub sold: f64,
    pub received: f64,
    pub delta: f64,
    pub unit_cost: f64,
    pub sold_value: f64,
    pub received_value: f64,
    pub sold_unit_cost: f64,
    pub received_unit_cost: f64,
    pub value_impact: f64,
    pub performed_by: String,
    pub notes: String,
    #[serde(default)]
    pub item_note: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Entity for LedgerEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `<item>-<rfc3339 timestamp>[suffix]`, unique per item per commit.
pub fn entry_id(item_id: &ItemId, at: DateTime<Utc>, suffix: &str) -> EntryId {
    EntryId::new(format!(
        "{item_id}-{}{suffix}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ))
}

impl LedgerEntry {
    /// Record a committed movement, or `None` when nothing moved.
    ///
    /// The entry's `unit_cost` is the value impact per unit of net change;
    /// when the count is unchanged it falls back to the received cost, then
    /// the sold cost, then the item's reference cost.
    pub fn from_movement(
        item: &InventoryItem,
        sold: f64,
        received: f64,
        movement: &CostMovement,
        at: DateTime<Utc>,
        attribution: &Attribution,
    ) -> Option<Self> {
        let delta = movement.total_quantity - item.current_count;
        if is_negligible(delta) && is_negligible(sold) && is_negligible(received) {
            return None;
        }

        let value_impact = movement.value_impact();
        let unit_cost = if !is_negligible(delta) {
            value_impact / delta
        } else if movement.received_unit_cost > EPSILON {
            movement.received_unit_cost
        } else if movement.sold_unit_cost > EPSILON {
            movement.sold_unit_cost
        } else {
            item.unit_cost
        };

        Some(Self {
            id: entry_id(&item.id, at, ""),
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            previous_count: item.current_count,
            new_count: movement.total_quantity,
            sold,
            received,
            delta,
            unit_cost,
            sold_value: movement.sold_value,
            received_value: movement.received_value,
            sold_unit_cost: movement.sold_unit_cost,
            received_unit_cost: movement.received_unit_cost,
            value_impact,
            performed_by: attribution.performed_by.clone(),
            notes: attribution.notes.clone(),
            item_note: item.item_note.clone(),
            timestamp: Some(at),
        })
    }

    /// Treat an item's whole current count as received at its reference cost.
    ///
    /// Used for manual registrations and for items that entered the
    /// collection without ever passing through a commit.
    pub fn opening_balance(
        item: &InventoryItem,
        at: DateTime<Utc>,
        attribution: &Attribution,
        id_suffix: &str,
    ) -> Self {
        let count = item.current_count;
        let value = count * item.unit_cost;
        Self {
            id: entry_id(&item.id, at, id_suffix),
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            previous_count: 0.0,
            new_count: count,
            sold: 0.0,
            received: count,
            delta: count,
            unit_cost: item.unit_cost,
            sold_value: 0.0,
            received_value: value,
            sold_unit_cost: 0.0,
            received_unit_cost: item.unit_cost,
            value_impact: value,
            performed_by: attribution.performed_by.clone(),
            notes: attribution.notes.clone(),
            item_note: item.item_note.clone(),
            timestamp: Some(at),
        }
    }

    /// Case-insensitive match on name, SKU or operator plus an optional category.
    pub fn matches(&self, query: &str, category: Option<&str>) -> bool {
        let query = query.trim().to_lowercase();
        let matches_query = query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.sku.to_lowercase().contains(&query)
            || self.performed_by.to_lowercase().contains(&query);
        let matches_category = category.is_none_or(|c| self.category == c);
        matches_query && matches_category
    }
}
