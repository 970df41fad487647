use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{EPSILON, Entity, ItemId, finite_or, parse_adjustment};

use crate::layer::{CostLayer, initial_layers, total_quantity, total_value, weighted_unit_cost};
use crate::movement::{CostMovement, MovementRequest, compute_movement};

/// Which uncommitted draft field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Sold,
    Received,
}

/// One SKU in the loaded collection.
///
/// Snapshots are replaced wholesale; nothing mutates an item that is visible
/// outside the operation building its successor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub category: String,
    /// Reference price: prices receipts and backs items without layers.
    pub unit_cost: f64,
    pub current_count: f64,
    /// Count as of the previous commit.
    pub last_count: f64,
    #[serde(default)]
    pub cost_layers: Vec<CostLayer>,
    #[serde(default)]
    pub draft_sold: String,
    #[serde(default)]
    pub draft_received: String,
    #[serde(default)]
    pub item_note: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl InventoryItem {
    /// Layers used for valuation.
    ///
    /// An item carrying no layers but a positive count is treated as a single
    /// synthetic layer at its reference cost.
    pub fn effective_layers(&self) -> Vec<CostLayer> {
        if self.cost_layers.is_empty() {
            initial_layers(self.current_count, self.unit_cost, self.last_updated)
        } else {
            self.cost_layers.clone()
        }
    }

    /// On-hand value at layer cost.
    pub fn layer_value(&self) -> f64 {
        total_value(&self.effective_layers())
    }

    /// Value-weighted cost of remaining layers, falling back to the reference
    /// cost when nothing is on hand.
    pub fn average_cost(&self) -> f64 {
        weighted_unit_cost(&self.effective_layers()).unwrap_or(self.unit_cost)
    }

    /// Parsed `(sold, received)` drafts; blank or invalid text reads as 0.
    pub fn parsed_drafts(&self) -> (f64, f64) {
        (parse_adjustment(&self.draft_sold), parse_adjustment(&self.draft_received))
    }

    pub fn has_draft(&self) -> bool {
        let (sold, received) = self.parsed_drafts();
        sold > 0.0 || received > 0.0
    }

    /// Movement for explicit quantities against this item's layers.
    pub fn movement(
        &self,
        sold: f64,
        received: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> CostMovement {
        let layers = self.effective_layers();
        compute_movement(&MovementRequest {
            layers: &layers,
            sold,
            received,
            unit_cost: finite_or(self.unit_cost, 0.0),
            timestamp,
        })
    }

    /// Read-only preview of the current drafts.
    pub fn preview_drafts(&self) -> CostMovement {
        let (sold, received) = self.parsed_drafts();
        self.movement(sold, received, None)
    }

    /// Whether tracked layers agree with the recorded count.
    pub fn layers_consistent(&self) -> bool {
        self.cost_layers.is_empty()
            || (total_quantity(&self.cost_layers) - self.current_count).abs() <= EPSILON
    }

    /// Copy with a draft field replaced.
    pub fn with_draft(&self, field: DraftField, raw: impl Into<String>) -> Self {
        let mut next = self.clone();
        match field {
            DraftField::Sold => next.draft_sold = raw.into(),
            DraftField::Received => next.draft_received = raw.into(),
        }
        next
    }

    /// Copy with both drafts cleared.
    pub fn with_drafts_cleared(&self) -> Self {
        Self {
            draft_sold: String::new(),
            draft_received: String::new(),
            ..self.clone()
        }
    }

    /// Case-insensitive match on name or SKU plus an optional category.
    pub fn matches(&self, query: &str, category: Option<&str>) -> bool {
        let query = query.trim().to_lowercase();
        let matches_query = query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.sku.to_lowercase().contains(&query);
        let matches_category = category.is_none_or(|c| self.category == c);
        matches_query && matches_category
    }
}

/// Distinct categories in first-seen order, blanks skipped.
pub fn categories(items: &[InventoryItem]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !item.category.is_empty() && !seen.contains(&item.category) {
            seen.push(item.category.clone());
        }
    }
    seen
}
