//! Stocktake commit: turn pending drafts into committed counts, layers and
//! ledger entries in one all-or-nothing pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stocktake_core::{DomainError, DomainResult, EPSILON};
use stocktake_inventory::InventoryItem;
use stocktake_ledger::{Attribution, Ledger, LedgerEntry};

use crate::config::StocktakeConfig;

/// Suffix on entry ids synthesised for never-counted items.
pub const NEW_ITEM_SUFFIX: &str = "-new";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub operator: String,
    #[serde(default)]
    pub notes: String,
    /// Shared by every entry and layer produced by this commit.
    pub at: DateTime<Utc>,
}

impl CommitRequest {
    pub fn new(operator: impl Into<String>, notes: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            operator: operator.into(),
            notes: notes.into(),
            at,
        }
    }

    fn attribution(&self) -> Attribution {
        Attribution::new(self.operator.trim(), self.notes.trim())
    }
}

/// Successor snapshot produced by a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StocktakeCommit {
    pub items: Vec<InventoryItem>,
    /// New entries, in item order; prepend as one batch.
    pub entries: Vec<LedgerEntry>,
    pub at: DateTime<Utc>,
}

impl StocktakeCommit {
    pub fn recorded_anything(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Run a commit over `items`.
///
/// Items without drafts still roll `last_count` forward. When the draft pass
/// records nothing, items that were never counted (`last_count == 0`) but
/// hold stock get an opening-balance entry read from the same snapshot,
/// unless `ledger` already books one for them.
///
/// Fails without producing anything when the operator is blank or an item's
/// tracked layers disagree with its count.
pub fn commit(
    items: &[InventoryItem],
    ledger: &Ledger,
    request: &CommitRequest,
    config: &StocktakeConfig,
) -> DomainResult<StocktakeCommit> {
    if request.operator.trim().is_empty() {
        return Err(DomainError::validation("operator identifier is required"));
    }
    if let Some(item) = items.iter().find(|item| !item.layers_consistent()) {
        return Err(DomainError::invariant(format!(
            "cost layers of {} do not add up to its count of {}",
            item.sku, item.current_count
        )));
    }
    let attribution = request.attribution();
    let at = request.at;

    let mut entries = Vec::new();
    let next_items: Vec<InventoryItem> = items
        .iter()
        .map(|item| {
            let (sold, received) = item.parsed_drafts();
            let movement = item.movement(sold, received, Some(at));
            if movement.is_oversell() {
                debug!(
                    sku = %item.sku,
                    oversold = movement.oversold,
                    "sold beyond tracked layers; excess valued at fallback cost"
                );
            }
            let entry =
                LedgerEntry::from_movement(item, sold, received, &movement, at, &attribution);
            let touched = entry.is_some();
            entries.extend(entry);

            InventoryItem {
                last_count: item.current_count,
                current_count: movement.total_quantity,
                cost_layers: movement.layers,
                draft_sold: String::new(),
                draft_received: String::new(),
                last_updated: if touched { Some(at) } else { item.last_updated },
                ..item.clone()
            }
        })
        .collect();

    if !entries.is_empty() {
        return Ok(StocktakeCommit {
            items: next_items,
            entries,
            at,
        });
    }

    let fallback = Attribution::new(
        attribution.performed_by.clone(),
        if attribution.notes.is_empty() {
            config.new_item_note.clone()
        } else {
            attribution.notes.clone()
        },
    );
    let entries: Vec<LedgerEntry> = items
        .iter()
        .filter(|item| item.last_count.abs() <= EPSILON && item.current_count > EPSILON)
        .filter(|item| !ledger.has_item(&item.id))
        .map(|item| LedgerEntry::opening_balance(item, at, &fallback, NEW_ITEM_SUFFIX))
        .collect();

    let items = if entries.is_empty() {
        next_items
    } else {
        next_items
            .into_iter()
            .map(|item| {
                if entries.iter().any(|e| e.item_id == item.id) {
                    InventoryItem {
                        last_updated: Some(at),
                        ..item
                    }
                } else {
                    item
                }
            })
            .collect()
    };

    Ok(StocktakeCommit { items, entries, at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use stocktake_core::ItemId;
    use stocktake_inventory::{CostLayer, DraftField, initial_layers, total_quantity};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap()
    }

    fn run(items: &[InventoryItem], operator: &str, notes: &str) -> DomainResult<StocktakeCommit> {
        let request = CommitRequest::new(operator, notes, at());
        commit(items, &Ledger::new(), &request, &StocktakeConfig::default())
    }

    fn item(sku: &str, count: f64, cost: f64) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(sku),
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category: "Bath".to_string(),
            unit_cost: cost,
            current_count: count,
            last_count: count,
            cost_layers: initial_layers(count, cost, None),
            draft_sold: String::new(),
            draft_received: String::new(),
            item_note: String::new(),
            last_updated: None,
        }
    }

    #[test]
    fn blank_operator_changes_nothing() {
        let items = vec![item("A", 10.0, 2.0).with_draft(DraftField::Sold, "4")];
        let err = run(&items, "   ", "weekly").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(items[0].draft_sold, "4");
        assert_eq!(items[0].current_count, 10.0);
    }

    #[test]
    fn drafts_become_counts_layers_and_entries() {
        let mut stocked = item("A", 20.0, 9.0);
        stocked.cost_layers = vec![
            CostLayer::new(10.0, 4.0, None),
            CostLayer::new(10.0, 6.0, None),
        ];
        let items = vec![
            stocked.with_draft(DraftField::Sold, "15"),
            item("B", 5.0, 1.0),
            item("C", 0.0, 7.0).with_draft(DraftField::Received, "20"),
        ];

        let result = run(&items, " sam ", "").unwrap();

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].sold_value, 70.0);
        assert_eq!(result.entries[0].performed_by, "sam");
        assert_eq!(result.entries[1].received_value, 140.0);

        let a = &result.items[0];
        assert_eq!((a.last_count, a.current_count), (20.0, 5.0));
        assert_eq!(a.cost_layers, vec![CostLayer::new(5.0, 6.0, None)]);
        assert!(a.draft_sold.is_empty());
        assert_eq!(a.last_updated, Some(at()));

        let b = &result.items[1];
        assert_eq!(b.last_count, 5.0);
        assert_eq!(b.last_updated, None);

        let c = &result.items[2];
        assert_eq!(c.cost_layers, vec![CostLayer::new(20.0, 7.0, Some(at()))]);
    }

    #[test]
    fn quantities_are_conserved_without_oversell() {
        let items = vec![
            item("A", 100.0, 5.0)
                .with_draft(DraftField::Sold, "30")
                .with_draft(DraftField::Received, "12.5"),
        ];
        let result = run(&items, "ops", "").unwrap();
        let next = &result.items[0];
        assert_eq!(next.current_count, 100.0 - 30.0 + 12.5);
        assert!((total_quantity(&next.cost_layers) - next.current_count).abs() <= EPSILON);
        assert_eq!(result.entries[0].delta, -17.5);
    }

    #[test]
    fn no_drafts_records_nothing() {
        let items = vec![item("A", 10.0, 2.0), item("B", 3.0, 1.0)];
        let result = run(&items, "ops", "").unwrap();
        assert!(!result.recorded_anything());
        assert!(result.items.iter().all(|i| i.last_updated.is_none()));
    }

    #[test]
    fn never_counted_items_get_opening_entries_when_no_drafts() {
        let mut fresh = item("N", 8.0, 2.5);
        fresh.last_count = 0.0;
        let items = vec![item("A", 10.0, 2.0), fresh];

        let result = run(&items, "ops", "").unwrap();

        assert_eq!(result.entries.len(), 1);
        let entry = &result.entries[0];
        assert_eq!(entry.id.as_str(), "N-2025-02-01T09:30:00.000Z-new");
        assert_eq!(entry.notes, "New item");
        assert_eq!(entry.previous_count, 0.0);
        assert_eq!(entry.value_impact, 20.0);
        assert_eq!(result.items[1].last_count, 8.0);
        assert_eq!(result.items[1].last_updated, Some(at()));
        assert_eq!(result.items[0].last_updated, None);
    }

    #[test]
    fn fallback_skips_items_whose_opening_entry_is_booked() {
        let mut registered = item("R", 50.0, 3.0);
        registered.last_count = 0.0;
        let mut unbooked = item("U", 4.0, 1.0);
        unbooked.last_count = 0.0;
        let items = vec![registered.clone(), unbooked];

        let opening = LedgerEntry::opening_balance(&registered, at(), &Attribution::default(), "");
        let ledger = Ledger::new().prepend(vec![opening]);
        let request = CommitRequest::new("ops", "", at());
        let result = commit(&items, &ledger, &request, &StocktakeConfig::default()).unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].sku, "U");
        assert_eq!(result.items[0].last_count, 50.0);
        assert_eq!(result.items[0].last_updated, None);
    }

    #[test]
    fn layers_out_of_step_with_count_abort_the_commit() {
        let mut drifted = item("D", 10.0, 2.0);
        drifted.cost_layers = vec![CostLayer::new(7.0, 2.0, None)];
        let items = vec![item("A", 5.0, 1.0).with_draft(DraftField::Sold, "1"), drifted];

        let err = run(&items, "ops", "").unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(msg) if msg.contains("of D ")));
    }

    #[test]
    fn fallback_is_skipped_when_drafts_recorded_entries() {
        let mut fresh = item("N", 8.0, 2.5);
        fresh.last_count = 0.0;
        let items = vec![item("A", 10.0, 2.0).with_draft(DraftField::Sold, "1"), fresh];

        let result = run(&items, "ops", "count").unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].sku, "A");
    }

    proptest! {
        /// Property: without oversell every committed count equals
        /// before - sold + received, and layers always back the new count.
        #[test]
        fn commit_conserves_quantities(
            drafts in prop::collection::vec((0.0f64..80.0, 0.0f64..80.0, 1.0f64..100.0), 1..6),
        ) {
            let items: Vec<InventoryItem> = drafts
                .iter()
                .enumerate()
                .map(|(i, (sold, received, count))| {
                    item(&format!("P{i}"), *count, 2.0)
                        .with_draft(DraftField::Sold, sold.to_string())
                        .with_draft(DraftField::Received, received.to_string())
                })
                .collect();

            let result = run(&items, "ops", "").unwrap();
            prop_assert!(result.entries.len() <= items.len());

            for (before, after) in items.iter().zip(&result.items) {
                let (sold, received) = before.parsed_drafts();
                prop_assert_eq!(after.last_count, before.current_count);
                prop_assert!(after.draft_sold.is_empty() && after.draft_received.is_empty());
                let layered = total_quantity(&after.cost_layers);
                prop_assert!((layered - after.current_count).abs() <= 1e-9);
                let expected = (before.current_count - sold).max(0.0) + received;
                prop_assert!((after.current_count - expected).abs() < 1e-6);
            }
        }
    }
}
