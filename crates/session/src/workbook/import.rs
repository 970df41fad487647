//! Normalise codec output into items, ledger and metadata.
//!
//! Structural problems (no sheet, missing required columns) abort before a
//! single row is read. Malformed cells degrade to 0 / `None`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{EPSILON, EntryId, ItemId};
use stocktake_inventory::{InventoryItem, initial_layers, next_sku_number};
use stocktake_ledger::{Ledger, LedgerEntry, entry_id};

use crate::config::StocktakeConfig;
use crate::metadata::Metadata;
use crate::workbook::{
    COL_CATEGORY, COL_COUNT, COL_DELTA, COL_ITEM, COL_ITEM_NOTE, COL_LAST_COUNT, COL_LAST_UPDATED,
    COL_NEW_COUNT, COL_NOTE, COL_NOTES, COL_PERFORMED_BY, COL_PREVIOUS_COUNT, COL_RECEIVED,
    COL_RECEIVED_VALUE, COL_SKU, COL_SOLD, COL_SOLD_VALUE, COL_TIMESTAMP, COL_UNIT_COST,
    COL_VALUE_CHANGE, RawRow, REQUIRED_COLUMNS, Sheet, WorkbookError,
};

/// What the codec hands over after reading a workbook file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookImport {
    pub source_file_name: String,
    /// First sheet holds items; an optional sheet named like the configured
    /// ledger sheet holds prior movements.
    pub sheets: Vec<Sheet>,
    pub imported_at: DateTime<Utc>,
}

/// Fully normalised import, ready to replace session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedInventory {
    pub items: Vec<InventoryItem>,
    pub ledger: Ledger,
    pub metadata: Metadata,
}

pub fn import_workbook(
    workbook: &WorkbookImport,
    config: &StocktakeConfig,
) -> Result<ImportedInventory, WorkbookError> {
    let (item_sheet, rest) = workbook.sheets.split_first().ok_or(WorkbookError::NoSheet)?;

    let missing = item_sheet.missing_headers(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(WorkbookError::MissingColumns(missing));
    }

    let items = normalise_items(&item_sheet.records(), workbook.imported_at, config);

    let movement_rows = rest
        .iter()
        .find(|s| s.name.trim().eq_ignore_ascii_case(&config.ledger_sheet_name))
        .map(Sheet::records)
        .unwrap_or_default();
    let ledger = Ledger::from_entries(normalise_movements(&movement_rows, &items));

    let metadata = Metadata {
        source_file_name: workbook.source_file_name.clone(),
        last_imported_at: Some(workbook.imported_at),
        last_stocktake_at: ledger.latest_timestamp(),
        sheet_name: Some(item_sheet.name.clone()),
        next_sku_number: next_sku_number(&items, 1),
    };

    Ok(ImportedInventory {
        items,
        ledger,
        metadata,
    })
}

fn normalise_items(
    rows: &[RawRow],
    imported_at: DateTime<Utc>,
    config: &StocktakeConfig,
) -> Vec<InventoryItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let position = index + 1;
            let sku = row.text(COL_SKU);
            let name = Some(row.text(COL_ITEM))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Item {position}"));
            let category = Some(row.text(COL_CATEGORY))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| config.default_category.clone());

            let base = if !sku.is_empty() {
                sku.clone()
            } else if !name.is_empty() {
                name.clone()
            } else {
                format!("row-{position}")
            };
            let id = unique_id(&base, &mut seen);

            let current_count = row.number(COL_COUNT, 0.0);
            let last_count = row.number_opt(COL_LAST_COUNT).unwrap_or(current_count);
            let unit_cost = row.number(COL_UNIT_COST, 0.0).max(0.0);
            let last_updated = row.datetime(COL_LAST_UPDATED);
            let layer_time = last_updated.or(Some(imported_at));

            InventoryItem {
                id: ItemId::new(id),
                sku,
                name,
                category,
                unit_cost,
                current_count,
                last_count,
                cost_layers: initial_layers(current_count, unit_cost, layer_time),
                draft_sold: String::new(),
                draft_received: String::new(),
                item_note: row.text(COL_NOTE),
                last_updated,
            }
        })
        .collect()
}

/// `base`, or `base-1`, `base-2`… when already taken.
fn unique_id(base: &str, seen: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 1;
    while seen.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    seen.insert(candidate.clone());
    candidate
}

fn normalise_movements(rows: &[RawRow], items: &[InventoryItem]) -> Vec<LedgerEntry> {
    let by_sku: HashMap<&str, &InventoryItem> = items
        .iter()
        .rev()
        .filter(|i| !i.sku.is_empty())
        .map(|i| (i.sku.as_str(), i))
        .collect();

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let sku = row.text(COL_SKU);
            let name = row.text(COL_ITEM);
            let item_id = by_sku.get(sku.as_str()).map_or_else(
                || {
                    let fallback = if !sku.is_empty() { &sku } else { &name };
                    if fallback.is_empty() {
                        ItemId::new(format!("movement-{}", index + 1))
                    } else {
                        ItemId::new(fallback.as_str())
                    }
                },
                |item| item.id.clone(),
            );

            let sold = row.number(COL_SOLD, 0.0);
            let received = row.number(COL_RECEIVED, 0.0);
            let unit_cost = row.number(COL_UNIT_COST, 0.0);
            let sold_value = row.number_opt(COL_SOLD_VALUE).unwrap_or(sold * unit_cost);
            let received_value = row
                .number_opt(COL_RECEIVED_VALUE)
                .unwrap_or(received * unit_cost);
            let value_impact = row
                .number_opt(COL_VALUE_CHANGE)
                .unwrap_or(received_value - sold_value);
            let previous_count = row.number(COL_PREVIOUS_COUNT, 0.0);
            let new_count = row.number(COL_NEW_COUNT, 0.0);
            let delta = row
                .number_opt(COL_DELTA)
                .unwrap_or(new_count - previous_count);
            let timestamp = row.datetime(COL_TIMESTAMP);

            let id = match timestamp {
                Some(at) => entry_id(&item_id, at, ""),
                None => EntryId::new(format!("{item_id}-import-{}", index + 1)),
            };

            LedgerEntry {
                id,
                item_id,
                sku,
                name,
                category: row.text(COL_CATEGORY),
                previous_count,
                new_count,
                sold,
                received,
                delta,
                unit_cost,
                sold_value,
                received_value,
                sold_unit_cost: if sold > EPSILON { sold_value / sold } else { 0.0 },
                received_unit_cost: if received > EPSILON {
                    received_value / received
                } else {
                    0.0
                },
                value_impact,
                performed_by: row.text(COL_PERFORMED_BY),
                notes: row.text(COL_NOTES),
                item_note: row.text(COL_ITEM_NOTE),
                timestamp,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{CellValue, LEDGER_COLUMNS};
    use chrono::TimeZone;
    use stocktake_inventory::CostLayer;

    fn imported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
    }

    fn item_sheet(rows: Vec<Vec<CellValue>>) -> Sheet {
        Sheet {
            name: "Counts".to_string(),
            headers: ["SKU", "Item", "Category", "Count", "Unit Cost", "Last Updated", "Note"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows,
        }
    }

    fn workbook(sheets: Vec<Sheet>) -> WorkbookImport {
        WorkbookImport {
            source_file_name: "shop.xlsx".to_string(),
            sheets,
            imported_at: imported_at(),
        }
    }

    #[test]
    fn missing_columns_abort_before_rows_are_read() {
        let mut sheet = item_sheet(vec![]);
        sheet.headers.retain(|h| h != "Unit Cost" && h != "Category");
        let err = import_workbook(&workbook(vec![sheet]), &StocktakeConfig::default()).unwrap_err();
        assert_eq!(
            err,
            WorkbookError::MissingColumns(vec!["Category".to_string(), "Unit Cost".to_string()])
        );
        assert_eq!(
            import_workbook(&workbook(vec![]), &StocktakeConfig::default()).unwrap_err(),
            WorkbookError::NoSheet
        );
    }

    #[test]
    fn rows_normalise_with_defaults_and_unique_ids() {
        let sheet = item_sheet(vec![
            vec![
                "DEMO-001".into(),
                "Shampoo".into(),
                "Bath".into(),
                120.0.into(),
                "$6.50".into(),
                "2025-01-01".into(),
            ],
            vec![
                "DEMO-001".into(),
                "Shampoo 2".into(),
                "".into(),
                "oops".into(),
                2.0.into(),
                "soon".into(),
                "fragile".into(),
            ],
            vec!["".into(), "".into(), "".into(), 4.0.into(), 1.0.into()],
            vec![CellValue::Empty, CellValue::Empty],
        ]);
        let imported =
            import_workbook(&workbook(vec![sheet]), &StocktakeConfig::default()).unwrap();
        let items = &imported.items;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id.as_str(), "DEMO-001");
        assert_eq!(items[1].id.as_str(), "DEMO-001-1");
        assert_eq!(items[2].id.as_str(), "Item 3");
        assert_eq!(items[2].name, "Item 3");

        assert_eq!(items[0].unit_cost, 6.5);
        assert_eq!(
            items[0].cost_layers,
            vec![CostLayer::new(120.0, 6.5, items[0].last_updated)]
        );
        assert!(items[0].last_updated.is_some());

        assert_eq!(items[1].category, "Uncategorised");
        assert_eq!(items[1].current_count, 0.0);
        assert!(items[1].cost_layers.is_empty());
        assert_eq!(items[1].last_updated, None);
        assert_eq!(items[1].item_note, "fragile");

        assert_eq!(items[2].cost_layers[0].acquired_at, Some(imported_at()));

        assert_eq!(imported.metadata.sheet_name.as_deref(), Some("Counts"));
        assert_eq!(imported.metadata.next_sku_number, 2);
        assert_eq!(imported.metadata.last_stocktake_at, None);
        assert!(imported.ledger.is_empty());
    }

    #[test]
    fn last_count_column_is_honoured_when_present() {
        let mut sheet = item_sheet(vec![
            vec!["N-1".into(), "New".into(), "Bath".into(), 8.0.into(), 2.0.into(), "".into()],
            vec!["O-1".into(), "Old".into(), "Bath".into(), 5.0.into(), 1.0.into(), "".into()],
        ]);
        sheet.headers.push("Last Count".to_string());
        sheet.rows[0].extend([CellValue::Empty, 0.0.into()]);

        let imported =
            import_workbook(&workbook(vec![sheet]), &StocktakeConfig::default()).unwrap();
        assert_eq!(imported.items[0].last_count, 0.0);
        assert_eq!(imported.items[1].last_count, 5.0);
    }

    #[test]
    fn movement_sheet_rows_become_ledger_entries() {
        let items = item_sheet(vec![vec![
            "DEMO-001".into(), "Shampoo".into(), "Bath".into(), 100.0.into(), 5.0.into(), "".into(),
        ]]);
        let stamp = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();
        let mut movements = Sheet::new("movements", &LEDGER_COLUMNS);
        movements.rows.push(vec![
            "DEMO-001".into(),
            "Shampoo".into(),
            "Bath".into(),
            130.0.into(),
            30.0.into(),
            0.0.into(),
            100.0.into(),
            CellValue::Empty,
            5.0.into(),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            "Jo".into(),
            "".into(),
            "".into(),
            CellValue::DateTime(stamp),
        ]);
        movements.rows.push(vec!["GONE".into(), "Old".into()]);

        let config = StocktakeConfig::default();
        let imported = import_workbook(&workbook(vec![items, movements]), &config).unwrap();
        let entries = imported.ledger.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id.as_str(), "DEMO-001");
        assert_eq!(entries[0].delta, -30.0);
        assert_eq!(entries[0].sold_value, 150.0);
        assert_eq!(entries[0].sold_unit_cost, 5.0);
        assert_eq!(entries[0].value_impact, -150.0);
        assert_eq!(entries[1].item_id.as_str(), "GONE");
        assert_eq!(entries[1].timestamp, None);
        assert_eq!(imported.metadata.last_stocktake_at, Some(stamp));
    }
}
