//! Serialise session state into the three logical sheets the codec writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_inventory::InventoryItem;
use stocktake_ledger::Ledger;

use crate::aggregates::totals;
use crate::config::StocktakeConfig;
use crate::metadata::Metadata;
use crate::workbook::{
    COL_LAST_COUNT, COL_NOTE, CellValue, LEDGER_COLUMNS, REQUIRED_COLUMNS, Sheet,
};

/// Sheets to write, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookExport {
    pub sheets: Vec<Sheet>,
}

impl WorkbookExport {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

pub fn export_workbook(
    items: &[InventoryItem],
    metadata: &Metadata,
    ledger: &Ledger,
    config: &StocktakeConfig,
    generated_at: DateTime<Utc>,
) -> WorkbookExport {
    let mut sheets = vec![item_sheet(items, metadata, config)];
    if !ledger.is_empty() {
        sheets.push(ledger_sheet(ledger, config));
    }
    sheets.push(summary_sheet(items, metadata, config, generated_at));
    WorkbookExport { sheets }
}

fn item_sheet(items: &[InventoryItem], metadata: &Metadata, config: &StocktakeConfig) -> Sheet {
    let name = metadata
        .sheet_name
        .clone()
        .unwrap_or_else(|| config.item_sheet_name.clone());
    let mut headers: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    headers.extend([COL_NOTE, COL_LAST_COUNT]);

    let mut sheet = Sheet::new(name, &headers);
    sheet.rows = items
        .iter()
        .map(|item| -> Vec<CellValue> {
            vec![
                item.sku.as_str().into(),
                item.name.as_str().into(),
                item.category.as_str().into(),
                item.current_count.into(),
                item.average_cost().into(),
                item.last_updated.into(),
                item.item_note.as_str().into(),
                item.last_count.into(),
            ]
        })
        .collect();
    sheet
}

fn ledger_sheet(ledger: &Ledger, config: &StocktakeConfig) -> Sheet {
    let mut sheet = Sheet::new(config.ledger_sheet_name.clone(), &LEDGER_COLUMNS);
    sheet.rows = ledger
        .iter()
        .map(|entry| -> Vec<CellValue> {
            vec![
                entry.sku.as_str().into(),
                entry.name.as_str().into(),
                entry.category.as_str().into(),
                entry.previous_count.into(),
                entry.sold.into(),
                entry.received.into(),
                entry.new_count.into(),
                entry.delta.into(),
                entry.unit_cost.into(),
                entry.sold_value.into(),
                entry.received_value.into(),
                entry.value_impact.into(),
                entry.performed_by.as_str().into(),
                entry.notes.as_str().into(),
                entry.item_note.as_str().into(),
                entry.timestamp.into(),
            ]
        })
        .collect();
    sheet
}

fn summary_sheet(
    items: &[InventoryItem],
    metadata: &Metadata,
    config: &StocktakeConfig,
    generated_at: DateTime<Utc>,
) -> Sheet {
    let totals = totals(items);
    let mut sheet = Sheet::new(config.summary_sheet_name.clone(), &[]);
    sheet.rows = vec![
        vec!["Stocktake Inventory Tool".into()],
        vec!["Generated At".into(), CellValue::DateTime(generated_at)],
        vec!["Source File".into(), metadata.source_file_name.as_str().into()],
        vec!["Imported At".into(), metadata.last_imported_at.into()],
        vec!["Last Stocktake".into(), metadata.last_stocktake_at.into()],
        vec!["Total SKUs".into(), (totals.total_skus as f64).into()],
        vec!["Units On Hand".into(), totals.total_current.into()],
        vec!["Inventory Value".into(), totals.total_value.into()],
    ];
    sheet
}

/// Source file name without its spreadsheet extension, or the default base.
fn base_name(metadata: &Metadata, config: &StocktakeConfig) -> String {
    let source = metadata.source_file_name.trim();
    if source.is_empty() {
        return config.export_base_name.clone();
    }
    let lower = source.to_lowercase();
    for ext in [".xlsx", ".xls"] {
        if lower.ends_with(ext) {
            return source[..source.len() - ext.len()].to_string();
        }
    }
    source.to_string()
}

/// `<base>-with-history.xlsx`.
pub fn history_file_name(metadata: &Metadata, config: &StocktakeConfig) -> String {
    format!("{}-with-history.xlsx", base_name(metadata, config))
}

/// `<base>-updated-<YYYYMMDD-HHMMSS>.xlsx`.
pub fn stamped_file_name(
    metadata: &Metadata,
    config: &StocktakeConfig,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}-updated-{}.xlsx",
        base_name(metadata, config),
        at.format("%Y%m%d-%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stocktake_core::ItemId;
    use stocktake_inventory::CostLayer;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    fn item() -> InventoryItem {
        InventoryItem {
            id: ItemId::new("A"),
            sku: "A".to_string(),
            name: "Soap".to_string(),
            category: "Bath".to_string(),
            unit_cost: 9.0,
            current_count: 20.0,
            last_count: 20.0,
            cost_layers: vec![CostLayer::new(10.0, 4.0, None), CostLayer::new(10.0, 6.0, None)],
            draft_sold: String::new(),
            draft_received: String::new(),
            item_note: "top shelf".to_string(),
            last_updated: None,
        }
    }

    #[test]
    fn item_sheet_reports_weighted_layer_cost() {
        let export = export_workbook(
            &[item()],
            &Metadata::default(),
            &Ledger::new(),
            &StocktakeConfig::default(),
            at(),
        );
        let names: Vec<_> = export.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Stocktake", "Summary"]);

        let row = &export.sheets[0].rows[0];
        assert_eq!(row[3], CellValue::Number(20.0));
        assert_eq!(row[4], CellValue::Number(5.0));
        assert_eq!(row[5], CellValue::Empty);
        assert_eq!(row[6], CellValue::from("top shelf"));
        assert_eq!(row[7], CellValue::Number(20.0));

        let summary = export.sheet("Summary").unwrap();
        assert_eq!(summary.rows[5][1], CellValue::Number(1.0));
        assert_eq!(summary.rows[7][1], CellValue::Number(100.0));
    }

    #[test]
    fn file_names_strip_spreadsheet_extensions() {
        let config = StocktakeConfig::default();
        let mut metadata = Metadata::default();
        assert_eq!(history_file_name(&metadata, &config), "stocktake-control-with-history.xlsx");

        metadata.source_file_name = "Shop Counts.XLSX".to_string();
        assert_eq!(history_file_name(&metadata, &config), "Shop Counts-with-history.xlsx");
        assert_eq!(
            stamped_file_name(&metadata, &config, at()),
            "Shop Counts-updated-20250304-050607.xlsx"
        );
    }
}
