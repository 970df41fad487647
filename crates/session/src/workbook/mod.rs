//! Workbook boundary.
//!
//! The spreadsheet codec lives outside this crate. It hands sheets over as
//! rows of [`CellValue`]s and receives the same shape back for export.

pub mod cell;
pub mod export;
pub mod import;
pub mod template;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocktake_core::DomainError;

pub use cell::{CellValue, RawRow};
pub use export::{WorkbookExport, export_workbook, history_file_name, stamped_file_name};
pub use import::{ImportedInventory, WorkbookImport, import_workbook};
pub use template::template_workbook;

pub const COL_SKU: &str = "SKU";
pub const COL_ITEM: &str = "Item";
pub const COL_CATEGORY: &str = "Category";
pub const COL_COUNT: &str = "Count";
pub const COL_UNIT_COST: &str = "Unit Cost";
pub const COL_LAST_UPDATED: &str = "Last Updated";
pub const COL_NOTE: &str = "Note";
/// Optional; absent means the item was last counted at its current count.
pub const COL_LAST_COUNT: &str = "Last Count";

/// Columns every item sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_SKU,
    COL_ITEM,
    COL_CATEGORY,
    COL_COUNT,
    COL_UNIT_COST,
    COL_LAST_UPDATED,
];

pub const COL_PREVIOUS_COUNT: &str = "Previous Count";
pub const COL_SOLD: &str = "Sold";
pub const COL_RECEIVED: &str = "Received";
pub const COL_NEW_COUNT: &str = "New Count";
pub const COL_DELTA: &str = "Delta";
pub const COL_SOLD_VALUE: &str = "Sold Value";
pub const COL_RECEIVED_VALUE: &str = "Received Value";
pub const COL_VALUE_CHANGE: &str = "Value Change";
pub const COL_PERFORMED_BY: &str = "Performed By";
pub const COL_NOTES: &str = "Notes";
pub const COL_ITEM_NOTE: &str = "Item Note";
pub const COL_TIMESTAMP: &str = "Timestamp";

/// Movement sheet columns, in export order.
pub const LEDGER_COLUMNS: [&str; 16] = [
    COL_SKU,
    COL_ITEM,
    COL_CATEGORY,
    COL_PREVIOUS_COUNT,
    COL_SOLD,
    COL_RECEIVED,
    COL_NEW_COUNT,
    COL_DELTA,
    COL_UNIT_COST,
    COL_SOLD_VALUE,
    COL_RECEIVED_VALUE,
    COL_VALUE_CHANGE,
    COL_PERFORMED_BY,
    COL_NOTES,
    COL_ITEM_NOTE,
    COL_TIMESTAMP,
];

/// One logical sheet: a header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Required headers absent from this sheet (case-insensitive).
    pub fn missing_headers(&self, required: &[&str]) -> Vec<String> {
        let present: Vec<String> = self.headers.iter().map(|h| h.trim().to_lowercase()).collect();
        required
            .iter()
            .filter(|r| !present.contains(&r.to_lowercase()))
            .map(|r| r.to_string())
            .collect()
    }

    /// Data rows keyed by header, skipping rows with no content.
    pub fn records(&self) -> Vec<RawRow> {
        self.rows
            .iter()
            .map(|cells| RawRow::from_cells(&self.headers, cells))
            .filter(|row| !row.is_blank())
            .collect()
    }
}

/// Structural failures at the workbook boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkbookError {
    #[error("no sheets found in the workbook")]
    NoSheet,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
