use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-wide bookkeeping. Reset on clear, replaced wholesale on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub source_file_name: String,
    pub last_imported_at: Option<DateTime<Utc>>,
    pub last_stocktake_at: Option<DateTime<Utc>>,
    pub sheet_name: Option<String>,
    /// Number the next manual registration will receive.
    pub next_sku_number: u64,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            source_file_name: String::new(),
            last_imported_at: None,
            last_stocktake_at: None,
            sheet_name: None,
            next_sku_number: 1,
        }
    }
}

impl Metadata {
    pub fn has_imported(&self) -> bool {
        !self.source_file_name.is_empty()
    }
}
