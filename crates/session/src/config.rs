//! Session configuration.

use serde::{Deserialize, Serialize};

use stocktake_inventory::SkuFormat;

pub const DEFAULT_MOVEMENT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_CATEGORY: &str = "Uncategorised";
pub const DEFAULT_ITEM_SHEET: &str = "Stocktake";
pub const LEDGER_SHEET: &str = "Movements";
pub const SUMMARY_SHEET: &str = "Summary";
pub const DEFAULT_EXPORT_BASE: &str = "stocktake-control";
pub const MANUAL_OPERATOR: &str = "Manual entry";
pub const NEW_ITEM_NOTE: &str = "New item";

/// Tunables for a stocktake session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StocktakeConfig {
    /// Length of the recent-movement window, in days.
    pub movement_window_days: u32,
    pub sku: SkuFormat,
    pub default_category: String,
    /// Item sheet name used when the import did not provide one.
    pub item_sheet_name: String,
    pub ledger_sheet_name: String,
    pub summary_sheet_name: String,
    pub export_base_name: String,
    /// Operator recorded for manual registrations without one.
    pub manual_operator: String,
    /// Notes recorded on synthesised opening-balance entries without notes.
    pub new_item_note: String,
}

impl Default for StocktakeConfig {
    fn default() -> Self {
        Self {
            movement_window_days: DEFAULT_MOVEMENT_WINDOW_DAYS,
            sku: SkuFormat::default(),
            default_category: DEFAULT_CATEGORY.to_string(),
            item_sheet_name: DEFAULT_ITEM_SHEET.to_string(),
            ledger_sheet_name: LEDGER_SHEET.to_string(),
            summary_sheet_name: SUMMARY_SHEET.to_string(),
            export_base_name: DEFAULT_EXPORT_BASE.to_string(),
            manual_operator: MANUAL_OPERATOR.to_string(),
            new_item_note: NEW_ITEM_NOTE.to_string(),
        }
    }
}

impl StocktakeConfig {
    /// Defaults overridden by `STOCKTAKE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    ///
    /// Blank values are ignored; unparsable numbers keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get("STOCKTAKE_MOVEMENT_WINDOW_DAYS") {
            match raw.parse() {
                Ok(days) => config.movement_window_days = days,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid STOCKTAKE_MOVEMENT_WINDOW_DAYS; using default"
                ),
            }
        }
        if let Some(raw) = get("STOCKTAKE_SKU_WIDTH") {
            match raw.parse() {
                Ok(width) => config.sku.width = width,
                Err(_) => {
                    tracing::warn!(value = %raw, "invalid STOCKTAKE_SKU_WIDTH; using default")
                }
            }
        }
        if let Some(prefix) = get("STOCKTAKE_SKU_PREFIX") {
            config.sku.prefix = prefix;
        }
        if let Some(category) = get("STOCKTAKE_DEFAULT_CATEGORY") {
            config.default_category = category;
        }
        if let Some(sheet) = get("STOCKTAKE_SHEET_NAME") {
            config.item_sheet_name = sheet;
        }
        if let Some(base) = get("STOCKTAKE_EXPORT_BASE_NAME") {
            config.export_base_name = base;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STOCKTAKE_MOVEMENT_WINDOW_DAYS", "14"),
            ("STOCKTAKE_SKU_PREFIX", "INV-"),
            ("STOCKTAKE_SKU_WIDTH", "wide"),
            ("STOCKTAKE_DEFAULT_CATEGORY", "  "),
        ]);
        let config = StocktakeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.movement_window_days, 14);
        assert_eq!(config.sku.prefix, "INV-");
        assert_eq!(config.sku.width, 4);
        assert_eq!(config.default_category, DEFAULT_CATEGORY);
    }
}
