//! Sequential SKU allocation for manually registered items.

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

pub const DEFAULT_SKU_PREFIX: &str = "SKU-";
pub const DEFAULT_SKU_WIDTH: usize = 4;

/// How generated SKUs are spelled: a fixed prefix and a zero-padded number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuFormat {
    pub prefix: String,
    pub width: usize,
}

impl Default for SkuFormat {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_SKU_PREFIX.to_string(),
            width: DEFAULT_SKU_WIDTH,
        }
    }
}

impl SkuFormat {
    pub fn format(&self, number: u64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }
}

/// The last contiguous run of ASCII digits in `sku`, if any.
pub fn extract_sku_number(sku: &str) -> Option<u64> {
    let bytes = sku.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    sku[start..end].parse().ok()
}

/// One past the highest number found in existing SKUs, or `fallback`.
pub fn next_sku_number(items: &[InventoryItem], fallback: u64) -> u64 {
    items
        .iter()
        .filter_map(|item| extract_sku_number(&item.sku))
        .fold(fallback.saturating_sub(1), u64::max)
        .saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::item;

    #[test]
    fn extracts_the_last_digit_run() {
        assert_eq!(extract_sku_number("SKU-0042"), Some(42));
        assert_eq!(extract_sku_number("A12-B7x"), Some(7));
        assert_eq!(extract_sku_number("no digits"), None);
        assert_eq!(extract_sku_number(""), None);
        assert_eq!(extract_sku_number("99999999999999999999999"), None);
    }

    #[test]
    fn next_number_follows_the_highest_sku() {
        let items = vec![
            item("DEMO-003", 1.0, 1.0),
            item("DEMO-010", 1.0, 1.0),
            item("misc", 1.0, 1.0),
        ];
        assert_eq!(next_sku_number(&items, 1), 11);
        assert_eq!(next_sku_number(&[], 1), 1);
        assert_eq!(next_sku_number(&[item("X-2", 1.0, 1.0)], 50), 50);
    }

    #[test]
    fn formats_with_padding() {
        let format = SkuFormat::default();
        assert_eq!(format.format(7), "SKU-0007");
        assert_eq!(format.format(12345), "SKU-12345");
    }
}
