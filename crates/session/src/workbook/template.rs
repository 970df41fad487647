//! Starter workbooks, independent of any loaded state.

use crate::config::StocktakeConfig;
use crate::workbook::{CellValue, REQUIRED_COLUMNS, Sheet, WorkbookExport};

const SAMPLE_ROWS: [(&str, &str, &str, f64, f64, &str); 3] = [
    ("DEMO-001", "Shampoo", "Bath", 120.0, 6.5, "2025-01-01"),
    ("DEMO-002", "Conditioner", "Bath", 85.0, 6.5, "2025-01-01"),
    ("DEMO-003", "Soap Bar", "Bath", 220.0, 2.5, "2025-01-01"),
];

/// A single item sheet with the required headers, optionally with samples.
pub fn template_workbook(config: &StocktakeConfig, with_samples: bool) -> WorkbookExport {
    let mut sheet = Sheet::new(config.item_sheet_name.clone(), &REQUIRED_COLUMNS);
    if with_samples {
        sheet.rows = SAMPLE_ROWS
            .iter()
            .map(|(sku, name, category, count, cost, updated)| {
                vec![
                    CellValue::from(*sku),
                    CellValue::from(*name),
                    CellValue::from(*category),
                    CellValue::Number(*count),
                    CellValue::Number(*cost),
                    CellValue::from(*updated),
                ]
            })
            .collect();
    }
    WorkbookExport {
        sheets: vec![sheet],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::workbook::{WorkbookImport, import_workbook};

    #[test]
    fn sample_template_imports_cleanly() {
        let config = StocktakeConfig::default();
        let template = template_workbook(&config, true);
        let imported = import_workbook(
            &WorkbookImport {
                source_file_name: "template.xlsx".to_string(),
                sheets: template.sheets,
                imported_at: Utc::now(),
            },
            &config,
        )
        .unwrap();

        assert_eq!(imported.items.len(), 3);
        assert_eq!(imported.metadata.next_sku_number, 4);
        assert!(template_workbook(&config, false).sheets[0].rows.is_empty());
    }
}
