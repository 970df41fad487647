//! `stocktake <workbook.json> [operator]`
//!
//! Loads a JSON-encoded workbook, stages any `Sold`/`Received` columns as
//! drafts, commits them when an operator is given and prints the export.

use std::fs;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use stocktake_inventory::DraftField;
use stocktake_session::workbook::{COL_RECEIVED, COL_SOLD};
use stocktake_session::{Session, StocktakeConfig, WorkbookImport};

fn main() -> Result<()> {
    stocktake_observability::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: stocktake <workbook.json> [operator]");
    };
    let operator = args.next();

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let workbook: WorkbookImport =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let rows = workbook
        .sheets
        .first()
        .map(|sheet| sheet.records())
        .unwrap_or_default();

    let mut session = Session::new(StocktakeConfig::from_env());
    session.import(workbook).context("importing workbook")?;

    let now = Utc::now();
    let ids: Vec<_> = session.items().iter().map(|item| item.id.clone()).collect();
    for (id, row) in ids.iter().zip(&rows) {
        let columns = [(DraftField::Sold, COL_SOLD), (DraftField::Received, COL_RECEIVED)];
        for (field, column) in columns {
            let value = row.text(column);
            if !value.is_empty() {
                session.update_draft(id, field, value, now)?;
            }
        }
    }

    let totals = session.totals();
    let drafts = session.draft_summary();
    info!(
        skus = totals.total_skus,
        units = totals.total_current,
        value = totals.total_value,
        drafted = drafts.items,
        "inventory loaded"
    );

    if let Some(operator) = operator {
        let entries = session.commit_stocktake(&operator, "", now);
        info!(entries = entries.len(), "drafts committed");
    }

    let export = session.export(now);
    let out = serde_json::to_string_pretty(&export).context("serialising export")?;
    println!("{out}");
    Ok(())
}
