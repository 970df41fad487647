//! Stocktake session: state holder, commit transaction, manual registration,
//! derived views and the workbook import/export boundary.

pub mod aggregates;
pub mod config;
pub mod metadata;
pub mod registration;
pub mod session;
pub mod transaction;
pub mod workbook;

pub use aggregates::{
    CategoryShare, DraftSummary, Totals, category_breakdown, draft_summary, recent_movements,
    totals,
};
pub use config::StocktakeConfig;
pub use metadata::Metadata;
pub use registration::{ManualItem, Registration, id_suffix, register};
pub use session::{Session, SessionCommand, SessionError, SessionEvent, SessionResult};
pub use transaction::{CommitRequest, StocktakeCommit, commit};
pub use workbook::{
    CellValue, ImportedInventory, RawRow, Sheet, WorkbookError, WorkbookExport, WorkbookImport,
    export_workbook, history_file_name, import_workbook, stamped_file_name, template_workbook,
};
