//! Movement ledger: immutable entries, the append-only history and the
//! statistics derived from it.

pub mod entry;
pub mod ledger;
pub mod stats;

pub use entry::{Attribution, LedgerEntry, entry_id};
pub use ledger::{Ledger, LedgerSummary};
pub use stats::{MoverTotal, MovementSummary, least_moved, mover_totals, top_outflow};
