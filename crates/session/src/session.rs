//! The stocktake session aggregate.
//!
//! Holds the loaded items, the movement ledger and session metadata. Every
//! mutation is decided by `handle` against the current snapshot and applied
//! by `apply` as a wholesale replacement, so a command either lands in full
//! or not at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use stocktake_core::{
    Aggregate, AggregateRoot, DomainError, ExpectedVersion, ItemId, SessionId, find_by_id,
    parse_numeric, replace_by_id,
};
use stocktake_events::Event;
use stocktake_inventory::{CostMovement, DraftField, InventoryItem};
use stocktake_ledger::{
    Ledger, LedgerEntry, MoverTotal, MovementSummary, least_moved, mover_totals, top_outflow,
};

use crate::aggregates::{
    CategoryShare, DraftSummary, Totals, category_breakdown, draft_summary, recent_movements,
    totals,
};
use crate::config::StocktakeConfig;
use crate::metadata::Metadata;
use crate::registration::{ManualItem, Registration, id_suffix, register};
use crate::transaction::{CommitRequest, StocktakeCommit, commit};
use crate::workbook::{
    ImportedInventory, WorkbookError, WorkbookExport, WorkbookImport, export_workbook,
    import_workbook, template_workbook,
};

/// Number of rows shown in the top/least mover lists.
pub const MOVER_LIST_LIMIT: usize = 4;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum SessionCommand {
    Import(WorkbookImport),
    UpdateDraft {
        item_id: ItemId,
        field: DraftField,
        raw: String,
        at: DateTime<Utc>,
    },
    UpdateUnitCost {
        item_id: ItemId,
        raw: String,
        at: DateTime<Utc>,
    },
    UpdateItemNote {
        item_id: ItemId,
        raw: String,
        at: DateTime<Utc>,
    },
    ResetDrafts {
        at: DateTime<Utc>,
    },
    CommitStocktake(CommitRequest),
    RegisterItem {
        form: ManualItem,
        /// Random tail of the new item's id, drawn by the caller.
        id_suffix: String,
        at: DateTime<Utc>,
    },
    Clear {
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum SessionEvent {
    Imported {
        inventory: ImportedInventory,
        at: DateTime<Utc>,
    },
    DraftUpdated {
        item_id: ItemId,
        field: DraftField,
        raw: String,
        at: DateTime<Utc>,
    },
    UnitCostUpdated {
        item_id: ItemId,
        unit_cost: f64,
        at: DateTime<Utc>,
    },
    ItemNoteUpdated {
        item_id: ItemId,
        note: String,
        at: DateTime<Utc>,
    },
    DraftsReset {
        at: DateTime<Utc>,
    },
    StocktakeCommitted(StocktakeCommit),
    ItemRegistered {
        registration: Registration,
        next_sku_number: u64,
        at: DateTime<Utc>,
    },
    Cleared {
        at: DateTime<Utc>,
    },
}

impl Event for SessionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Imported { .. } => "stocktake.imported",
            SessionEvent::DraftUpdated { .. } => "stocktake.item.draft_updated",
            SessionEvent::UnitCostUpdated { .. } => "stocktake.item.unit_cost_updated",
            SessionEvent::ItemNoteUpdated { .. } => "stocktake.item.note_updated",
            SessionEvent::DraftsReset { .. } => "stocktake.drafts_reset",
            SessionEvent::StocktakeCommitted(_) => "stocktake.committed",
            SessionEvent::ItemRegistered { .. } => "stocktake.item.registered",
            SessionEvent::Cleared { .. } => "stocktake.cleared",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::Imported { at, .. }
            | SessionEvent::DraftUpdated { at, .. }
            | SessionEvent::UnitCostUpdated { at, .. }
            | SessionEvent::ItemNoteUpdated { at, .. }
            | SessionEvent::DraftsReset { at }
            | SessionEvent::ItemRegistered { at, .. }
            | SessionEvent::Cleared { at } => *at,
            SessionEvent::StocktakeCommitted(c) => c.at,
        }
    }
}

/// Aggregate root: one in-memory stocktake session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    config: StocktakeConfig,
    items: Vec<InventoryItem>,
    ledger: Ledger,
    metadata: Metadata,
    version: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StocktakeConfig::default())
    }
}

impl AggregateRoot for Session {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Session {
    type Command = SessionCommand;
    type Event = SessionEvent;
    type Error = SessionError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SessionEvent::Imported { inventory, .. } => {
                self.items = inventory.items.clone();
                self.ledger = inventory.ledger.clone();
                self.metadata = inventory.metadata.clone();
            }
            SessionEvent::DraftUpdated {
                item_id, field, raw, ..
            } => self.replace_item(item_id, |item| item.with_draft(*field, raw.clone())),
            SessionEvent::UnitCostUpdated {
                item_id, unit_cost, ..
            } => self.replace_item(item_id, |item| InventoryItem {
                unit_cost: *unit_cost,
                ..item.clone()
            }),
            SessionEvent::ItemNoteUpdated { item_id, note, .. } => {
                self.replace_item(item_id, |item| InventoryItem {
                    item_note: note.clone(),
                    ..item.clone()
                })
            }
            SessionEvent::DraftsReset { .. } => {
                self.items = self.items.iter().map(InventoryItem::with_drafts_cleared).collect();
            }
            SessionEvent::StocktakeCommitted(result) => {
                self.items = result.items.clone();
                if result.recorded_anything() {
                    self.ledger = self.ledger.prepend(result.entries.clone());
                    self.metadata.last_stocktake_at = Some(result.at);
                }
            }
            SessionEvent::ItemRegistered {
                registration,
                next_sku_number,
                at,
            } => {
                let mut items = Vec::with_capacity(self.items.len() + 1);
                items.push(registration.item.clone());
                items.extend(self.items.iter().cloned());
                self.items = items;
                self.ledger = self.ledger.prepend(vec![registration.entry.clone()]);
                self.metadata.last_stocktake_at = Some(*at);
                self.metadata.next_sku_number = *next_sku_number;
            }
            SessionEvent::Cleared { .. } => {
                self.items = Vec::new();
                self.ledger = Ledger::new();
                self.metadata = Metadata::default();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SessionCommand::Import(workbook) => {
                let inventory = import_workbook(workbook, &self.config)?;
                Ok(vec![SessionEvent::Imported {
                    inventory,
                    at: workbook.imported_at,
                }])
            }
            SessionCommand::UpdateDraft {
                item_id,
                field,
                raw,
                at,
            } => {
                self.find(item_id)?;
                Ok(vec![SessionEvent::DraftUpdated {
                    item_id: item_id.clone(),
                    field: *field,
                    raw: raw.clone(),
                    at: *at,
                }])
            }
            SessionCommand::UpdateUnitCost { item_id, raw, at } => {
                let item = self.find(item_id)?;
                Ok(vec![SessionEvent::UnitCostUpdated {
                    item_id: item_id.clone(),
                    unit_cost: parse_numeric(raw, item.unit_cost).max(0.0),
                    at: *at,
                }])
            }
            SessionCommand::UpdateItemNote { item_id, raw, at } => {
                self.find(item_id)?;
                Ok(vec![SessionEvent::ItemNoteUpdated {
                    item_id: item_id.clone(),
                    note: raw.trim().to_string(),
                    at: *at,
                }])
            }
            SessionCommand::ResetDrafts { at } => Ok(vec![SessionEvent::DraftsReset { at: *at }]),
            SessionCommand::CommitStocktake(request) => {
                let result = commit(&self.items, &self.ledger, request, &self.config)?;
                Ok(vec![SessionEvent::StocktakeCommitted(result)])
            }
            SessionCommand::RegisterItem {
                form,
                id_suffix,
                at,
            } => {
                let number = self.metadata.next_sku_number;
                Ok(vec![SessionEvent::ItemRegistered {
                    registration: register(form, number, id_suffix, &self.config, *at),
                    next_sku_number: number + 1,
                    at: *at,
                }])
            }
            SessionCommand::Clear { at } => Ok(vec![SessionEvent::Cleared { at: *at }]),
        }
    }
}

impl Session {
    pub fn new(config: StocktakeConfig) -> Self {
        Self {
            id: SessionId::new(),
            config,
            items: Vec::new(),
            ledger: Ledger::new(),
            metadata: Metadata::default(),
            version: 0,
        }
    }

    pub fn config(&self) -> &StocktakeConfig {
        &self.config
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&InventoryItem> {
        find_by_id(&self.items, item_id)
    }

    /// Decide and apply `command`, rejecting it if the session moved past
    /// `expected`. Nothing is applied when `handle` fails.
    pub fn execute(
        &mut self,
        command: SessionCommand,
        expected: ExpectedVersion,
    ) -> SessionResult<Vec<SessionEvent>> {
        expected.check(self.version)?;
        let events = self.handle(&command)?;
        for event in &events {
            self.apply(event);
            debug!(
                session = %self.id,
                event = event.event_type(),
                at = %event.occurred_at(),
                version = self.version,
                "session event applied"
            );
        }
        Ok(events)
    }

    /// Replace the session with a workbook's contents.
    ///
    /// On a structural failure the current state is left untouched.
    pub fn import(&mut self, workbook: WorkbookImport) -> SessionResult<()> {
        let source = workbook.source_file_name.clone();
        match self.execute(SessionCommand::Import(workbook), ExpectedVersion::Any) {
            Ok(_) => {
                info!(
                    source = %source,
                    items = self.items.len(),
                    entries = self.ledger.len(),
                    "workbook imported"
                );
                Ok(())
            }
            Err(err) => {
                warn!(source = %source, error = %err, "workbook import rejected");
                Err(err)
            }
        }
    }

    pub fn update_draft(
        &mut self,
        item_id: &ItemId,
        field: DraftField,
        raw: impl Into<String>,
        at: DateTime<Utc>,
    ) -> SessionResult<()> {
        self.execute(
            SessionCommand::UpdateDraft {
                item_id: item_id.clone(),
                field,
                raw: raw.into(),
                at,
            },
            ExpectedVersion::Any,
        )
        .map(drop)
    }

    pub fn update_unit_cost(
        &mut self,
        item_id: &ItemId,
        raw: impl Into<String>,
        at: DateTime<Utc>,
    ) -> SessionResult<()> {
        self.execute(
            SessionCommand::UpdateUnitCost {
                item_id: item_id.clone(),
                raw: raw.into(),
                at,
            },
            ExpectedVersion::Any,
        )
        .map(drop)
    }

    pub fn update_item_note(
        &mut self,
        item_id: &ItemId,
        raw: impl Into<String>,
        at: DateTime<Utc>,
    ) -> SessionResult<()> {
        self.execute(
            SessionCommand::UpdateItemNote {
                item_id: item_id.clone(),
                raw: raw.into(),
                at,
            },
            ExpectedVersion::Any,
        )
        .map(drop)
    }

    pub fn reset_drafts(&mut self, at: DateTime<Utc>) -> SessionResult<()> {
        self.execute(SessionCommand::ResetDrafts { at }, ExpectedVersion::Any).map(drop)
    }

    /// Commit all drafts as `operator`.
    ///
    /// Returns the recorded entries. A rejected commit (blank operator, or
    /// layers out of step with a count) records nothing and leaves every
    /// item as it was.
    pub fn commit_stocktake(
        &mut self,
        operator: &str,
        notes: &str,
        at: DateTime<Utc>,
    ) -> Vec<LedgerEntry> {
        let request = CommitRequest::new(operator, notes, at);
        match self.execute(SessionCommand::CommitStocktake(request), ExpectedVersion::Any) {
            Ok(events) => {
                let entries: Vec<LedgerEntry> = events
                    .into_iter()
                    .filter_map(|event| match event {
                        SessionEvent::StocktakeCommitted(result) => Some(result.entries),
                        _ => None,
                    })
                    .flatten()
                    .collect();
                info!(operator = %operator.trim(), entries = entries.len(), "stocktake committed");
                entries
            }
            Err(err) => {
                warn!(error = %err, "stocktake commit rejected");
                Vec::new()
            }
        }
    }

    /// Register a manual item under the next SKU number.
    pub fn register_item(
        &mut self,
        form: ManualItem,
        at: DateTime<Utc>,
    ) -> SessionResult<Registration> {
        let command = SessionCommand::RegisterItem {
            form,
            id_suffix: id_suffix(),
            at,
        };
        let registration = self
            .execute(command, ExpectedVersion::Any)?
            .into_iter()
            .find_map(|event| match event {
                SessionEvent::ItemRegistered { registration, .. } => Some(registration),
                _ => None,
            })
            .ok_or_else(|| DomainError::invariant("registration produced no item"))?;
        info!(
            sku = %registration.item.sku,
            count = registration.item.current_count,
            "item registered"
        );
        Ok(registration)
    }

    pub fn clear(&mut self, at: DateTime<Utc>) -> SessionResult<()> {
        self.execute(SessionCommand::Clear { at }, ExpectedVersion::Any)?;
        info!("session cleared");
        Ok(())
    }

    /// Read-only valuation of an item's current drafts.
    pub fn preview(&self, item_id: &ItemId) -> SessionResult<CostMovement> {
        Ok(self.find(item_id)?.preview_drafts())
    }

    pub fn totals(&self) -> Totals {
        totals(&self.items)
    }

    pub fn draft_summary(&self) -> DraftSummary {
        draft_summary(&self.items)
    }

    pub fn recent_movements(&self, now: DateTime<Utc>) -> Vec<&LedgerEntry> {
        recent_movements(&self.ledger, now, self.config.movement_window_days)
    }

    pub fn movement_summary(&self, now: DateTime<Utc>) -> MovementSummary {
        MovementSummary::from_entries(self.recent_movements(now))
    }

    pub fn mover_totals(&self, now: DateTime<Utc>) -> Vec<MoverTotal> {
        mover_totals(&self.items, self.recent_movements(now))
    }

    pub fn top_outflow(&self, now: DateTime<Utc>) -> Vec<MoverTotal> {
        top_outflow(&self.mover_totals(now), MOVER_LIST_LIMIT)
    }

    pub fn least_moved(&self, now: DateTime<Utc>) -> Vec<MoverTotal> {
        least_moved(&self.mover_totals(now), MOVER_LIST_LIMIT)
    }

    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        category_breakdown(&self.items, &self.config.default_category)
    }

    pub fn has_inventory(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn has_imported(&self) -> bool {
        self.metadata.has_imported()
    }

    pub fn has_drafts(&self) -> bool {
        self.items.iter().any(InventoryItem::has_draft)
    }

    pub fn export(&self, generated_at: DateTime<Utc>) -> WorkbookExport {
        export_workbook(
            &self.items,
            &self.metadata,
            &self.ledger,
            &self.config,
            generated_at,
        )
    }

    /// Blank or sample workbook, independent of loaded state.
    pub fn template(config: &StocktakeConfig, with_samples: bool) -> WorkbookExport {
        template_workbook(config, with_samples)
    }

    fn find(&self, item_id: &ItemId) -> Result<&InventoryItem, DomainError> {
        self.item(item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))
    }

    fn replace_item(&mut self, item_id: &ItemId, f: impl Fn(&InventoryItem) -> InventoryItem) {
        self.items = replace_by_id(&self.items, item_id, f);
    }
}
