//! `stocktake-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO): errors,
//! identifiers, numeric input normalisation and the aggregate traits.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod numeric;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::{Entity, find_by_id, replace_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{EntryId, ItemId, SessionId};
pub use numeric::{EPSILON, finite_or, is_negligible, parse_adjustment, parse_numeric};
pub use value_object::ValueObject;
