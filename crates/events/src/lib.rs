//! Domain events emitted by stocktake session operations.

pub mod event;

pub use event::Event;
