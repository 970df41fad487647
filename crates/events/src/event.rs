use chrono::{DateTime, Utc};

/// A fact recorded by an aggregate.
///
/// Once emitted an event is never edited; a later event supersedes it.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `stocktake.committed`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version.
    fn version(&self) -> u32;

    /// Business time the event refers to.
    fn occurred_at(&self) -> DateTime<Utc>;
}
