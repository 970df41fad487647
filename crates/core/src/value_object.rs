//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A cost layer is the canonical example here: it has no identity of its
/// own, and "changing" one means building a new layer list.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
