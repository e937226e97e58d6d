//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A sort key or a
/// performer reference is a value object; a time slot is an entity.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Performer {
///     id: PerformerId,
///     name: String,
/// }
///
/// impl ValueObject for Performer {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
