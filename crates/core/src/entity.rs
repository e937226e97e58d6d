//! Entity trait: identity + continuity across state changes.

/// Something with a stable identity inside an aggregate.
///
/// Time slots and markers are entities owned by an event aggregate: they keep
/// their identity while their position or display values change.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

impl<E: Entity + ?Sized> Entity for &E {
    type Id = E::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }
}

/// Index of the entity with `id` in `items`.
pub fn position_by_id<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// The entity with `id` in `items`.
pub fn find_by_id<'a, E: Entity>(items: &'a [E], id: &E::Id) -> Option<&'a E> {
    items.iter().find(|item| item.id() == id)
}
