//! Entity trait: identity + continuity across refetches.

/// Entity marker + minimal interface.
///
/// Records fetched from the gateway are replaced wholesale on every refetch;
/// the identifier is what lets controllers find "the same" record again.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// First entity in `items` whose identifier is `id`.
pub fn find_by_id<'a, E: Entity>(items: &'a [E], id: &E::Id) -> Option<&'a E> {
    items.iter().find(|item| item.id() == id)
}
