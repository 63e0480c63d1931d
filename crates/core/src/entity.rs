//! Entity trait: a document with a stable identity.

use uuid::Uuid;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Into<Uuid> + From<Uuid>;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
