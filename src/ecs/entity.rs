//! Entity Handle
//!
//! An [`Entity`] is an opaque identifier naming a collection of components.
//! It carries no data of its own; all state lives in the component tables of
//! the [`EntityDatabase`](crate::ecs::EntityDatabase).

/// Opaque entity identifier.
///
/// Identity is stable for the lifetime of the entity; ids of removed
/// entities are recycled by the database. Id `0` is reserved for
/// [`Entity::NULL`] and is never handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// The reserved "no entity" sentinel.
    pub const NULL: Entity = Entity(0);

    /// Creates an entity from a zero-based database index.
    #[inline]
    #[must_use]
    pub(crate) fn from_index(index: usize) -> Self {
        Entity(index as u32 + 1)
    }

    /// Zero-based index of this entity inside the database.
    ///
    /// Must not be called on [`Entity::NULL`].
    #[inline]
    #[must_use]
    pub(crate) fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize - 1
    }

    /// Raw numeric id. `0` means null.
    #[inline]
    #[must_use]
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns true for the [`Entity::NULL`] sentinel.
    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}
