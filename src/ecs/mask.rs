//! Component Mask
//!
//! A growable bitset indexed by `ComponentTypeId`. Used both as the
//! per-entity "which components are present" record and as the per-system
//! "which component changes concern me" subscription.

use smallvec::SmallVec;

use super::component::{Component, ComponentTypeId, component_type_id};

const WORD_BITS: usize = u64::BITS as usize;

/// Bitset over component type ids.
///
/// Two inline words cover the first 128 component types without heap
/// allocation, which is plenty for a typical scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentMask {
    words: SmallVec<[u64; 2]>,
}

impl ComponentMask {
    /// Creates an empty mask.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter: returns the mask with the bit for `T` set.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.set::<T>(true);
        self
    }

    /// Sets or clears the bit for component type `T`.
    pub fn set<T: Component>(&mut self, value: bool) {
        self.set_id(component_type_id::<T>(), value);
    }

    /// Sets or clears the bit at a raw type id.
    pub fn set_id(&mut self, id: ComponentTypeId, value: bool) {
        let word = id / WORD_BITS;
        let bit = 1u64 << (id % WORD_BITS);
        if value {
            if word >= self.words.len() {
                self.words.resize(word + 1, 0);
            }
            self.words[word] |= bit;
        } else if word < self.words.len() {
            self.words[word] &= !bit;
        }
    }

    /// Returns the bit for component type `T`.
    #[must_use]
    pub fn get<T: Component>(&self) -> bool {
        self.get_id(component_type_id::<T>())
    }

    /// Returns the bit at a raw type id.
    #[inline]
    #[must_use]
    pub fn get_id(&self, id: ComponentTypeId) -> bool {
        let word = id / WORD_BITS;
        self.words
            .get(word)
            .is_some_and(|w| w & (1u64 << (id % WORD_BITS)) != 0)
    }

    /// True when every bit of `other` is also set in `self`.
    #[must_use]
    pub fn contains_all(&self, other: &ComponentMask) -> bool {
        other
            .words
            .iter()
            .enumerate()
            .all(|(i, &w)| self.words.get(i).copied().unwrap_or(0) & w == w)
    }

    /// True when at least one bit is set in both masks.
    #[must_use]
    pub fn intersects(&self, other: &ComponentMask) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(&a, &b)| a & b != 0)
    }

    /// True when no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Clears every bit, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;

    #[test]
    fn set_and_get() {
        let mut mask = ComponentMask::new();
        assert!(!mask.get::<A>());

        mask.set::<A>(true);
        assert!(mask.get::<A>());
        assert!(!mask.get::<B>());

        mask.set::<A>(false);
        assert!(!mask.get::<A>());
    }

    #[test]
    fn high_bit_ids() {
        let mut mask = ComponentMask::new();
        mask.set_id(200, true);
        assert!(mask.get_id(200));
        assert!(!mask.get_id(199));
        assert!(!mask.get_id(64));
    }

    #[test]
    fn contains_and_intersects() {
        let ab = ComponentMask::new().with::<A>().with::<B>();
        let a = ComponentMask::new().with::<A>();
        let c = ComponentMask::new().with::<C>();

        assert!(ab.contains_all(&a));
        assert!(!a.contains_all(&ab));
        assert!(ab.intersects(&a));
        assert!(!ab.intersects(&c));
        assert!(ab.contains_all(&ComponentMask::new()), "empty mask is a subset of any");
    }
}
