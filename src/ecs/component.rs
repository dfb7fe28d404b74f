//! Component Type Registry
//!
//! Every Rust type used as a component receives a process-wide
//! `ComponentTypeId` on first use, assigned from a monotonic atomic counter.
//! The id doubles as the component's bit position inside a
//! [`ComponentMask`](crate::ecs::ComponentMask) and as the index of its
//! table inside the database.

use std::any::TypeId;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Marker trait for component types.
///
/// Blanket-implemented for every `'static` type; components need no manual
/// registration beyond [`EntityDatabase::add_component_table`].
///
/// [`EntityDatabase::add_component_table`]: crate::ecs::EntityDatabase::add_component_table
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Process-wide component type index. Determines mask bit positions.
pub type ComponentTypeId = usize;

static NEXT_TYPE_ID: AtomicUsize = AtomicUsize::new(0);
static TYPE_IDS: OnceLock<RwLock<FxHashMap<TypeId, ComponentTypeId>>> = OnceLock::new();

fn registry() -> &'static RwLock<FxHashMap<TypeId, ComponentTypeId>> {
    TYPE_IDS.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Returns the `ComponentTypeId` of `T`, assigning one on first use.
#[must_use]
pub fn component_type_id<T: Component>() -> ComponentTypeId {
    let key = TypeId::of::<T>();

    if let Some(&id) = registry().read().get(&key) {
        return id;
    }

    let mut ids = registry().write();
    // Lost the race between read and write: another thread may have
    // registered the type in the meantime.
    *ids.entry(key)
        .or_insert_with(|| NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Number of component types seen by the process so far.
///
/// An upper bound for sizing masks; grows monotonically.
#[must_use]
pub fn component_type_count() -> usize {
    NEXT_TYPE_ID.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn type_ids_are_stable_and_distinct() {
        let a1 = component_type_id::<Alpha>();
        let b = component_type_id::<Beta>();
        let a2 = component_type_id::<Alpha>();

        assert_eq!(a1, a2, "id must be stable across calls");
        assert_ne!(a1, b, "distinct types must get distinct ids");
        assert!(component_type_count() > a1.max(b));
    }
}
