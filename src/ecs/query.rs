//! Tuple Queries
//!
//! A [`Query`] is a tuple of component types, e.g. `(Transform, MeshRef)`.
//! It drives `get_components` / `iterate_components` on the database:
//! the tuple shape decides both the mask that selects entities and the
//! shape of the references handed to the caller.

use super::component::Component;
use super::database::EntityDatabase;
use super::entity::Entity;
use super::mask::ComponentMask;

/// A tuple of component types usable with the database accessors.
///
/// Implemented for tuples up to four components. Larger requests are a hint
/// that the caller should split its work across systems.
pub trait Query {
    /// `(&A, &B, ...)`
    type Shared<'a>;
    /// `(Option<&A>, Option<&B>, ...)`
    type SharedOpt<'a>;
    /// `(&mut A, &mut B, ...)`
    type Mut<'a>;

    /// Mask with the bit of every component in the tuple.
    fn mask() -> ComponentMask;

    /// True when all component types in the tuple are pairwise distinct.
    /// Mutable access requires this.
    fn distinct() -> bool;

    /// References to all components, or `None` if any is missing.
    fn get(db: &EntityDatabase, entity: Entity) -> Option<Self::Shared<'_>>;

    /// Per-component optional references.
    fn get_opt(db: &EntityDatabase, entity: Entity) -> Self::SharedOpt<'_>;

    /// Mutable references to all components, or `None` if any is missing.
    ///
    /// Callers must have verified [`Query::distinct`].
    fn get_mut(db: &mut EntityDatabase, entity: Entity) -> Option<Self::Mut<'_>>;
}

macro_rules! impl_query {
    ($($t:ident),+) => {
        impl<$($t: Component),+> Query for ($($t,)+) {
            type Shared<'a> = ($(&'a $t,)+);
            type SharedOpt<'a> = ($(Option<&'a $t>,)+);
            type Mut<'a> = ($(&'a mut $t,)+);

            fn mask() -> ComponentMask {
                ComponentMask::new()$(.with::<$t>())+
            }

            fn distinct() -> bool {
                let ids = [$(std::any::TypeId::of::<$t>(),)+];
                ids.iter()
                    .enumerate()
                    .all(|(i, a)| ids[i + 1..].iter().all(|b| a != b))
            }

            fn get(db: &EntityDatabase, entity: Entity) -> Option<Self::Shared<'_>> {
                Some(($(db.table::<$t>()?.get(entity)?,)+))
            }

            fn get_opt(db: &EntityDatabase, entity: Entity) -> Self::SharedOpt<'_> {
                ($(db.table::<$t>().and_then(|t| t.get(entity)),)+)
            }

            fn get_mut(db: &mut EntityDatabase, entity: Entity) -> Option<Self::Mut<'_>> {
                debug_assert!(Self::distinct(), "mutable query requires distinct component types");
                let db: *mut EntityDatabase = db;
                Some(($({
                    // SAFETY: every tuple element borrows a different
                    // component table (types are pairwise distinct, one table
                    // per type), so the mutable references are disjoint. The
                    // raw pointer round trip detaches each reference from the
                    // temporary database reborrow it came from.
                    let table = unsafe { &mut *db }.table_mut::<$t>()?;
                    let component: *mut $t = table.get_mut(entity)?;
                    unsafe { &mut *component }
                },)+))
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn distinctness() {
        assert!(<(A, B)>::distinct());
        assert!(!<(A, A)>::distinct());
        assert!(<(A,)>::distinct());
    }

    #[test]
    fn mask_covers_all_types() {
        let mask = <(A, B)>::mask();
        assert!(mask.get::<A>());
        assert!(mask.get::<B>());
    }
}
