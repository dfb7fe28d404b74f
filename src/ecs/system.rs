//! System Trait
//!
//! A System subscribes to the database with a [`ComponentMask`] and is
//! notified whenever a component in its mask is added to or removed from an
//! entity. Once per frame the host drives
//! [`EntityDatabase::update_systems`], which ticks every system in
//! registration order.
//!
//! [`ComponentMask`]: crate::ecs::ComponentMask
//! [`EntityDatabase::update_systems`]: crate::ecs::EntityDatabase::update_systems

use std::cell::RefCell;
use std::rc::Rc;

use super::database::EntityDatabase;
use super::entity::Entity;

/// Per-frame processor of entities matching a component mask.
///
/// Notification callbacks receive only the entity: the database is mid
/// mutation when they fire, so systems record the entity and act on it
/// during [`System::update`], which has full database access.
pub trait System {
    /// Name used in logs.
    fn name(&self) -> &str {
        "System"
    }

    /// A component in this system's mask was added to `entity`.
    ///
    /// Fired once per component add edge, after the component is queryable.
    fn on_new_entity(&mut self, _entity: Entity) {}

    /// A component in this system's mask is about to be removed from
    /// `entity`. Fired once per component remove edge, while the component
    /// is still queryable.
    fn on_removed_entity(&mut self, _entity: Entity) {}

    /// Receives the frame delta time, in seconds, before `update`.
    fn set_delta_time(&mut self, _dt: f32) {}

    /// Per-frame tick with full database access.
    fn update(&mut self, _db: &mut EntityDatabase) {}
}

/// Shared ownership handle under which systems are registered.
///
/// The database and the host both hold the system; `Rc` identity is what
/// makes `add_system` idempotent and `remove_system` precise.
pub type SharedSystem = Rc<RefCell<dyn System>>;
