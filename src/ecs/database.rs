//! Entity Database
//!
//! Holds all entities and their components, stored like a database: an
//! entity is nothing more than an identifier, and the component tables are
//! keyed by it. Systems subscribe with a [`ComponentMask`] and are notified
//! of component additions and removals that touch their mask.
//!
//! # Failure semantics
//!
//! All failures are local and sentinel-valued: a full table or an exhausted
//! id space returns `None` / [`Entity::NULL`], a missing table returns
//! `None`. Nothing in this module panics on bad input.

use std::rc::Rc;

use super::component::{Component, ComponentTypeId, component_type_id};
use super::entity::Entity;
use super::mask::ComponentMask;
use super::query::Query;
use super::system::SharedSystem;
use super::table::{AnyTable, ComponentTable, TableKind};

struct SystemEntry {
    system: SharedSystem,
    mask: ComponentMask,
}

/// The entity-component store.
///
/// Capacity is fixed at construction; [`EntityDatabase::add_entity`] returns
/// [`Entity::NULL`] once `max_entities` are live. Removed ids are recycled.
pub struct EntityDatabase {
    max_entities: usize,
    /// Ids handed out so far; index space is `0..allocated`.
    allocated: usize,
    live: usize,
    free: Vec<Entity>,
    active: Vec<bool>,
    masks: Vec<ComponentMask>,
    /// Component tables indexed by `ComponentTypeId`.
    tables: Vec<Option<Box<dyn AnyTable>>>,
    /// Registration order is notification order.
    systems: Vec<SystemEntry>,
}

impl EntityDatabase {
    /// Creates a database that can hold up to `max_entities` live entities.
    #[must_use]
    pub fn new(max_entities: usize) -> Self {
        Self {
            max_entities,
            allocated: 0,
            live: 0,
            free: Vec::new(),
            active: Vec::new(),
            masks: Vec::new(),
            tables: Vec::new(),
            systems: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.live
    }

    // ========================================================================
    // Table registration
    // ========================================================================

    /// Registers storage for component type `T`.
    ///
    /// Must be called once per type before any other use of `T`; `capacity`
    /// bounds the simultaneously live `T` components. A second registration
    /// for the same type keeps the first table.
    pub fn add_component_table<T: Component>(&mut self, capacity: usize, kind: TableKind) {
        let id = component_type_id::<T>();
        if self.tables.len() <= id {
            self.tables.resize_with(id + 1, || None);
        }
        if self.tables[id].is_some() {
            log::warn!(
                "Component table for {} already registered, keeping the first one",
                std::any::type_name::<T>()
            );
            return;
        }
        self.tables[id] = Some(Box::new(ComponentTable::<T>::new(capacity, kind)));
    }

    /// Capacity of `T`'s table, if registered.
    #[must_use]
    pub fn component_capacity<T: Component>(&self) -> Option<usize> {
        self.table::<T>().map(ComponentTable::capacity)
    }

    pub(crate) fn table<T: Component>(&self) -> Option<&ComponentTable<T>> {
        let id = component_type_id::<T>();
        self.tables.get(id)?.as_ref()?.as_any().downcast_ref()
    }

    pub(crate) fn table_mut<T: Component>(&mut self) -> Option<&mut ComponentTable<T>> {
        let id = component_type_id::<T>();
        self.tables.get_mut(id)?.as_mut()?.as_any_mut().downcast_mut()
    }

    // ========================================================================
    // System registration
    // ========================================================================

    /// Registers `system` for notifications matching `mask`.
    ///
    /// Idempotent: re-adding an already registered system just updates its
    /// mask, keeping its notification order.
    pub fn add_system(&mut self, system: SharedSystem, mask: ComponentMask) {
        if let Some(entry) = self
            .systems
            .iter_mut()
            .find(|entry| Rc::ptr_eq(&entry.system, &system))
        {
            entry.mask = mask;
            return;
        }
        self.systems.push(SystemEntry { system, mask });
    }

    /// Unregisters `system`. No-op when it was never added.
    pub fn remove_system(&mut self, system: &SharedSystem) {
        self.systems
            .retain(|entry| !Rc::ptr_eq(&entry.system, system));
    }

    /// The mask `system` registered with.
    #[must_use]
    pub fn system_mask(&self, system: &SharedSystem) -> Option<ComponentMask> {
        self.systems
            .iter()
            .find(|entry| Rc::ptr_eq(&entry.system, system))
            .map(|entry| entry.mask.clone())
    }

    /// Ticks every system in registration order: delta time first, then
    /// `update` with full database access.
    pub fn update_systems(&mut self, dt: f32) {
        // Snapshot the list so systems may register or unregister systems
        // (and mutate entities) while the tick is in flight.
        let systems: Vec<SharedSystem> = self
            .systems
            .iter()
            .map(|entry| entry.system.clone())
            .collect();
        for system in systems {
            let mut sys = system.borrow_mut();
            sys.set_delta_time(dt);
            sys.update(self);
        }
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Creates an entity, recycling a removed id when one is available.
    ///
    /// Returns [`Entity::NULL`] when `max_entities` entities are live.
    pub fn add_entity(&mut self) -> Entity {
        let entity = if let Some(entity) = self.free.pop() {
            entity
        } else if self.allocated < self.max_entities {
            let entity = Entity::from_index(self.allocated);
            self.allocated += 1;
            self.active.push(false);
            self.masks.push(ComponentMask::new());
            entity
        } else {
            return Entity::NULL;
        };

        self.active[entity.index()] = true;
        self.masks[entity.index()].clear();
        self.live += 1;
        entity
    }

    /// True when `entity` is currently live.
    #[must_use]
    pub fn is_active(&self, entity: Entity) -> bool {
        !entity.is_null() && self.active.get(entity.index()).copied().unwrap_or(false)
    }

    /// Removes `entity` and every component it owns, notifying interested
    /// systems per component, then returns the id to the free list.
    pub fn remove_entity(&mut self, entity: Entity) {
        if !self.is_active(entity) {
            return;
        }

        for type_id in 0..self.tables.len() {
            if !self.masks[entity.index()].get_id(type_id) {
                continue;
            }
            self.notify_removed(type_id, entity);
            if let Some(table) = self.tables[type_id].as_mut() {
                table.remove_entity(entity);
            }
        }

        self.masks[entity.index()].clear();
        self.active[entity.index()] = false;
        self.live -= 1;
        self.free.push(entity);
    }

    /// Visits every live entity in ascending id order.
    pub fn iterate_entities(&self, mut callback: impl FnMut(Entity)) {
        for index in 0..self.allocated {
            if self.active[index] {
                callback(Entity::from_index(index));
            }
        }
    }

    // ========================================================================
    // Component access
    // ========================================================================

    /// Adds a component to `entity`, constructed in place from `component`.
    ///
    /// On success the entity's mask bit is set and every system whose mask
    /// contains `T` receives `on_new_entity`. Returns `None` when the table
    /// is missing or full, or when `entity` is null/inactive. Adding a
    /// component the entity already has replaces the value without
    /// re-notifying.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if !self.is_active(entity) {
            return None;
        }
        let type_id = component_type_id::<T>();
        let table = self.table_mut::<T>()?;
        let was_present = table.contains(entity);
        table.insert(entity, component)?;

        if !was_present {
            self.masks[entity.index()].set_id(type_id, true);
            self.notify_added(type_id, entity);
        }
        self.table_mut::<T>().and_then(|t| t.get_mut(entity))
    }

    /// Adds an already-boxed component; boxed tables adopt the allocation.
    /// Otherwise identical to [`EntityDatabase::add_component`].
    pub fn add_boxed_component<T: Component>(
        &mut self,
        entity: Entity,
        component: Box<T>,
    ) -> Option<&mut T> {
        if !self.is_active(entity) {
            return None;
        }
        let type_id = component_type_id::<T>();
        let table = self.table_mut::<T>()?;
        let was_present = table.contains(entity);
        table.insert_boxed(entity, component)?;

        if !was_present {
            self.masks[entity.index()].set_id(type_id, true);
            self.notify_added(type_id, entity);
        }
        self.table_mut::<T>().and_then(|t| t.get_mut(entity))
    }

    /// Notifies interested systems, then erases the component and clears the
    /// mask bit. No-op when absent.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        if !self.is_active(entity) {
            return;
        }
        let type_id = component_type_id::<T>();
        if !self.masks[entity.index()].get_id(type_id) {
            return;
        }
        self.notify_removed(type_id, entity);
        if let Some(table) = self.table_mut::<T>() {
            table.remove(entity);
        }
        self.masks[entity.index()].set_id(type_id, false);
    }

    /// True when `entity` owns a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_active(entity) && self.masks[entity.index()].get_id(component_type_id::<T>())
    }

    /// True when `entity` owns every component in the query tuple.
    #[must_use]
    pub fn has_components<Q: Query>(&self, entity: Entity) -> bool {
        self.is_active(entity) && self.masks[entity.index()].contains_all(&Q::mask())
    }

    /// Reference to `entity`'s `T`, if present.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.table::<T>()?.get(entity)
    }

    /// Mutable reference to `entity`'s `T`, if present.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.table_mut::<T>()?.get_mut(entity)
    }

    /// Per-component optional references for the query tuple, e.g.
    /// `let (a, b) = db.get_components::<(A, B)>(entity);`.
    #[must_use]
    pub fn get_components<Q: Query>(&self, entity: Entity) -> Q::SharedOpt<'_> {
        Q::get_opt(self, entity)
    }

    /// Mutable references to every component in the tuple, or `None` when
    /// any is missing. Component types must be pairwise distinct.
    #[must_use]
    pub fn get_components_mut<Q: Query>(&mut self, entity: Entity) -> Option<Q::Mut<'_>> {
        if !Q::distinct() {
            log::warn!("get_components_mut called with repeated component types");
            return None;
        }
        Q::get_mut(self, entity)
    }

    /// Reverse lookup: the entity owning a live component reference.
    #[must_use]
    pub fn entity_of<T: Component>(&self, component: &T) -> Entity {
        self.table::<T>()
            .map_or(Entity::NULL, |table| table.entity_of(component))
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Visits every live entity owning all components of the tuple, in
    /// ascending entity order.
    pub fn iterate_components<Q: Query>(&self, mut callback: impl FnMut(Entity, Q::Shared<'_>)) {
        let mask = Q::mask();
        for index in 0..self.allocated {
            if !self.active[index] || !self.masks[index].contains_all(&mask) {
                continue;
            }
            let entity = Entity::from_index(index);
            if let Some(refs) = Q::get(self, entity) {
                callback(entity, refs);
            }
        }
    }

    /// Mutable variant of [`EntityDatabase::iterate_components`].
    pub fn iterate_components_mut<Q: Query>(
        &mut self,
        mut callback: impl FnMut(Entity, Q::Mut<'_>),
    ) {
        if !Q::distinct() {
            log::warn!("iterate_components_mut called with repeated component types");
            return;
        }
        let mask = Q::mask();
        let matching: Vec<Entity> = (0..self.allocated)
            .filter(|&index| self.active[index] && self.masks[index].contains_all(&mask))
            .map(Entity::from_index)
            .collect();
        for entity in matching {
            if let Some(refs) = Q::get_mut(self, entity) {
                callback(entity, refs);
            }
        }
    }

    // ========================================================================
    // Notification
    // ========================================================================

    fn notify_added(&self, type_id: ComponentTypeId, entity: Entity) {
        for entry in &self.systems {
            if !entry.mask.get_id(type_id) {
                continue;
            }
            // A system triggering the add from inside its own update is
            // already borrowed; its notification is skipped.
            match entry.system.try_borrow_mut() {
                Ok(mut system) => system.on_new_entity(entity),
                Err(_) => log::debug!("skipping re-entrant on_new_entity for {entity}"),
            }
        }
    }

    fn notify_removed(&self, type_id: ComponentTypeId, entity: Entity) {
        for entry in &self.systems {
            if !entry.mask.get_id(type_id) {
                continue;
            }
            match entry.system.try_borrow_mut() {
                Ok(mut system) => system.on_removed_entity(entity),
                Err(_) => log::debug!("skipping re-entrant on_removed_entity for {entity}"),
            }
        }
    }
}

impl std::fmt::Debug for EntityDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDatabase")
            .field("max_entities", &self.max_entities)
            .field("live", &self.live)
            .field("tables", &self.tables.iter().filter(|t| t.is_some()).count())
            .field("systems", &self.systems.len())
            .finish()
    }
}