//! Transform Component and System
//!
//! Flat TRS transform per entity. The system refreshes dirty world
//! matrices once per frame, before the submitting systems read them.

use glam::{Mat4, Quat, Vec3};

use crate::ecs::{ComponentMask, Entity, EntityDatabase, System};

/// Translation, rotation and scale with a cached world matrix.
pub struct TransformComponent {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    world: Mat4,
    dirty: bool,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformComponent {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.dirty = true;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self.dirty = true;
        self
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Last computed world matrix; refreshed by the transform system (or
    /// eagerly via [`TransformComponent::update_world`]).
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Recomputes the world matrix if dirty. Returns true when it changed.
    pub fn update_world(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.world = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.dirty = false;
        true
    }
}

/// Refreshes every dirty transform once per frame.
#[derive(Default)]
pub struct TransformSystem;

impl TransformSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// The mask this system registers with.
    #[must_use]
    pub fn mask() -> ComponentMask {
        ComponentMask::new().with::<TransformComponent>()
    }
}

impl System for TransformSystem {
    fn name(&self) -> &str {
        "TransformSystem"
    }

    fn on_new_entity(&mut self, entity: Entity) {
        log::debug!("TransformSystem: new entity {entity}");
    }

    fn update(&mut self, db: &mut EntityDatabase) {
        db.iterate_components_mut::<(TransformComponent,)>(|_, (transform,)| {
            transform.update_world();
        });
    }
}
