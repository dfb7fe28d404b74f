//! Camera System
//!
//! Keeps every camera's view matrix in sync with its entity's transform
//! and refreshes the shared frustum filter from the active camera.

use std::rc::Rc;

use crate::ecs::{ComponentMask, Entity, EntityDatabase, System};
use crate::render::camera::Camera;
use crate::render::filter::FrustumFilter;

use super::transform::TransformComponent;

/// A camera attached to an entity. At most one should be active.
pub struct CameraComponent {
    pub camera: Camera,
    pub active: bool,
}

impl CameraComponent {
    #[must_use]
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            active: false,
        }
    }

    #[must_use]
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

/// Syncs cameras with transforms and feeds the frustum filter.
pub struct CameraSystem {
    entities: Vec<Entity>,
    frustum: Rc<FrustumFilter>,
}

impl CameraSystem {
    #[must_use]
    pub fn new(frustum: Rc<FrustumFilter>) -> Self {
        Self {
            entities: Vec::new(),
            frustum,
        }
    }

    #[must_use]
    pub fn mask() -> ComponentMask {
        ComponentMask::new().with::<CameraComponent>()
    }

    /// Position of the active camera, if any.
    #[must_use]
    pub fn active_camera_position(db: &EntityDatabase) -> Option<glam::Vec3> {
        let mut position = None;
        db.iterate_components::<(TransformComponent, CameraComponent)>(|_, (t, c)| {
            if c.active && position.is_none() {
                position = Some(t.position());
            }
        });
        position
    }
}

impl System for CameraSystem {
    fn name(&self) -> &str {
        "CameraSystem"
    }

    fn on_new_entity(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    fn on_removed_entity(&mut self, entity: Entity) {
        self.entities.retain(|&e| e != entity);
    }

    fn update(&mut self, db: &mut EntityDatabase) {
        for &entity in &self.entities {
            let Some((transform, camera)) =
                db.get_components_mut::<(TransformComponent, CameraComponent)>(entity)
            else {
                continue;
            };
            camera.camera.update_view(transform.world_matrix());
            if camera.active {
                self.frustum.update_frustum(camera.camera.view_projection());
            }
        }
    }
}
