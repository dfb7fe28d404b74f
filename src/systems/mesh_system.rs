//! Mesh System
//!
//! Pushes each visible mesh entity's world matrix into its renderable and
//! submits it to the mesh renderer queue once per pass. Entities are
//! tracked through the database notifications rather than re-queried.

use std::rc::Rc;

use crate::ecs::{ComponentMask, Entity, EntityDatabase, System};
use crate::render::pass::SharedPass;
use crate::render::queue::SharedQueue;
use crate::render::renderable::{MeshRenderable, SharedRenderable};

use super::transform::TransformComponent;

/// A drawable mesh attached to an entity.
pub struct MeshComponent {
    pub renderable: Rc<MeshRenderable>,
    /// Passes the mesh is drawn under in the main graph.
    pub passes: Vec<SharedPass>,
    /// Depth pass for the shadow sub-graph, when the mesh casts shadows.
    pub shadow_pass: Option<SharedPass>,
    pub visible: bool,
}

impl MeshComponent {
    #[must_use]
    pub fn new(renderable: Rc<MeshRenderable>, pass: SharedPass) -> Self {
        Self {
            renderable,
            passes: vec![pass],
            shadow_pass: None,
            visible: true,
        }
    }

    #[must_use]
    pub fn casting_shadows(mut self, shadow_pass: SharedPass) -> Self {
        self.shadow_pass = Some(shadow_pass);
        self
    }
}

/// Feeds the mesh renderer (and optionally the shadow sub-graph).
pub struct MeshSystem {
    entities: Vec<Entity>,
    queue: SharedQueue,
    shadow_queue: Option<SharedQueue>,
}

impl MeshSystem {
    #[must_use]
    pub fn new(queue: SharedQueue) -> Self {
        Self {
            entities: Vec::new(),
            queue,
            shadow_queue: None,
        }
    }

    #[must_use]
    pub fn with_shadow_queue(mut self, queue: SharedQueue) -> Self {
        self.shadow_queue = Some(queue);
        self
    }

    #[must_use]
    pub fn mask() -> ComponentMask {
        ComponentMask::new().with::<MeshComponent>()
    }
}

impl System for MeshSystem {
    fn name(&self) -> &str {
        "MeshSystem"
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
            let (transform, mesh) =
                db.get_components::<(TransformComponent, MeshComponent)>(entity);
            let (Some(transform), Some(mesh)) = (transform, mesh) else {
                continue;
            };
            if !mesh.visible {
                continue;
            }

            mesh.renderable.set_model_matrix(transform.world_matrix());

            let renderable: SharedRenderable = mesh.renderable.clone();
            let mut queue = self.queue.borrow_mut();
            for pass in &mesh.passes {
                queue.submit(renderable.clone(), pass.clone());
            }
            drop(queue);

            if let (Some(shadow_queue), Some(shadow_pass)) =
                (&self.shadow_queue, &mesh.shadow_pass)
            {
                shadow_queue
                    .borrow_mut()
                    .submit(renderable.clone(), shadow_pass.clone());
            }
        }
    }
}
