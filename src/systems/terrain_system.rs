//! Terrain System
//!
//! Moves each terrain's quadtree focus to the active camera and submits
//! the resulting leaves to the terrain renderer (and shadow sub-graph)
//! queues.

use crate::ecs::{ComponentMask, Entity, EntityDatabase, System};
use crate::render::pass::SharedPass;
use crate::render::terrain_renderer::{SharedTerrainQueue, TerrainLeaf};
use crate::terrain::RenderableTerrain;

use super::camera_system::CameraSystem;

/// A terrain attached to an entity. Terrain lives at the world origin of
/// its entity; the quadtree works in the terrain's local space.
pub struct TerrainComponent {
    pub terrain: RenderableTerrain,
    pub pass: SharedPass,
    pub shadow_pass: Option<SharedPass>,
}

impl TerrainComponent {
    #[must_use]
    pub fn new(terrain: RenderableTerrain, pass: SharedPass) -> Self {
        Self {
            terrain,
            pass,
            shadow_pass: None,
        }
    }

    #[must_use]
    pub fn casting_shadows(mut self, shadow_pass: SharedPass) -> Self {
        self.shadow_pass = Some(shadow_pass);
        self
    }
}

/// Feeds the terrain renderer from the quadtree.
pub struct TerrainSystem {
    entities: Vec<Entity>,
    queue: SharedTerrainQueue,
    shadow_queue: Option<SharedTerrainQueue>,
}

impl TerrainSystem {
    #[must_use]
    pub fn new(queue: SharedTerrainQueue) -> Self {
        Self {
            entities: Vec::new(),
            queue,
            shadow_queue: None,
        }
    }

    #[must_use]
    pub fn with_shadow_queue(mut self, queue: SharedTerrainQueue) -> Self {
        self.shadow_queue = Some(queue);
        self
    }

    #[must_use]
    pub fn mask() -> ComponentMask {
        ComponentMask::new().with::<TerrainComponent>()
    }
}

impl System for TerrainSystem {
    fn name(&self) -> &str {
        "TerrainSystem"
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
        let camera_position = CameraSystem::active_camera_position(db);

        for &entity in &self.entities {
            let Some((terrain,)) = db.get_components_mut::<(TerrainComponent,)>(entity) else {
                continue;
            };

            if let Some(position) = camera_position {
                terrain.terrain.update_focus(position);
            }

            let pass = terrain.pass.clone();
            let shadow_pass = terrain.shadow_pass.clone();
            let mut queue = self.queue.borrow_mut();
            let mut shadow_queue = self
                .shadow_queue
                .as_ref()
                .map(|q| q.borrow_mut());

            terrain.terrain.quad_tree().for_each_leaf(|leaf| {
                let leaf = TerrainLeaf::from(leaf);
                queue.submit(leaf, pass.clone());
                if let (Some(shadow_queue), Some(shadow_pass)) =
                    (shadow_queue.as_mut(), shadow_pass.as_ref())
                {
                    shadow_queue.submit(leaf, shadow_pass.clone());
                }
            });
        }
    }
}
