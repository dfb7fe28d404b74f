//! Renderable Terrain
//!
//! Couples a [`QuadTree`] with the world-space parameters the terrain
//! renderer needs: the side length lives in the tree, the height range
//! here. Attached to an entity as a component and fed by the terrain
//! system every frame.

use glam::Vec3;

use super::quad_tree::QuadTree;

/// A terrain patch field driven by a quadtree.
pub struct RenderableTerrain {
    quad_tree: QuadTree,
    max_height: f32,
}

impl RenderableTerrain {
    #[must_use]
    pub fn new(size: f32, max_height: f32, lod_distances: Vec<f32>) -> Self {
        Self {
            quad_tree: QuadTree::new(size, lod_distances),
            max_height,
        }
    }

    #[must_use]
    pub fn quad_tree(&self) -> &QuadTree {
        &self.quad_tree
    }

    #[must_use]
    pub fn quad_tree_mut(&mut self) -> &mut QuadTree {
        &mut self.quad_tree
    }

    #[must_use]
    pub fn size(&self) -> f32 {
        self.quad_tree.size()
    }

    #[must_use]
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Moves the highest-LOD focus (local space), reshaping the tree.
    pub fn update_focus(&mut self, position: Vec3) {
        self.quad_tree.update_highest_lod_location(position);
    }

    /// Local-space AABB of the whole terrain.
    #[must_use]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = self.quad_tree.size() * 0.5;
        (
            Vec3::new(-half, -self.max_height, -half),
            Vec3::new(half, self.max_height, half),
        )
    }
}
