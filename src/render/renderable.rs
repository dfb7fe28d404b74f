//! Renderables
//!
//! A [`Renderable3D`] is anything with an AABB and a draw operation. The
//! trait is the seam between the entity side (systems own renderables as
//! components) and the graph side (renderer nodes queue and draw them).

use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::graphics::{Bindable, GraphicsState, Mesh, PrimitiveType, UniformVariable};

/// An object with world-space bounds and a draw operation under a pass.
pub trait Renderable3D: 'static {
    /// World-space axis-aligned bounds `(min, max)`.
    fn bounds(&self) -> (Vec3, Vec3);

    /// Records the draw. The pass is already bound.
    fn draw(&self, state: &mut GraphicsState);

    /// Instanced variant; defaults to the plain draw. Particle systems
    /// override this.
    fn draw_instances(&self, state: &mut GraphicsState) {
        self.draw(state);
    }
}

/// Shared handle under which renderables are submitted and queued.
pub type SharedRenderable = Rc<dyn Renderable3D>;

/// The common case: an indexed triangle mesh with a model matrix.
///
/// The model matrix uniform binds per draw (passes bind per batch), and the
/// world bounds are the local bounds pushed through the current matrix.
pub struct MeshRenderable {
    mesh: Arc<Mesh>,
    local_bounds: (Vec3, Vec3),
    model: Arc<UniformVariable<Mat4>>,
}

impl MeshRenderable {
    #[must_use]
    pub fn new(mesh: Arc<Mesh>, local_bounds: (Vec3, Vec3)) -> Self {
        Self {
            mesh,
            local_bounds,
            model: Arc::new(UniformVariable::new("u_model", Mat4::IDENTITY)),
        }
    }

    #[must_use]
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// The model matrix uniform, shared with whoever animates it.
    #[must_use]
    pub fn model(&self) -> &Arc<UniformVariable<Mat4>> {
        &self.model
    }

    pub fn set_model_matrix(&self, model: Mat4) {
        self.model.set_value(model);
    }
}

impl Renderable3D for MeshRenderable {
    fn bounds(&self) -> (Vec3, Vec3) {
        // Transform the eight local corners and re-wrap them.
        let (min, max) = self.local_bounds;
        let model = self.model.value();
        let mut world_min = Vec3::splat(f32::INFINITY);
        let mut world_max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            let world = model.transform_point3(corner);
            world_min = world_min.min(world);
            world_max = world_max.max(world);
        }
        (world_min, world_max)
    }

    fn draw(&self, state: &mut GraphicsState) {
        self.model.bind(state);
        self.mesh.draw(state, PrimitiveType::Triangles);
    }
}
