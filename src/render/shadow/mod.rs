//! Shadow Rendering
//!
//! Two cooperating nodes:
//! - [`ShadowSubGraph`]: renders terrain and mesh casters into one depth
//!   target per active light, exposing the depth textures as outputs.
//! - [`MergeShadowsNode`]: combines every shadow map into a single
//!   screen-space shadow texture from the camera's point of view.

pub mod merge;

pub use merge::MergeShadowsNode;

use std::any::Any;
use std::sync::Arc;

use glam::Mat4;

use super::queue::{DrawMode, RenderQueue, SharedQueue};
use super::terrain_renderer::{SharedTerrainQueue, TerrainPatchSet, TerrainQueue};
use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::{
    AttachmentPoint, Bindable, ColorFormat, FrameBuffer, Texture, TextureFilter, TextureWrap,
    UniformVariable,
};

/// Maximum number of shadow casters rendered in a single frame.
pub const MAX_SHADOWS: usize = 14;

struct ShadowSlot {
    active: bool,
    view_projection: Mat4,
    target: Arc<FrameBuffer>,
}

/// Depth-renders all shadow casters, one pass per active light.
///
/// An internal mini-graph in the spirit of the outer one: the same caster
/// queues are replayed once per light with the light's view-projection in
/// the shared [`ShadowSubGraph::light_vp`] uniform, into that light's depth
/// target. The depth textures come out as `shadow0..shadowN` outputs.
pub struct ShadowSubGraph {
    shadows: Vec<ShadowSlot>,
    depth_textures: Vec<Arc<Texture>>,
    mesh_queue: SharedQueue,
    terrain_queue: SharedTerrainQueue,
    patches: TerrainPatchSet,
    light_vp: Arc<UniformVariable<Mat4>>,
}

impl ShadowSubGraph {
    /// Creates the sub-graph with `resolution`² depth targets.
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        let mut shadows = Vec::with_capacity(MAX_SHADOWS);
        let mut depth_textures = Vec::with_capacity(MAX_SHADOWS);
        for i in 0..MAX_SHADOWS {
            let texture = Arc::new(
                Texture::new(
                    &format!("shadow-depth-{i}"),
                    resolution,
                    resolution,
                    ColorFormat::Depth32Float,
                )
                .with_wrap(TextureWrap::ClampToEdge, TextureWrap::ClampToEdge)
                .with_filter(TextureFilter::Nearest, TextureFilter::Nearest),
            );
            let target = Arc::new(
                FrameBuffer::new(&format!("shadow-target-{i}"))
                    .attach(AttachmentPoint::Depth, texture.clone()),
            );
            depth_textures.push(texture);
            shadows.push(ShadowSlot {
                active: false,
                view_projection: Mat4::IDENTITY,
                target,
            });
        }

        Self {
            shadows,
            depth_textures,
            mesh_queue: std::rc::Rc::new(std::cell::RefCell::new(RenderQueue::new(
                DrawMode::Single,
            ))),
            terrain_queue: std::rc::Rc::new(std::cell::RefCell::new(TerrainQueue::new())),
            patches: TerrainPatchSet::new(),
            light_vp: Arc::new(UniformVariable::new("u_light_view_projection", Mat4::IDENTITY)),
        }
    }

    /// Caster queue for meshes; systems submit with depth-only passes.
    #[must_use]
    pub fn mesh_queue(&self) -> SharedQueue {
        self.mesh_queue.clone()
    }

    /// Caster queue for terrain leaves.
    #[must_use]
    pub fn terrain_queue(&self) -> SharedTerrainQueue {
        self.terrain_queue.clone()
    }

    /// The light view-projection uniform shadow passes must include: its
    /// value is rewritten per light during execution.
    #[must_use]
    pub fn light_vp(&self) -> Arc<UniformVariable<Mat4>> {
        self.light_vp.clone()
    }

    /// Depth texture of shadow `index`, also available as output
    /// `shadow{index}`.
    #[must_use]
    pub fn depth_texture(&self, index: usize) -> Option<&Arc<Texture>> {
        self.depth_textures.get(index)
    }

    /// Activates shadow `index` with the light's view-projection.
    pub fn enable_shadow(&mut self, index: usize, view_projection: Mat4) {
        if let Some(shadow) = self.shadows.get_mut(index) {
            shadow.active = true;
            shadow.view_projection = view_projection;
        } else {
            log::warn!("enable_shadow: index {index} out of range (max {MAX_SHADOWS})");
        }
    }

    pub fn disable_shadow(&mut self, index: usize) {
        if let Some(shadow) = self.shadows.get_mut(index) {
            shadow.active = false;
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.shadows.iter().filter(|s| s.active).count()
    }
}

impl RenderNode for ShadowSubGraph {
    fn spec(&self) -> NodeSpec {
        let mut spec = NodeSpec::new().attach_output("attach");
        for (i, texture) in self.depth_textures.iter().enumerate() {
            spec = spec
                .slot(Some(texture.clone()), false)
                .output::<Texture>(&format!("shadow{i}"), i);
        }
        spec
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        let mut mesh_queue = self.mesh_queue.borrow_mut();
        let mut terrain_queue = self.terrain_queue.borrow_mut();
        if self.shadows.iter().any(|s| s.active) {
            mesh_queue.sort();
            terrain_queue.sort();

            for shadow in self.shadows.iter().filter(|s| s.active) {
                self.light_vp.set_value(shadow.view_projection);

                shadow.target.bind(ctx.state);
                ctx.state.clear(None, true);
                mesh_queue.render(ctx.state);
                self.patches.draw_queue(ctx.state, terrain_queue.entries());
                shadow.target.unbind(ctx.state);
            }
        }
        mesh_queue.clear();
        terrain_queue.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
