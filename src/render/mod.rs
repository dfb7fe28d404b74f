//! Renderer Node Family
//!
//! The render-graph nodes that turn queued submissions into draws:
//! mesh, terrain, particle and 2D renderers, plus the clear/viewport
//! utility nodes and the shadow sub-graph. All of them share the
//! submit → sort → render → clear skeleton of [`queue::RenderQueue`].

pub mod camera;
pub mod fb_clear;
pub mod filter;
pub mod mesh_renderer;
pub mod particle_renderer;
pub mod pass;
pub mod queue;
pub mod renderable;
pub mod renderer2d;
pub mod shadow;
pub mod terrain_renderer;
pub mod viewport;

pub use camera::{Camera, Projection};
pub use fb_clear::FbClearNode;
pub use filter::{Filter, FrustumFilter, SharedFilter};
pub use mesh_renderer::MeshRenderer;
pub use particle_renderer::ParticleRenderer;
pub use pass::{Pass, SharedPass};
pub use queue::{DrawMode, RenderQueue, SharedQueue};
pub use renderable::{MeshRenderable, Renderable3D, SharedRenderable};
pub use renderer2d::{Quad2D, Renderer2D, Renderer2DQueue};
pub use shadow::{MAX_SHADOWS, MergeShadowsNode, ShadowSubGraph};
pub use terrain_renderer::{
    SharedTerrainQueue, TerrainInstance, TerrainLeaf, TerrainPatchSet, TerrainQueue,
    TerrainRenderer, TerrainVertex,
};
pub use viewport::ViewportNode;
