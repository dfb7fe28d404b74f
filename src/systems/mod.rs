//! Reference Systems
//!
//! The systems tying the three cores together: transforms refresh first,
//! cameras follow their entities and update the frustum, then the mesh and
//! terrain systems fill the renderer queues the graph drains during
//! [`RenderGraph::execute`](crate::graph::RenderGraph::execute).

pub mod camera_system;
pub mod mesh_system;
pub mod terrain_system;
pub mod transform;

pub use camera_system::{CameraComponent, CameraSystem};
pub use mesh_system::{MeshComponent, MeshSystem};
pub use terrain_system::{TerrainComponent, TerrainSystem};
pub use transform::{TransformComponent, TransformSystem};
