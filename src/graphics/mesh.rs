//! Mesh Resource
//!
//! Vertex and index data in CPU memory, uploaded once by the backend.
//! Meshes drawn with per-instance attributes (terrain patches, particles)
//! stream their instance data through the frame's command stream instead.

use bytemuck::Pod;

use super::bindable::{Bindable, ResourceId, next_resource_id};
use super::constants::PrimitiveType;
use super::state::GraphicsState;

/// Geometry of a renderable: one interleaved vertex buffer plus an optional
/// index buffer.
pub struct Mesh {
    id: ResourceId,
    label: String,
    vertex_data: Vec<u8>,
    vertex_stride: u32,
    vertex_count: u32,
    indices: Option<Vec<u32>>,
}

impl Mesh {
    /// Builds a mesh from a slice of vertex structs.
    #[must_use]
    pub fn from_vertices<V: Pod>(label: &str, vertices: &[V]) -> Self {
        Self {
            id: next_resource_id(),
            label: label.to_string(),
            vertex_data: bytemuck::cast_slice(vertices).to_vec(),
            vertex_stride: size_of::<V>() as u32,
            vertex_count: vertices.len() as u32,
            indices: None,
        }
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    #[must_use]
    pub fn vertex_stride(&self) -> u32 {
        self.vertex_stride
    }

    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Number of elements a draw covers: indices when indexed, vertices
    /// otherwise.
    #[must_use]
    pub fn element_count(&self) -> u32 {
        self.indices
            .as_ref()
            .map_or(self.vertex_count, |i| i.len() as u32)
    }

    /// Records a single-instance draw of this mesh.
    pub fn draw(&self, state: &mut GraphicsState, primitive: PrimitiveType) {
        state.bind_mesh(self.id);
        state.draw(self.id, primitive, 1);
    }

    /// Records an instanced draw. `instance_data` replaces the mesh's
    /// per-instance buffer for this frame.
    pub fn draw_instanced<I: Pod>(
        &self,
        state: &mut GraphicsState,
        primitive: PrimitiveType,
        instance_data: &[I],
    ) {
        if instance_data.is_empty() {
            return;
        }
        state.bind_mesh(self.id);
        state.upload_instances(
            self.id,
            bytemuck::cast_slice(instance_data).to_vec(),
            instance_data.len() as u32,
        );
        state.draw(self.id, primitive, instance_data.len() as u32);
    }
}

impl Bindable for Mesh {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, state: &mut GraphicsState) {
        state.bind_mesh(self.id);
    }

    fn unbind(&self, state: &mut GraphicsState) {
        state.unbind_mesh(self.id);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
