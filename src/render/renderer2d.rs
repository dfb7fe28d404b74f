//! 2D Renderer Node
//!
//! Orthographic batch renderer for UI quads. Submissions are plain values
//! (position, size, z-index, color); the node sorts by z-index then pass,
//! and draws each pass run as one instanced draw of a unit quad.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::pass::SharedPass;
use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::{Bindable, FrameBuffer, Mesh, PrimitiveType, UniformVariable};

use super::mesh_renderer::TARGET_SLOT;

/// One screen-space quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Quad2D {
    /// Top-left corner, pixels.
    pub position: [f32; 2],
    /// Width and height, pixels.
    pub size: [f32; 2],
    /// RGBA tint.
    pub color: [f32; 4],
}

/// Queue entry pairing a quad with its z order.
#[derive(Clone)]
struct Entry {
    quad: Quad2D,
    z_index: i32,
    pass: SharedPass,
}

/// Orthographic batch renderer.
pub struct Renderer2D {
    entries: Rc<RefCell<Vec<Entry>>>,
    unit_quad: Mesh,
    projection: Arc<UniformVariable<Mat4>>,
    batch: Vec<Quad2D>,
}

/// Submission handle for UI systems.
#[derive(Clone)]
pub struct Renderer2DQueue {
    entries: Rc<RefCell<Vec<Entry>>>,
}

impl Renderer2DQueue {
    pub fn submit(&self, quad: Quad2D, z_index: i32, pass: SharedPass) {
        self.entries.borrow_mut().push(Entry {
            quad,
            z_index,
            pass,
        });
    }
}

impl Default for Renderer2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer2D {
    #[must_use]
    pub fn new() -> Self {
        // Unit quad in [0, 1]^2, instanced per submission.
        #[repr(C)]
        #[derive(Clone, Copy, Pod, Zeroable)]
        struct QuadVertex {
            position: [f32; 2],
        }
        let vertices = [
            QuadVertex { position: [0.0, 0.0] },
            QuadVertex { position: [1.0, 0.0] },
            QuadVertex { position: [1.0, 1.0] },
            QuadVertex { position: [0.0, 1.0] },
        ];
        let unit_quad =
            Mesh::from_vertices("renderer2d-quad", &vertices).with_indices(vec![0, 1, 2, 0, 2, 3]);

        Self {
            entries: Rc::new(RefCell::new(Vec::with_capacity(128))),
            unit_quad,
            projection: Arc::new(UniformVariable::new("u_projection", Mat4::IDENTITY)),
            batch: Vec::with_capacity(128),
        }
    }

    #[must_use]
    pub fn queue(&self) -> Renderer2DQueue {
        Renderer2DQueue {
            entries: self.entries.clone(),
        }
    }

    /// Sets the pixel-space orthographic projection (origin top-left).
    pub fn set_resolution(&self, width: f32, height: f32) {
        self.projection
            .set_value(Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0));
    }
}

impl RenderNode for Renderer2D {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new()
            .slot(None, true)
            .input::<FrameBuffer>("target", TARGET_SLOT)
            .output::<FrameBuffer>("target", TARGET_SLOT)
            .attach_input("attach")
            .attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        let Self {
            entries,
            unit_quad,
            projection,
            batch,
        } = self;

        fn flush(
            batch: &mut Vec<Quad2D>,
            unit_quad: &Mesh,
            state: &mut crate::graphics::GraphicsState,
        ) {
            if !batch.is_empty() {
                unit_quad.draw_instanced(state, PrimitiveType::Triangles, batch);
                batch.clear();
            }
        }

        let mut entries = entries.borrow_mut();
        if entries.is_empty() {
            return;
        }
        // Z first so overlaps draw back to front, pass second to batch.
        entries.sort_by_key(|e| (e.z_index, e.pass.id()));

        let state = &mut *ctx.state;
        let mut current: Option<SharedPass> = None;
        for entry in entries.iter() {
            let same = current.as_ref().is_some_and(|p| p.id() == entry.pass.id());
            if !same {
                if let Some(previous) = current.take() {
                    flush(batch, unit_quad, state);
                    previous.unbind(state);
                }
                entry.pass.bind(state);
                projection.bind(state);
                current = Some(entry.pass.clone());
            }
            batch.push(entry.quad);
        }
        if let Some(previous) = current.take() {
            flush(batch, unit_quad, state);
            previous.unbind(state);
        }
        entries.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
