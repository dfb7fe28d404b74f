//! Mesh Renderer Node
//!
//! Draws indexed-triangle renderables queued by the mesh system. The node
//! passes its target framebuffer through (`target` in → `target` out) so
//! downstream nodes inherit it, and exposes attach ports for pure ordering
//! edges.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::filter::SharedFilter;
use super::pass::SharedPass;
use super::queue::{DrawMode, RenderQueue, SharedQueue};
use super::renderable::SharedRenderable;
use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::FrameBuffer;

/// Slot holding the target framebuffer (imported, re-exposed, auto-bound).
pub const TARGET_SLOT: usize = 0;

/// Queue-draining node for mesh renderables.
pub struct MeshRenderer {
    queue: SharedQueue,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(RenderQueue::new(DrawMode::Single))),
        }
    }

    /// Submission handle for systems. Clone it before handing the renderer
    /// to the graph.
    #[must_use]
    pub fn queue(&self) -> SharedQueue {
        self.queue.clone()
    }

    /// Filters, then queues. Convenience over the shared queue.
    pub fn submit(&self, renderable: SharedRenderable, pass: SharedPass) {
        self.queue.borrow_mut().submit(renderable, pass);
    }

    pub fn add_filter(&self, filter: SharedFilter) {
        self.queue.borrow_mut().add_filter(filter);
    }
}

impl RenderNode for MeshRenderer {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new()
            .slot(None, true)
            .input::<FrameBuffer>("target", TARGET_SLOT)
            .output::<FrameBuffer>("target", TARGET_SLOT)
            .attach_input("attach")
            .attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        let mut queue = self.queue.borrow_mut();
        queue.sort();
        queue.render(ctx.state);
        queue.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
