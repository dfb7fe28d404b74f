//! Particle Renderer Node
//!
//! Identical skeleton to the mesh renderer, but entries draw through
//! [`Renderable3D::draw_instances`] so a whole particle system goes out as
//! one instanced draw.
//!
//! [`Renderable3D::draw_instances`]: super::renderable::Renderable3D::draw_instances

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::filter::SharedFilter;
use super::pass::SharedPass;
use super::queue::{DrawMode, RenderQueue, SharedQueue};
use super::renderable::SharedRenderable;
use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::FrameBuffer;

use super::mesh_renderer::TARGET_SLOT;

/// Queue-draining node for instanced particle renderables.
pub struct ParticleRenderer {
    queue: SharedQueue,
}

impl Default for ParticleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(RenderQueue::new(DrawMode::Instanced))),
        }
    }

    #[must_use]
    pub fn queue(&self) -> SharedQueue {
        self.queue.clone()
    }

    pub fn submit(&self, renderable: SharedRenderable, pass: SharedPass) {
        self.queue.borrow_mut().submit(renderable, pass);
    }

    pub fn add_filter(&self, filter: SharedFilter) {
        self.queue.borrow_mut().add_filter(filter);
    }
}

impl RenderNode for ParticleRenderer {
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
