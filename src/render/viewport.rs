//! Viewport Resolution Node
//!
//! Sets the viewport rectangle for everything downstream of its attach
//! edge. The host updates the dimensions on window resize.

use std::any::Any;

use crate::graph::{NodeContext, NodeSpec, RenderNode};

/// Emits a viewport command each frame.
pub struct ViewportNode {
    width: u32,
    height: u32,
}

impl ViewportNode {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl RenderNode for ViewportNode {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new().attach_input("attach").attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        ctx.state.set_viewport(0, 0, self.width, self.height);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
