//! Framebuffer Clear Node
//!
//! Clears the framebuffer flowing through its `target` port. The target is
//! auto-bound around execution, so the node body is a single clear.

use std::any::Any;

use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::FrameBuffer;

use super::mesh_renderer::TARGET_SLOT;

/// Clears color and/or depth of the pass-through target.
pub struct FbClearNode {
    color: Option<[f64; 4]>,
    depth: bool,
}

impl FbClearNode {
    /// Clears both color and depth.
    #[must_use]
    pub fn new(color: [f64; 4]) -> Self {
        Self {
            color: Some(color),
            depth: true,
        }
    }

    /// Depth-only clear (shadow map targets).
    #[must_use]
    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: true,
        }
    }

    pub fn set_color(&mut self, color: Option<[f64; 4]>) {
        self.color = color;
    }
}

impl RenderNode for FbClearNode {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new()
            .slot(None, true)
            .input::<FrameBuffer>("target", TARGET_SLOT)
            .output::<FrameBuffer>("target", TARGET_SLOT)
            .attach_input("attach")
            .attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        ctx.state.clear(self.color, self.depth);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
