//! Shared-Resource Node
//!
//! Every graph starts with one [`ResourcesNode`] named `"resources"`. It
//! performs no work of its own; it exists to own the graph's shared GPU
//! resources (default framebuffer, shared textures, light-probe maps) and
//! expose them as outputs other nodes import. The host grows it with
//! [`RenderGraph::add_slot`] / [`RenderGraph::add_output`].
//!
//! [`RenderGraph::add_slot`]: super::RenderGraph::add_slot
//! [`RenderGraph::add_output`]: super::RenderGraph::add_output

use std::any::Any;

use super::node::{NodeContext, RenderNode};

/// Inert node owning graph-wide shared resources.
#[derive(Default)]
pub struct ResourcesNode;

impl ResourcesNode {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RenderNode for ResourcesNode {
    fn execute(&mut self, _ctx: &mut NodeContext<'_>) {
        // Resources are exposed through ports; nothing runs per frame.
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
