//! Render Node Trait
//!
//! A render node is one vertex of the render graph: it declares its ports
//! and bindable slots through a [`NodeSpec`] when installed, and performs
//! its per-frame work in [`RenderNode::execute`]. Auto-bind slots are bound
//! by the graph before `execute` and unbound, in reverse order, after — a
//! deterministic state push/pop around every node.

use std::any::Any;

use super::port::{BindableSlot, InputPort, OutputPort};
use crate::graphics::{Bindable, GraphicsState, SharedBindable};

/// Structural declaration a node hands to the graph when installed.
#[derive(Default)]
pub struct NodeSpec {
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) outputs: Vec<OutputPort>,
    pub(crate) slots: Vec<BindableSlot>,
}

impl NodeSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bindable slot; slots are indexed in declaration order.
    #[must_use]
    pub fn slot(mut self, value: Option<SharedBindable>, auto_bind: bool) -> Self {
        self.slots.push(BindableSlot { value, auto_bind });
        self
    }

    #[must_use]
    pub fn attach_input(mut self, name: &str) -> Self {
        self.inputs.push(InputPort::attach(name));
        self
    }

    #[must_use]
    pub fn attach_output(mut self, name: &str) -> Self {
        self.outputs.push(OutputPort::attach(name));
        self
    }

    /// A typed input importing into `slot`.
    #[must_use]
    pub fn input<T: Bindable>(mut self, name: &str, slot: usize) -> Self {
        self.inputs.push(InputPort::bindable::<T>(name, slot));
        self
    }

    /// A typed output exposing `slot`.
    #[must_use]
    pub fn output<T: Bindable>(mut self, name: &str, slot: usize) -> Self {
        self.outputs.push(OutputPort::bindable::<T>(name, slot));
        self
    }
}

/// Everything a node sees while executing: its own name and slots, and the
/// frame's graphics state.
pub struct NodeContext<'a> {
    pub(crate) name: &'a str,
    pub(crate) slots: &'a [BindableSlot],
    /// Recording surface for binds and draws.
    pub state: &'a mut GraphicsState,
}

impl NodeContext<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// The resource currently held by one of the node's slots.
    #[must_use]
    pub fn bindable(&self, slot: usize) -> Option<&SharedBindable> {
        self.slots.get(slot)?.value()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Behavior of a graph vertex.
pub trait RenderNode: 'static {
    /// Ports and slots to install with the node. Called once by
    /// [`RenderGraph::add_node`](super::RenderGraph::add_node).
    fn spec(&self) -> NodeSpec {
        NodeSpec::new()
    }

    /// Per-frame hook, invoked in topological order.
    fn execute(&mut self, ctx: &mut NodeContext<'_>);

    /// Concrete-type access for hosts that need to reach into their nodes.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
