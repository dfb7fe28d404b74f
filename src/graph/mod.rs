//! Render Graph
//!
//! A DAG of render nodes connected through typed input/output ports.
//! Bindable ports carry shared GPU resources; attach ports carry only an
//! ordering edge. The graph is topologically sorted once by
//! [`RenderGraph::prepare`] and executed every frame.

pub mod graph;
pub mod node;
pub mod port;
pub mod resources;

pub use graph::{DEFAULT_FB_OUTPUT, DEFAULT_FB_SLOT, NodeKey, RESOURCES_NODE, RenderGraph};
pub use node::{NodeContext, NodeSpec, RenderNode};
pub use port::{BindableSlot, InputPort, OutputPort, PortKind, PortType};
pub use resources::ResourcesNode;
