//! Render Graph
//!
//! A directed acyclic graph of render nodes connected through typed ports.
//! Nodes live in a slotmap pool so keys stay stable across graph mutation;
//! ports reference their peers by `(key, index)` pairs.
//!
//! Frame protocol: wire the graph, [`RenderGraph::prepare`] once, then
//! [`RenderGraph::execute`] every frame. Any structural change (add/remove
//! node, connect/disconnect) invalidates the preparation and execution
//! becomes a no-op until the graph is prepared again.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use super::node::{NodeContext, NodeSpec, RenderNode};
use super::port::{BindableSlot, InputPort, OutputPort, PortKind};
use super::resources::ResourcesNode;
use crate::errors::{Result, VesperError};
use crate::graphics::{Bindable, FrameBuffer, GraphicsState, SharedBindable};

new_key_type! {
    /// Stable handle of a node inside a [`RenderGraph`].
    pub struct NodeKey;
}

/// Name of the reserved shared-resource node every graph starts with.
pub const RESOURCES_NODE: &str = "resources";

/// Output on [`RESOURCES_NODE`] exposing the default framebuffer.
pub const DEFAULT_FB_OUTPUT: &str = "default_fb";

/// Slot on [`RESOURCES_NODE`] holding the default framebuffer.
pub const DEFAULT_FB_SLOT: usize = 0;

pub(crate) struct NodeEntry {
    name: String,
    node: Box<dyn RenderNode>,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    slots: Vec<BindableSlot>,
}

/// The render graph: node pool, wiring, frozen execution order.
pub struct RenderGraph {
    nodes: SlotMap<NodeKey, NodeEntry>,
    names: FxHashMap<String, NodeKey>,
    order: Vec<NodeKey>,
    prepared: bool,
    default_fb: std::sync::Arc<FrameBuffer>,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    /// Creates a graph holding the reserved `"resources"` node, with the
    /// default framebuffer already exposed as `"default_fb"`.
    #[must_use]
    pub fn new() -> Self {
        let default_fb = std::sync::Arc::new(FrameBuffer::default_target());
        let mut graph = Self {
            nodes: SlotMap::with_key(),
            names: FxHashMap::default(),
            order: Vec::new(),
            prepared: false,
            default_fb: default_fb.clone(),
        };

        let resources = graph
            .add_node(RESOURCES_NODE, ResourcesNode::new())
            .expect("fresh graph cannot have a name collision");
        let slot = graph
            .add_slot(resources, Some(default_fb), false)
            .expect("resources node exists");
        graph
            .add_output::<FrameBuffer>(resources, DEFAULT_FB_OUTPUT, slot)
            .expect("fresh resources node accepts outputs");

        graph
    }

    /// The framebuffer standing in for the window surface, exposed by the
    /// resources node as [`DEFAULT_FB_OUTPUT`].
    #[must_use]
    pub fn default_frame_buffer(&self) -> std::sync::Arc<FrameBuffer> {
        self.default_fb.clone()
    }

    /// Key of the reserved resources node.
    #[must_use]
    pub fn resources_node(&self) -> NodeKey {
        self.names[RESOURCES_NODE]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Installs a node under a unique name.
    pub fn add_node(&mut self, name: &str, node: impl RenderNode) -> Result<NodeKey> {
        if self.names.contains_key(name) {
            log::error!("Render node name already taken: {name}");
            return Err(VesperError::DuplicateNodeName(name.to_string()));
        }
        let NodeSpec {
            inputs,
            outputs,
            slots,
        } = node.spec();
        let key = self.nodes.insert(NodeEntry {
            name: name.to_string(),
            node: Box::new(node),
            inputs,
            outputs,
            slots,
        });
        self.names.insert(name.to_string(), key);
        self.prepared = false;
        Ok(key)
    }

    /// Disconnects all of the node's edges and removes it.
    pub fn remove_node(&mut self, key: NodeKey) -> bool {
        let Some(entry) = self.nodes.get(key) else {
            return false;
        };

        // Collect both edge directions before touching anything.
        let producers: Vec<(NodeKey, usize, usize)> = entry
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(i, input)| input.connection.map(|(n, o)| (n, o, i)))
            .collect();
        let consumers: Vec<(NodeKey, usize)> = entry
            .outputs
            .iter()
            .flat_map(|output| output.consumers.iter().copied())
            .collect();

        for (producer, output_index, input_index) in producers {
            if let Some(p) = self.nodes.get_mut(producer) {
                p.outputs[output_index]
                    .consumers
                    .retain(|(n, i)| !(*n == key && *i == input_index));
            }
        }
        for (consumer, input_index) in consumers {
            if let Some(c) = self.nodes.get_mut(consumer) {
                c.inputs[input_index].connection = None;
            }
        }

        let entry = self.nodes.remove(key).expect("checked above");
        self.names.remove(&entry.name);
        self.prepared = false;
        true
    }

    /// Key of the node registered under `name`.
    #[must_use]
    pub fn node_key(&self, name: &str) -> Option<NodeKey> {
        self.names.get(name).copied()
    }

    /// Concrete-typed access to a node's behavior object.
    #[must_use]
    pub fn node_as<T: RenderNode>(&self, key: NodeKey) -> Option<&T> {
        self.nodes.get(key)?.node.as_any().downcast_ref()
    }

    /// Mutable concrete-typed access to a node's behavior object.
    #[must_use]
    pub fn node_as_mut<T: RenderNode>(&mut self, key: NodeKey) -> Option<&mut T> {
        self.nodes.get_mut(key)?.node.as_any_mut().downcast_mut()
    }

    /// Appends a bindable slot to a node, returning its index.
    pub fn add_slot(
        &mut self,
        node: NodeKey,
        value: Option<SharedBindable>,
        auto_bind: bool,
    ) -> Option<usize> {
        let entry = self.nodes.get_mut(node)?;
        entry.slots.push(BindableSlot { value, auto_bind });
        Some(entry.slots.len() - 1)
    }

    /// Declares a typed output exposing `slot` on an installed node.
    pub fn add_output<T: Bindable>(&mut self, node: NodeKey, name: &str, slot: usize) -> Result<()> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| VesperError::NodeNotFound(format!("{node:?}")))?;
        entry.outputs.push(OutputPort::bindable::<T>(name, slot));
        Ok(())
    }

    /// Declares a typed input importing into `slot` on an installed node.
    pub fn add_input<T: Bindable>(&mut self, node: NodeKey, name: &str, slot: usize) -> Result<()> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| VesperError::NodeNotFound(format!("{node:?}")))?;
        entry.inputs.push(InputPort::bindable::<T>(name, slot));
        Ok(())
    }

    // ========================================================================
    // Wiring
    // ========================================================================

    /// Connects `from.from_port` (output) to `to.to_port` (input).
    ///
    /// Checks kind and type compatibility and the single-connection rule;
    /// on failure the graph is unchanged. For bindable ports the producer's
    /// current resource is propagated into the consumer immediately.
    pub fn connect(
        &mut self,
        from: NodeKey,
        from_port: &str,
        to: NodeKey,
        to_port: &str,
    ) -> Result<()> {
        let (output_index, output_kind) = {
            let entry = self
                .nodes
                .get(from)
                .ok_or_else(|| VesperError::NodeNotFound(format!("{from:?}")))?;
            let index = entry
                .outputs
                .iter()
                .position(|o| o.name == from_port)
                .ok_or_else(|| VesperError::PortNotFound {
                    node: entry.name.clone(),
                    port: from_port.to_string(),
                })?;
            (index, entry.outputs[index].kind)
        };

        let (input_index, input_kind) = {
            let entry = self
                .nodes
                .get(to)
                .ok_or_else(|| VesperError::NodeNotFound(format!("{to:?}")))?;
            let index = entry
                .inputs
                .iter()
                .position(|i| i.name == to_port)
                .ok_or_else(|| VesperError::PortNotFound {
                    node: entry.name.clone(),
                    port: to_port.to_string(),
                })?;
            let input = &entry.inputs[index];
            if input.is_connected() {
                log::error!("Input already connected: {}.{}", entry.name, to_port);
                return Err(VesperError::InputAlreadyConnected {
                    node: entry.name.clone(),
                    port: to_port.to_string(),
                });
            }
            (index, input.kind)
        };

        match (output_kind, input_kind) {
            (PortKind::Attach, PortKind::Attach) => {}
            (PortKind::Bindable(out_ty), PortKind::Bindable(in_ty)) => {
                if out_ty != in_ty {
                    let err = VesperError::PortTypeMismatch {
                        from: format!("{}.{}", self.nodes[from].name, from_port),
                        from_type: out_ty.name(),
                        to: format!("{}.{}", self.nodes[to].name, to_port),
                        to_type: in_ty.name(),
                    };
                    log::error!("{err}");
                    return Err(err);
                }
            }
            _ => {
                log::error!("Port kind mismatch: {}.{}", self.nodes[to].name, to_port);
                return Err(VesperError::PortKindMismatch {
                    node: self.nodes[to].name.clone(),
                    port: to_port.to_string(),
                });
            }
        }

        // Register both directions.
        self.nodes[from].outputs[output_index]
            .consumers
            .push((to, input_index));
        self.nodes[to].inputs[input_index].connection = Some((from, output_index));
        self.prepared = false;

        // Propagate the producer's current resource into the consumer.
        if let PortKind::Bindable(_) = output_kind {
            let producer_slot = self.nodes[from].outputs[output_index].slot;
            let consumer_slot = self.nodes[to].inputs[input_index].slot;
            if let (Some(ps), Some(cs)) = (producer_slot, consumer_slot) {
                let value = self.nodes[from].slots.get(ps).and_then(|s| s.value.clone());
                let mut visited = Vec::new();
                self.propagate(to, cs, value, &mut visited);
            }
        }

        Ok(())
    }

    /// Convenience: connect by node names.
    pub fn connect_names(
        &mut self,
        from: &str,
        from_port: &str,
        to: &str,
        to_port: &str,
    ) -> Result<()> {
        let from_key = self
            .node_key(from)
            .ok_or_else(|| VesperError::NodeNotFound(from.to_string()))?;
        let to_key = self
            .node_key(to)
            .ok_or_else(|| VesperError::NodeNotFound(to.to_string()))?;
        self.connect(from_key, from_port, to_key, to_port)
    }

    /// Severs the connection into `to.to_port`. The consumer keeps the last
    /// propagated resource. Returns false when nothing was connected.
    pub fn disconnect(&mut self, to: NodeKey, to_port: &str) -> bool {
        let Some(entry) = self.nodes.get_mut(to) else {
            return false;
        };
        let Some(input_index) = entry.inputs.iter().position(|i| i.name == to_port) else {
            return false;
        };
        let Some((producer, output_index)) = entry.inputs[input_index].connection.take() else {
            return false;
        };
        if let Some(p) = self.nodes.get_mut(producer) {
            p.outputs[output_index]
                .consumers
                .retain(|(n, i)| !(*n == to && *i == input_index));
        }
        self.prepared = false;
        true
    }

    // ========================================================================
    // Bindable propagation
    // ========================================================================

    /// Replaces the resource in a node's slot and mirrors the write into
    /// every input connected to an output exposing that slot, recursively,
    /// so pass-through ports cascade.
    pub fn set_bindable(&mut self, node: NodeKey, slot: usize, value: Option<SharedBindable>) {
        let mut visited = Vec::new();
        self.propagate(node, slot, value, &mut visited);
    }

    /// The resource currently held by a node's slot.
    #[must_use]
    pub fn get_bindable(&self, node: NodeKey, slot: usize) -> Option<SharedBindable> {
        self.nodes.get(node)?.slots.get(slot)?.value.clone()
    }

    fn propagate(
        &mut self,
        node: NodeKey,
        slot: usize,
        value: Option<SharedBindable>,
        visited: &mut Vec<(NodeKey, usize)>,
    ) {
        // Unprepared graphs may still hold a wiring cycle.
        if visited.contains(&(node, slot)) {
            return;
        }
        visited.push((node, slot));

        let Some(entry) = self.nodes.get_mut(node) else {
            return;
        };
        let Some(s) = entry.slots.get_mut(slot) else {
            log::warn!("set_bindable: node '{}' has no slot {slot}", entry.name);
            return;
        };
        s.value = value.clone();

        let targets: Vec<(NodeKey, usize)> = entry
            .outputs
            .iter()
            .filter(|output| output.slot == Some(slot))
            .flat_map(|output| output.consumers.iter().copied())
            .collect();

        for (consumer, input_index) in targets {
            let consumer_slot = self
                .nodes
                .get(consumer)
                .and_then(|c| c.inputs.get(input_index))
                .and_then(|i| i.slot);
            if let Some(cs) = consumer_slot {
                self.propagate(consumer, cs, value.clone(), visited);
            }
        }
    }

    // ========================================================================
    // Preparation and execution
    // ========================================================================

    /// Freezes the execution order with a depth-first topological sort.
    ///
    /// Idempotent while the graph is unmodified. On a cycle the graph stays
    /// unprepared and [`RenderGraph::execute`] performs no work.
    pub fn prepare(&mut self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            nodes: &SlotMap<NodeKey, NodeEntry>,
            key: NodeKey,
            marks: &mut FxHashMap<NodeKey, Mark>,
            order: &mut Vec<NodeKey>,
        ) -> bool {
            match marks.get(&key) {
                Some(Mark::Done) => return true,
                Some(Mark::Visiting) => return false,
                None => {}
            }
            marks.insert(key, Mark::Visiting);
            for input in &nodes[key].inputs {
                if let Some((producer, _)) = input.connection
                    && !visit(nodes, producer, marks, order)
                {
                    return false;
                }
            }
            marks.insert(key, Mark::Done);
            order.push(key);
            true
        }

        self.order.clear();
        let mut marks = FxHashMap::default();
        for key in self.nodes.keys() {
            if !visit(&self.nodes, key, &mut marks, &mut self.order) {
                self.order.clear();
                self.prepared = false;
                log::error!("Render graph contains a cycle; execution disabled until repaired");
                return Err(VesperError::GraphCycle);
            }
        }
        self.prepared = true;
        Ok(())
    }

    /// Executes every node once, in the prepared topological order.
    ///
    /// Around each node, slots flagged auto-bind are bound in slot order
    /// and unbound in reverse order after the node's work.
    pub fn execute(&mut self, state: &mut GraphicsState) {
        if !self.prepared {
            log::debug!("Render graph not prepared; skipping execution");
            return;
        }

        for i in 0..self.order.len() {
            let key = self.order[i];
            let Some(entry) = self.nodes.get_mut(key) else {
                continue;
            };
            let NodeEntry {
                name, node, slots, ..
            } = entry;

            for slot in slots.iter() {
                if slot.auto_bind
                    && let Some(bindable) = &slot.value
                {
                    bindable.bind(state);
                }
            }

            node.execute(&mut NodeContext {
                name,
                slots,
                state: &mut *state,
            });

            for slot in slots.iter().rev() {
                if slot.auto_bind
                    && let Some(bindable) = &slot.value
                {
                    bindable.unbind(state);
                }
            }
        }
    }

    /// The frozen execution order, for inspection.
    #[must_use]
    pub fn execution_order(&self) -> &[NodeKey] {
        &self.order
    }

    /// Name of a node, for diagnostics.
    #[must_use]
    pub fn node_name(&self, key: NodeKey) -> Option<&str> {
        self.nodes.get(key).map(|e| e.name.as_str())
    }
}
