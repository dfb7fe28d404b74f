//! Graph Ports
//!
//! Ports are the typed endpoints render nodes connect through:
//! - *Attach* ports carry only an ordering edge ("run after").
//! - *Bindable* ports carry a shared GPU resource of a declared type and
//!   index into their node's bindable slot array.
//!
//! Nodes own their ports by value inside the graph's node pool; a port
//! refers to its peer by `(NodeKey, port index)` so the node ↔ port back
//! references never form an ownership cycle.

use std::any::TypeId;

use smallvec::SmallVec;

use super::graph::NodeKey;
use crate::graphics::{Bindable, SharedBindable};

/// Declared resource type of a bindable port, checked at connect time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortType {
    id: TypeId,
    name: &'static str,
}

impl PortType {
    #[must_use]
    pub fn of<T: Bindable>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Short type name for logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

/// What a port carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortKind {
    /// Ordering edge only.
    Attach,
    /// A resource of the declared type.
    Bindable(PortType),
}

/// An input endpoint: imports one producer's output.
#[derive(Debug)]
pub struct InputPort {
    pub(crate) name: String,
    pub(crate) kind: PortKind,
    /// Bindable slot in the owning node the imported resource lands in.
    pub(crate) slot: Option<usize>,
    /// `(producer node, producer output index)` once connected.
    pub(crate) connection: Option<(NodeKey, usize)>,
}

impl InputPort {
    /// An order-only input.
    #[must_use]
    pub fn attach(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PortKind::Attach,
            slot: None,
            connection: None,
        }
    }

    /// A typed input importing into the given slot of its node.
    #[must_use]
    pub fn bindable<T: Bindable>(name: &str, slot: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: PortKind::Bindable(PortType::of::<T>()),
            slot: Some(slot),
            connection: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// An output endpoint: exposes a slot of its node to any number of inputs.
#[derive(Debug)]
pub struct OutputPort {
    pub(crate) name: String,
    pub(crate) kind: PortKind,
    /// Bindable slot in the owning node this output exposes.
    pub(crate) slot: Option<usize>,
    /// `(consumer node, consumer input index)` per connection.
    pub(crate) consumers: SmallVec<[(NodeKey, usize); 2]>,
}

impl OutputPort {
    /// An order-only output.
    #[must_use]
    pub fn attach(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PortKind::Attach,
            slot: None,
            consumers: SmallVec::new(),
        }
    }

    /// A typed output exposing the given slot of its node.
    #[must_use]
    pub fn bindable<T: Bindable>(name: &str, slot: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: PortKind::Bindable(PortType::of::<T>()),
            slot: Some(slot),
            consumers: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PortKind {
        self.kind
    }
}

/// One bindable resource slot of a node.
///
/// Slots flagged `auto_bind` are bound before the node executes and
/// unbound, in reverse slot order, after.
#[derive(Default)]
pub struct BindableSlot {
    pub(crate) value: Option<SharedBindable>,
    pub(crate) auto_bind: bool,
}

impl BindableSlot {
    #[must_use]
    pub fn value(&self) -> Option<&SharedBindable> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn auto_bind(&self) -> bool {
        self.auto_bind
    }
}
