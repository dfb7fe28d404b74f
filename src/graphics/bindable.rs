//! Bindable Trait
//!
//! A [`Bindable`] is any GPU resource that can be made part of the current
//! graphics state: framebuffers, programs, textures, meshes, uniform
//! variables. Binding is recorded into a [`GraphicsState`] command stream;
//! the backend consumes the stream when a device is attached, and tests
//! inspect it headlessly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::state::GraphicsState;

/// Process-wide unique id of a graphics resource.
pub type ResourceId = u64;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh resource id. Id `0` is never returned.
#[must_use]
pub fn next_resource_id() -> ResourceId {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A resource that can be bound into / unbound from the graphics state.
///
/// `bind` and `unbind` must be symmetric: a render node binds its resources
/// in slot order and unbinds them in reverse, restoring the state it found.
pub trait Bindable: 'static {
    /// Unique id of the underlying resource.
    fn resource_id(&self) -> ResourceId;

    /// Makes the resource part of the current state.
    fn bind(&self, state: &mut GraphicsState);

    /// Removes the resource from the current state.
    fn unbind(&self, state: &mut GraphicsState);

    /// Concrete-type access, for nodes that configure the resources flowing
    /// through their ports (texture unit assignment and the like).
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Shared handle under which bindables travel through graph ports and
/// passes. Ownership is shared between the producing node and every
/// downstream consumer; lifetime is that of the longest holder.
pub type SharedBindable = Arc<dyn Bindable>;
