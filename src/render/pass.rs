//! Render Pass
//!
//! A pass is an ordered collection of bindables (program, textures, uniform
//! variables) applied before drawing the renderables submitted under it.
//! Passes carry a process-stable numeric identity which doubles as the
//! primary queue sort key, so renderables sharing a pass draw back to back
//! and the pass binds exactly once.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::graphics::{Bindable as _, GraphicsState, SharedBindable};

static NEXT_PASS_ID: AtomicU32 = AtomicU32::new(1);

/// Ordered bindable set applied around a batch of draws.
pub struct Pass {
    id: u32,
    bindables: Vec<SharedBindable>,
}

impl Default for Pass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed),
            bindables: Vec::new(),
        }
    }

    /// Builder-style append; bind order is append order.
    #[must_use]
    pub fn with_bindable(mut self, bindable: SharedBindable) -> Self {
        self.bindables.push(bindable);
        self
    }

    pub fn add_bindable(&mut self, bindable: SharedBindable) {
        self.bindables.push(bindable);
    }

    /// Stable sort identity of the pass.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn bindables(&self) -> &[SharedBindable] {
        &self.bindables
    }

    /// Binds every bindable in order.
    pub fn bind(&self, state: &mut GraphicsState) {
        for bindable in &self.bindables {
            bindable.bind(state);
        }
    }

    /// Unbinds in reverse order.
    pub fn unbind(&self, state: &mut GraphicsState) {
        for bindable in self.bindables.iter().rev() {
            bindable.unbind(state);
        }
    }
}

/// Shared handle under which passes travel with submitted renderables.
pub type SharedPass = Rc<Pass>;
