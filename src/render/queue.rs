//! Render Queue Skeleton
//!
//! The shared core of every 3D renderer node:
//! 1. `submit` — filter, then queue `(renderable, pass)`
//! 2. `sort` — order by pass id, then renderable identity
//! 3. `render` — bind each distinct pass once, draw its renderables
//! 4. `clear` — empty the queue for the next frame
//!
//! The queue lives behind an `Rc<RefCell>` so systems (which fill it during
//! update) and the owning graph node (which drains it during execute) can
//! both reach it.

use std::cell::RefCell;
use std::rc::Rc;

use super::filter::{Filter as _, SharedFilter};
use super::pass::SharedPass;
use super::renderable::{Renderable3D as _, SharedRenderable};
use crate::graphics::GraphicsState;

/// How a queue entry is drawn by [`RenderQueue::render`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// One draw per renderable.
    Single,
    /// Instanced draw per renderable (particle systems).
    Instanced,
}

/// Filtered, sortable queue of `(renderable, pass)` submissions.
pub struct RenderQueue {
    entries: Vec<(SharedRenderable, SharedPass)>,
    filters: Vec<SharedFilter>,
    mode: DrawMode,
}

impl RenderQueue {
    #[must_use]
    pub fn new(mode: DrawMode) -> Self {
        Self::with_capacity(mode, 256)
    }

    /// Pre-sizes the queue so steady-state frames do not reallocate.
    #[must_use]
    pub fn with_capacity(mode: DrawMode, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            filters: Vec::new(),
            mode,
        }
    }

    pub fn add_filter(&mut self, filter: SharedFilter) {
        self.filters.push(filter);
    }

    /// Removes a filter by identity.
    pub fn remove_filter(&mut self, filter: &SharedFilter) {
        self.filters.retain(|f| !Rc::ptr_eq(f, filter));
    }

    /// Queues a renderable under a pass, unless a filter rejects it.
    pub fn submit(&mut self, renderable: SharedRenderable, pass: SharedPass) {
        if self
            .filters
            .iter()
            .all(|f| f.should_be_rendered(renderable.as_ref()))
        {
            self.entries.push((renderable, pass));
        }
    }

    /// Orders the queue to minimise pass rebinds: pass id first, renderable
    /// identity second.
    pub fn sort(&mut self) {
        self.entries.sort_unstable_by_key(|(renderable, pass)| {
            (pass.id(), Rc::as_ptr(renderable).cast::<()>() as usize)
        });
    }

    /// Draws the queue in sorted order, binding each distinct pass exactly
    /// once and unbinding the last one at the end.
    ///
    /// The queue is left intact so shadow passes can replay it; callers
    /// invoke [`RenderQueue::clear`] when the frame is done with it.
    pub fn render(&self, state: &mut GraphicsState) {
        let mut current: Option<&SharedPass> = None;
        for (renderable, pass) in &self.entries {
            match current {
                Some(bound) if bound.id() == pass.id() => {}
                _ => {
                    if let Some(bound) = current {
                        bound.unbind(state);
                    }
                    pass.bind(state);
                    current = Some(pass);
                }
            }
            match self.mode {
                DrawMode::Single => renderable.draw(state),
                DrawMode::Instanced => renderable.draw_instances(state),
            }
        }
        if let Some(bound) = current {
            bound.unbind(state);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle shared between submitting systems and the draining node.
pub type SharedQueue = Rc<RefCell<RenderQueue>>;
