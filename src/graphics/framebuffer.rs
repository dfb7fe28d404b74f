//! Frame Buffer Resource
//!
//! A render target: an ordered set of texture attachments, or the default
//! target standing in for the window surface.

use std::sync::Arc;

use super::bindable::{Bindable, ResourceId, next_resource_id};
use super::constants::AttachmentPoint;
use super::state::GraphicsState;
use super::texture::Texture;

/// A render target composed of texture attachments.
pub struct FrameBuffer {
    id: ResourceId,
    label: String,
    attachments: Vec<(AttachmentPoint, Arc<Texture>)>,
    is_default: bool,
}

impl FrameBuffer {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            id: next_resource_id(),
            label: label.to_string(),
            attachments: Vec::new(),
            is_default: false,
        }
    }

    /// The default target: what the host presents to the screen. It has no
    /// attachments of its own; the backend substitutes the surface view.
    #[must_use]
    pub fn default_target() -> Self {
        Self {
            id: next_resource_id(),
            label: "default".to_string(),
            attachments: Vec::new(),
            is_default: true,
        }
    }

    /// Attaches `texture` at `point`. A second attachment at the same point
    /// replaces the first.
    #[must_use]
    pub fn attach(mut self, point: AttachmentPoint, texture: Arc<Texture>) -> Self {
        self.attachments.retain(|(p, _)| *p != point);
        self.attachments.push((point, texture));
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    #[must_use]
    pub fn attachments(&self) -> &[(AttachmentPoint, Arc<Texture>)] {
        &self.attachments
    }

    #[must_use]
    pub fn attachment(&self, point: AttachmentPoint) -> Option<&Arc<Texture>> {
        self.attachments
            .iter()
            .find(|(p, _)| *p == point)
            .map(|(_, t)| t)
    }
}

impl Bindable for FrameBuffer {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, state: &mut GraphicsState) {
        state.bind_frame_buffer(self.id);
    }

    fn unbind(&self, state: &mut GraphicsState) {
        state.unbind_frame_buffer(self.id);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
