//! Texture Resource
//!
//! CPU-side texture description plus optional pixel data. The backend
//! uploads the data when the texture first becomes resident; binding only
//! records the texture unit assignment into the state tracker.

use std::sync::atomic::{AtomicU32, Ordering};

use super::bindable::{Bindable, ResourceId, next_resource_id};
use super::constants::{ColorFormat, TextureFilter, TextureWrap};
use super::state::GraphicsState;

/// A 2D texture.
pub struct Texture {
    id: ResourceId,
    label: String,
    width: u32,
    height: u32,
    format: ColorFormat,
    wrap: (TextureWrap, TextureWrap),
    filter: (TextureFilter, TextureFilter),
    /// Texture unit the texture binds to. Nodes may retarget a shared
    /// texture between passes, hence the atomic.
    unit: AtomicU32,
    data: Option<Vec<u8>>,
}

impl Texture {
    #[must_use]
    pub fn new(label: &str, width: u32, height: u32, format: ColorFormat) -> Self {
        Self {
            id: next_resource_id(),
            label: label.to_string(),
            width,
            height,
            format,
            wrap: (TextureWrap::default(), TextureWrap::default()),
            filter: (TextureFilter::default(), TextureFilter::default()),
            unit: AtomicU32::new(0),
            data: None,
        }
    }

    #[must_use]
    pub fn with_wrap(mut self, s: TextureWrap, t: TextureWrap) -> Self {
        self.wrap = (s, t);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, min: TextureFilter, mag: TextureFilter) -> Self {
        self.filter = (min, mag);
        self
    }

    /// Attaches pixel data to upload. Size must match `width * height *
    /// bytes_per_pixel`; mismatches are rejected and logged.
    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        let expected = (self.width * self.height * self.format.bytes_per_pixel()) as usize;
        if data.len() == expected {
            self.data = Some(data);
        } else {
            log::error!(
                "Texture '{}': pixel data is {} bytes, expected {}",
                self.label,
                data.len(),
                expected
            );
        }
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    #[must_use]
    pub fn wrap(&self) -> (TextureWrap, TextureWrap) {
        self.wrap
    }

    #[must_use]
    pub fn filter(&self) -> (TextureFilter, TextureFilter) {
        self.filter
    }

    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// The texture unit this texture binds to.
    #[must_use]
    pub fn unit(&self) -> u32 {
        self.unit.load(Ordering::Relaxed)
    }

    /// Retargets the texture to another unit for subsequent binds.
    pub fn set_unit(&self, unit: u32) {
        self.unit.store(unit, Ordering::Relaxed);
    }
}

impl Bindable for Texture {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, state: &mut GraphicsState) {
        state.bind_texture(self.unit(), self.id);
    }

    fn unbind(&self, state: &mut GraphicsState) {
        state.unbind_texture(self.unit(), self.id);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
