//! WGPU Context
//!
//! Owns the device and queue. Hosts that already manage a device (window
//! surface, tests, offscreen tools) hand it in via
//! [`GraphicsContext::from_device`]; otherwise [`GraphicsContext::request`]
//! performs the adapter/device dance.

use crate::errors::{Result, VesperError};

/// WGPU device and queue wrapper.
pub struct GraphicsContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GraphicsContext {
    /// Wraps an externally created device and queue.
    #[must_use]
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Requests an adapter and device without a surface (offscreen use).
    pub async fn request() -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| VesperError::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Vesper Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        Ok(Self { device, queue })
    }

    /// Blocking wrapper around [`GraphicsContext::request`].
    pub fn request_blocking() -> Result<Self> {
        pollster::block_on(Self::request())
    }
}
