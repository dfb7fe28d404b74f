//! GPU Resource Abstraction
//!
//! CPU-side resource descriptions with a uniform bind/unbind protocol
//! ([`Bindable`]), a per-frame recording state tracker ([`GraphicsState`]),
//! and a wgpu backend that makes the recorded stream real when a device is
//! attached. The render graph and the renderer nodes depend only on the
//! abstraction, never on the backend.

pub mod backend;
pub mod bindable;
pub mod constants;
pub mod context;
pub mod framebuffer;
pub mod mesh;
pub mod program;
pub mod state;
pub mod texture;
pub mod uniform;

pub use backend::{RenderBackend, ResourceRegistry};
pub use bindable::{Bindable, ResourceId, SharedBindable, next_resource_id};
pub use constants::{AttachmentPoint, ColorFormat, PrimitiveType, TextureFilter, TextureWrap};
pub use context::GraphicsContext;
pub use framebuffer::FrameBuffer;
pub use mesh::Mesh;
pub use program::Program;
pub use state::{FrameStats, GraphicsCommand, GraphicsState};
pub use texture::Texture;
pub use uniform::{UniformBuffer, UniformValue, UniformVariable};
