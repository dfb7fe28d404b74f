//! Graphics Enums
//!
//! CPU-side descriptions of GPU state, decoupled from the backend API.
//! Conversions to the matching `wgpu` types live next to each enum.

/// Primitive topology of a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

impl PrimitiveType {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
            PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Pixel format of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    R8,
    Rg8,
    #[default]
    Rgba8,
    Rgba16Float,
    Rgba32Float,
    Depth32Float,
}

impl ColorFormat {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            ColorFormat::R8 => wgpu::TextureFormat::R8Unorm,
            ColorFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
            ColorFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
            ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            ColorFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            ColorFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }

    /// Bytes per pixel, used to validate uploaded image data.
    #[must_use]
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            ColorFormat::R8 => 1,
            ColorFormat::Rg8 => 2,
            ColorFormat::Rgba8 | ColorFormat::Depth32Float => 4,
            ColorFormat::Rgba16Float => 8,
            ColorFormat::Rgba32Float => 16,
        }
    }

    /// True for depth-renderable formats.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, ColorFormat::Depth32Float)
    }
}

/// Texture coordinate wrap mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl TextureWrap {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Texture sampling filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

impl TextureFilter {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Attachment point of a texture inside a framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    /// Color attachment at the given index.
    Color(u8),
    /// Depth attachment.
    Depth,
}
