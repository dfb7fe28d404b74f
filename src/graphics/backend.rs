//! WGPU Backend
//!
//! Plays a recorded [`GraphicsCommand`] stream back against a device:
//! resource residency (buffer/texture creation and upload) first, then pass
//! encoding. The engine cores never call into this module — they only
//! record; a host without a device simply never attaches a backend.
//!
//! Draw-time resource binding (textures, uniform blocks) is carried by the
//! bind group pre-built alongside each [`Program`] by the shader-owning
//! collaborator; the backend's job is pipelines, vertex streams and uniform
//! value uploads. Anything it cannot resolve is dropped with a log and the
//! frame continues (failures here are never fatal).

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::bindable::{Bindable as _, ResourceId};
use super::context::GraphicsContext;
use super::framebuffer::FrameBuffer;
use super::mesh::Mesh;
use super::program::Program;
use super::state::GraphicsCommand;
use super::texture::Texture;
use super::uniform::UniformBuffer;
use crate::graphics::constants::AttachmentPoint;

/// Shared resource handles the backend resolves command ids against.
///
/// The scene builder registers everything it creates; registration is
/// idempotent per resource id.
#[derive(Default)]
pub struct ResourceRegistry {
    textures: FxHashMap<ResourceId, Arc<Texture>>,
    frame_buffers: FxHashMap<ResourceId, Arc<FrameBuffer>>,
    programs: FxHashMap<ResourceId, Arc<Program>>,
    meshes: FxHashMap<ResourceId, Arc<Mesh>>,
    uniform_buffers: FxHashMap<ResourceId, Arc<UniformBuffer>>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_texture(&mut self, texture: Arc<Texture>) {
        self.textures.insert(texture.resource_id(), texture);
    }

    pub fn register_frame_buffer(&mut self, frame_buffer: Arc<FrameBuffer>) {
        self.frame_buffers
            .insert(frame_buffer.resource_id(), frame_buffer);
    }

    pub fn register_program(&mut self, program: Arc<Program>) {
        self.programs.insert(program.resource_id(), program);
    }

    pub fn register_mesh(&mut self, mesh: Arc<Mesh>) {
        self.meshes.insert(mesh.resource_id(), mesh);
    }

    pub fn register_uniform_buffer(&mut self, buffer: Arc<UniformBuffer>) {
        self.uniform_buffers.insert(buffer.resource_id(), buffer);
    }

    #[must_use]
    pub fn frame_buffer(&self, id: ResourceId) -> Option<&Arc<FrameBuffer>> {
        self.frame_buffers.get(&id)
    }

    #[must_use]
    pub fn program(&self, id: ResourceId) -> Option<&Arc<Program>> {
        self.programs.get(&id)
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<(wgpu::Buffer, u32)>,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: u64,
    vertex_count: u32,
}

struct GpuTexture {
    view: wgpu::TextureView,
}

/// GPU residency cache plus command-stream playback.
#[derive(Default)]
pub struct RenderBackend {
    meshes: FxHashMap<ResourceId, GpuMesh>,
    textures: FxHashMap<ResourceId, GpuTexture>,
    uniforms: FxHashMap<ResourceId, wgpu::Buffer>,
}

/// One in-pass operation after segmentation.
enum SegmentOp {
    Viewport { x: i32, y: i32, w: u32, h: u32 },
    Draw { program: Option<ResourceId>, mesh: ResourceId, instances: u32 },
}

/// Commands between two framebuffer binds, played as one render pass.
struct Segment {
    target: ResourceId,
    clear_color: Option<[f64; 4]>,
    clear_depth: bool,
    ops: Vec<SegmentOp>,
}

impl RenderBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads what the stream needs, encodes it, submits.
    ///
    /// `surface_view` backs the default framebuffer; without it, segments
    /// targeting the default framebuffer are skipped.
    pub fn execute(
        &mut self,
        ctx: &GraphicsContext,
        registry: &ResourceRegistry,
        commands: &[GraphicsCommand],
        surface_view: Option<&wgpu::TextureView>,
    ) {
        self.prepare(ctx, registry, commands);

        let segments = Self::segment(commands);
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Vesper Frame Encoder"),
            });

        for segment in &segments {
            self.encode_segment(registry, segment, surface_view, &mut encoder);
        }

        ctx.queue.submit(Some(encoder.finish()));
    }

    // ========================================================================
    // Residency
    // ========================================================================

    fn prepare(
        &mut self,
        ctx: &GraphicsContext,
        registry: &ResourceRegistry,
        commands: &[GraphicsCommand],
    ) {
        for command in commands {
            match command {
                GraphicsCommand::BindMesh(id) | GraphicsCommand::Draw { mesh: id, .. } => {
                    self.prepare_mesh(ctx, registry, *id);
                }
                GraphicsCommand::BindTexture { texture, .. } => {
                    self.prepare_texture(ctx, registry, *texture);
                }
                GraphicsCommand::BindFrameBuffer(id) => {
                    if let Some(fb) = registry.frame_buffer(*id) {
                        for (_, texture) in fb.attachments() {
                            self.prepare_attachment(ctx, texture);
                        }
                    }
                }
                GraphicsCommand::SetUniform { uniform, value } => {
                    let buffer = self.uniforms.entry(*uniform).or_insert_with(|| {
                        ctx.device.create_buffer(&wgpu::BufferDescriptor {
                            label: Some("Vesper Uniform"),
                            size: 64,
                            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                            mapped_at_creation: false,
                        })
                    });
                    ctx.queue.write_buffer(buffer, 0, &value.as_bytes());
                }
                GraphicsCommand::UploadInstances { mesh, data, .. } => {
                    self.prepare_mesh(ctx, registry, *mesh);
                    self.upload_instances(ctx, *mesh, data);
                }
                _ => {}
            }
        }

        // Dirty uniform blocks are uploaded wholesale once per frame.
        for (id, block) in &registry.uniform_buffers {
            if block.take_dirty() {
                let bytes = block.bytes();
                let buffer = self.uniforms.entry(*id).or_insert_with(|| {
                    ctx.device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(block.label()),
                        size: bytes.len().max(16) as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    })
                });
                ctx.queue.write_buffer(buffer, 0, &bytes);
            }
        }
    }

    fn prepare_mesh(&mut self, ctx: &GraphicsContext, registry: &ResourceRegistry, id: ResourceId) {
        if self.meshes.contains_key(&id) {
            return;
        }
        let Some(mesh) = registry.meshes.get(&id) else {
            log::warn!("Draw references unregistered mesh {id}");
            return;
        };

        let vertex_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(mesh.label()),
            size: mesh.vertex_data().len().max(4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(&vertex_buffer, 0, mesh.vertex_data());

        let index_buffer = mesh.indices().map(|indices| {
            let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(mesh.label()),
                size: std::mem::size_of_val(indices).max(4) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            ctx.queue
                .write_buffer(&buffer, 0, bytemuck::cast_slice(indices));
            (buffer, indices.len() as u32)
        });

        self.meshes.insert(
            id,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                instance_buffer: None,
                instance_capacity: 0,
                vertex_count: mesh.vertex_count(),
            },
        );
    }

    fn upload_instances(&mut self, ctx: &GraphicsContext, mesh: ResourceId, data: &[u8]) {
        let Some(gpu_mesh) = self.meshes.get_mut(&mesh) else {
            return;
        };
        let needed = data.len() as u64;
        if gpu_mesh.instance_buffer.is_none() || gpu_mesh.instance_capacity < needed {
            gpu_mesh.instance_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Vesper Instances"),
                size: needed.max(64).next_power_of_two(),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            gpu_mesh.instance_capacity = needed.max(64).next_power_of_two();
        }
        if let Some(buffer) = &gpu_mesh.instance_buffer {
            ctx.queue.write_buffer(buffer, 0, data);
        }
    }

    fn prepare_texture(
        &mut self,
        ctx: &GraphicsContext,
        registry: &ResourceRegistry,
        id: ResourceId,
    ) {
        if self.textures.contains_key(&id) {
            return;
        }
        let Some(texture) = registry.textures.get(&id) else {
            return;
        };
        self.create_texture(ctx, texture, wgpu::TextureUsages::TEXTURE_BINDING);
    }

    fn prepare_attachment(&mut self, ctx: &GraphicsContext, texture: &Arc<Texture>) {
        if self.textures.contains_key(&texture.resource_id()) {
            return;
        }
        self.create_texture(
            ctx,
            texture,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
    }

    fn create_texture(
        &mut self,
        ctx: &GraphicsContext,
        texture: &Arc<Texture>,
        usage: wgpu::TextureUsages,
    ) {
        let size = wgpu::Extent3d {
            width: texture.width().max(1),
            height: texture.height().max(1),
            depth_or_array_layers: 1,
        };
        let raw = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(texture.label()),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture.format().to_wgpu(),
            usage,
            view_formats: &[],
        });

        if let Some(data) = texture.data() {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &raw,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(texture.width() * texture.format().bytes_per_pixel()),
                    rows_per_image: Some(texture.height()),
                },
                size,
            );
        }

        let view = raw.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures
            .insert(texture.resource_id(), GpuTexture { view });
    }

    // ========================================================================
    // Playback
    // ========================================================================

    fn segment(commands: &[GraphicsCommand]) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut current: Option<Segment> = None;
        let mut program: Option<ResourceId> = None;

        for command in commands {
            match command {
                GraphicsCommand::BindFrameBuffer(id) => {
                    if let Some(segment) = current.take() {
                        segments.push(segment);
                    }
                    current = Some(Segment {
                        target: *id,
                        clear_color: None,
                        clear_depth: false,
                        ops: Vec::new(),
                    });
                }
                GraphicsCommand::UnbindFrameBuffer(_) => {
                    if let Some(segment) = current.take() {
                        segments.push(segment);
                    }
                }
                GraphicsCommand::Clear { color, depth } => {
                    if let Some(segment) = &mut current {
                        if segment.ops.is_empty() {
                            if color.is_some() {
                                segment.clear_color = *color;
                            }
                            segment.clear_depth |= *depth;
                        } else {
                            // Mid-pass clears would need a pass split; the
                            // engine's nodes always clear first, so this is
                            // a wiring mistake worth hearing about.
                            log::warn!("Clear after draws in the same target segment, ignored");
                        }
                    }
                }
                GraphicsCommand::SetViewport { x, y, width, height } => {
                    if let Some(segment) = &mut current {
                        segment.ops.push(SegmentOp::Viewport {
                            x: *x,
                            y: *y,
                            w: *width,
                            h: *height,
                        });
                    }
                }
                GraphicsCommand::BindProgram(id) => program = Some(*id),
                GraphicsCommand::UnbindProgram(id) => {
                    if program == Some(*id) {
                        program = None;
                    }
                }
                GraphicsCommand::Draw { mesh, instances, .. } => {
                    if let Some(segment) = &mut current {
                        segment.ops.push(SegmentOp::Draw {
                            program,
                            mesh: *mesh,
                            instances: *instances,
                        });
                    } else {
                        log::warn!("Draw without a bound framebuffer, dropped");
                    }
                }
                _ => {}
            }
        }
        if let Some(segment) = current.take() {
            segments.push(segment);
        }
        segments
    }

    fn encode_segment(
        &self,
        registry: &ResourceRegistry,
        segment: &Segment,
        surface_view: Option<&wgpu::TextureView>,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let has_draws = segment
            .ops
            .iter()
            .any(|op| matches!(op, SegmentOp::Draw { .. }));
        if !has_draws && segment.clear_color.is_none() && !segment.clear_depth {
            return;
        }

        let Some(frame_buffer) = registry.frame_buffer(segment.target) else {
            log::warn!("Segment targets unregistered framebuffer {}", segment.target);
            return;
        };

        // Resolve attachments: the default target maps to the surface view.
        let mut color_view: Option<&wgpu::TextureView> = None;
        let mut depth_view: Option<&wgpu::TextureView> = None;
        if frame_buffer.is_default() {
            color_view = surface_view;
            if color_view.is_none() {
                log::debug!("No surface view attached; skipping default-target segment");
                return;
            }
        } else {
            for (point, texture) in frame_buffer.attachments() {
                let gpu = self.textures.get(&texture.resource_id());
                match point {
                    AttachmentPoint::Color(0) => color_view = gpu.map(|g| &g.view),
                    AttachmentPoint::Color(_) => {}
                    AttachmentPoint::Depth => depth_view = gpu.map(|g| &g.view),
                }
            }
            if color_view.is_none() && depth_view.is_none() {
                log::warn!(
                    "Framebuffer '{}' has no resident attachments",
                    frame_buffer.label()
                );
                return;
            }
        }

        let color_attachments = [color_view.map(|view| wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: segment.clear_color.map_or(wgpu::LoadOp::Load, |c| {
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: c[0],
                        g: c[1],
                        b: c[2],
                        a: c[3],
                    })
                }),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })];

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(frame_buffer.label()),
            color_attachments: if color_view.is_some() {
                &color_attachments
            } else {
                &[]
            },
            depth_stencil_attachment: depth_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: if segment.clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for op in &segment.ops {
            match op {
                SegmentOp::Viewport { x, y, w, h } => {
                    pass.set_viewport(*x as f32, *y as f32, *w as f32, *h as f32, 0.0, 1.0);
                }
                SegmentOp::Draw {
                    program,
                    mesh,
                    instances,
                } => {
                    self.encode_draw(registry, &mut pass, *program, *mesh, *instances);
                }
            }
        }
    }

    fn encode_draw(
        &self,
        registry: &ResourceRegistry,
        pass: &mut wgpu::RenderPass<'_>,
        program: Option<ResourceId>,
        mesh: ResourceId,
        instances: u32,
    ) {
        let Some(program) = program.and_then(|id| registry.program(id)) else {
            log::debug!("Draw without a bound program, dropped");
            return;
        };
        let Some(pipeline) = program.pipeline() else {
            log::debug!("Program '{}' has no compiled pipeline, draw dropped", program.label());
            return;
        };
        let Some(gpu_mesh) = self.meshes.get(&mesh) else {
            return;
        };

        pass.set_pipeline(pipeline);
        if let Some(bind_group) = program.bind_group() {
            pass.set_bind_group(0, bind_group.as_ref(), &[]);
        }
        pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
        if let Some(instance_buffer) = &gpu_mesh.instance_buffer {
            pass.set_vertex_buffer(1, instance_buffer.slice(..));
        }

        if let Some((index_buffer, count)) = &gpu_mesh.index_buffer {
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..*count, 0, 0..instances);
        } else {
            pass.draw(0..gpu_mesh.vertex_count, 0..instances);
        }
    }
}
