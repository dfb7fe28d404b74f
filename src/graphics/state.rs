//! Graphics State Tracker
//!
//! [`GraphicsState`] is the per-frame recording surface of the engine:
//! bindables write state transitions into it, renderer nodes write draws.
//! Redundant transitions are eliminated at record time, so the recorded
//! stream is already minimal when the backend plays it back.
//!
//! # Design Notes
//! - Recording is plain `Vec` pushes; no allocation beyond stream growth
//! - The tracker mirrors the current framebuffer/program/texture bindings,
//!   which is what makes "bind each pass exactly once" observable in tests

use rustc_hash::FxHashMap;

use super::bindable::ResourceId;
use super::constants::PrimitiveType;
use super::uniform::UniformValue;

/// One recorded graphics operation.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicsCommand {
    BindFrameBuffer(ResourceId),
    UnbindFrameBuffer(ResourceId),
    /// Clear the current target.
    Clear {
        color: Option<[f64; 4]>,
        depth: bool,
    },
    SetViewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    BindProgram(ResourceId),
    UnbindProgram(ResourceId),
    BindTexture {
        unit: u32,
        texture: ResourceId,
    },
    UnbindTexture {
        unit: u32,
        texture: ResourceId,
    },
    BindMesh(ResourceId),
    SetUniform {
        uniform: ResourceId,
        value: UniformValue,
    },
    /// Replace the per-instance vertex data of a mesh for this frame.
    UploadInstances {
        mesh: ResourceId,
        data: Vec<u8>,
        count: u32,
    },
    Draw {
        mesh: ResourceId,
        primitive: PrimitiveType,
        instances: u32,
    },
}

/// Counters accumulated over one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub state_changes: u32,
    /// Transitions skipped because the resource was already bound.
    pub redundant_binds: u32,
}

/// Per-frame binding tracker and command recorder.
#[derive(Default)]
pub struct GraphicsState {
    current_target: Option<ResourceId>,
    current_program: Option<ResourceId>,
    current_mesh: Option<ResourceId>,
    texture_units: FxHashMap<u32, ResourceId>,
    commands: Vec<GraphicsCommand>,
    stats: FrameStats,
}

impl GraphicsState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets bindings, stats and the recorded stream for a new frame.
    pub fn begin_frame(&mut self) {
        self.current_target = None;
        self.current_program = None;
        self.current_mesh = None;
        self.texture_units.clear();
        self.commands.clear();
        self.stats = FrameStats::default();
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    pub fn bind_frame_buffer(&mut self, id: ResourceId) {
        if self.current_target == Some(id) {
            self.stats.redundant_binds += 1;
            return;
        }
        self.current_target = Some(id);
        self.stats.state_changes += 1;
        self.commands.push(GraphicsCommand::BindFrameBuffer(id));
    }

    pub fn unbind_frame_buffer(&mut self, id: ResourceId) {
        if self.current_target == Some(id) {
            self.current_target = None;
            self.commands.push(GraphicsCommand::UnbindFrameBuffer(id));
        }
    }

    pub fn bind_program(&mut self, id: ResourceId) {
        if self.current_program == Some(id) {
            self.stats.redundant_binds += 1;
            return;
        }
        self.current_program = Some(id);
        self.stats.state_changes += 1;
        self.commands.push(GraphicsCommand::BindProgram(id));
    }

    pub fn unbind_program(&mut self, id: ResourceId) {
        if self.current_program == Some(id) {
            self.current_program = None;
            self.commands.push(GraphicsCommand::UnbindProgram(id));
        }
    }

    pub fn bind_texture(&mut self, unit: u32, id: ResourceId) {
        if self.texture_units.get(&unit) == Some(&id) {
            self.stats.redundant_binds += 1;
            return;
        }
        self.texture_units.insert(unit, id);
        self.stats.state_changes += 1;
        self.commands
            .push(GraphicsCommand::BindTexture { unit, texture: id });
    }

    pub fn unbind_texture(&mut self, unit: u32, id: ResourceId) {
        if self.texture_units.get(&unit) == Some(&id) {
            self.texture_units.remove(&unit);
            self.commands
                .push(GraphicsCommand::UnbindTexture { unit, texture: id });
        }
    }

    pub fn bind_mesh(&mut self, id: ResourceId) {
        if self.current_mesh == Some(id) {
            self.stats.redundant_binds += 1;
            return;
        }
        self.current_mesh = Some(id);
        self.stats.state_changes += 1;
        self.commands.push(GraphicsCommand::BindMesh(id));
    }

    pub fn unbind_mesh(&mut self, id: ResourceId) {
        if self.current_mesh == Some(id) {
            self.current_mesh = None;
        }
    }

    pub fn set_uniform(&mut self, uniform: ResourceId, value: UniformValue) {
        self.commands
            .push(GraphicsCommand::SetUniform { uniform, value });
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub fn clear(&mut self, color: Option<[f64; 4]>, depth: bool) {
        self.commands.push(GraphicsCommand::Clear { color, depth });
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.commands.push(GraphicsCommand::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    pub fn upload_instances(&mut self, mesh: ResourceId, data: Vec<u8>, count: u32) {
        self.commands
            .push(GraphicsCommand::UploadInstances { mesh, data, count });
    }

    pub fn draw(&mut self, mesh: ResourceId, primitive: PrimitiveType, instances: u32) {
        self.stats.draw_calls += 1;
        self.commands.push(GraphicsCommand::Draw {
            mesh,
            primitive,
            instances,
        });
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn current_frame_buffer(&self) -> Option<ResourceId> {
        self.current_target
    }

    #[must_use]
    pub fn current_program(&self) -> Option<ResourceId> {
        self.current_program
    }

    #[must_use]
    pub fn bound_texture(&self, unit: u32) -> Option<ResourceId> {
        self.texture_units.get(&unit).copied()
    }

    #[must_use]
    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    /// Hands the recorded stream to the caller, leaving an empty one.
    #[must_use]
    pub fn take_commands(&mut self) -> Vec<GraphicsCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
