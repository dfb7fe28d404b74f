//! Program Resource
//!
//! A reference to a pre-compiled shader program. The engine core never
//! parses or compiles shader sources: the hosting application compiles its
//! pipelines (and the bind group layout that goes with them) and hands the
//! results over. A program without a pipeline is still a valid binding
//! target — draws under it are dropped by the backend with a log.

use std::sync::Arc;

use super::bindable::{Bindable, ResourceId, next_resource_id};
use super::state::GraphicsState;

/// Reference to a compiled GPU program.
pub struct Program {
    id: ResourceId,
    label: String,
    pipeline: Option<Arc<wgpu::RenderPipeline>>,
    bind_group: Option<Arc<wgpu::BindGroup>>,
}

impl Program {
    /// A program with no GPU objects attached yet.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            id: next_resource_id(),
            label: label.to_string(),
            pipeline: None,
            bind_group: None,
        }
    }

    /// A program backed by a compiled pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Arc<wgpu::RenderPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Attaches the resource bind group matching the pipeline layout.
    #[must_use]
    pub fn with_bind_group(mut self, bind_group: Arc<wgpu::BindGroup>) -> Self {
        self.bind_group = Some(bind_group);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn pipeline(&self) -> Option<&Arc<wgpu::RenderPipeline>> {
        self.pipeline.as_ref()
    }

    #[must_use]
    pub fn bind_group(&self) -> Option<&Arc<wgpu::BindGroup>> {
        self.bind_group.as_ref()
    }
}

impl Bindable for Program {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, state: &mut GraphicsState) {
        state.bind_program(self.id);
    }

    fn unbind(&self, state: &mut GraphicsState) {
        state.unbind_program(self.id);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
