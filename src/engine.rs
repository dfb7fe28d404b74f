//! Engine Driver
//!
//! Ties the three cores into the per-frame control flow: advance time,
//! tick every system (which fills the renderer queues), then execute the
//! render graph and, when a device is attached, play the recorded frame
//! back through the wgpu backend.
//!
//! The engine is fully functional headless — scene logic, graph execution
//! and the recorded command stream all work without a GPU, which is also
//! how the integration tests drive it.

use crate::ecs::EntityDatabase;
use crate::graph::RenderGraph;
use crate::graphics::{GraphicsContext, GraphicsState, RenderBackend, ResourceRegistry};
use crate::utils::time::FrameClock;

/// Host-facing frame driver.
pub struct Engine {
    database: EntityDatabase,
    graph: RenderGraph,
    state: GraphicsState,
    clock: FrameClock,
    registry: ResourceRegistry,
    backend: RenderBackend,
    context: Option<GraphicsContext>,
}

impl Engine {
    /// Creates an engine with an empty graph and a database sized for
    /// `max_entities`.
    #[must_use]
    pub fn new(max_entities: usize) -> Self {
        let graph = RenderGraph::new();
        let mut registry = ResourceRegistry::new();
        registry.register_frame_buffer(graph.default_frame_buffer());

        Self {
            database: EntityDatabase::new(max_entities),
            graph,
            state: GraphicsState::new(),
            clock: FrameClock::new(),
            registry,
            backend: RenderBackend::new(),
            context: None,
        }
    }

    /// Attaches a GPU device; frames recorded from now on are submitted.
    pub fn attach_context(&mut self, context: GraphicsContext) {
        self.context = Some(context);
    }

    #[must_use]
    pub fn database(&self) -> &EntityDatabase {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut EntityDatabase {
        &mut self.database
    }

    #[must_use]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RenderGraph {
        &mut self.graph
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Last recorded frame, for inspection.
    #[must_use]
    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    /// Advances time and ticks every system in registration order.
    pub fn update(&mut self) {
        let dt = self.clock.advance();
        self.database.update_systems(dt);
    }

    /// Executes the render graph into a fresh command stream and, with a
    /// device attached, plays it back. `surface_view` backs the default
    /// framebuffer when presenting to a window.
    pub fn render(&mut self, surface_view: Option<&wgpu::TextureView>) {
        self.state.begin_frame();
        self.graph.execute(&mut self.state);

        if let Some(context) = &self.context {
            self.backend
                .execute(context, &self.registry, self.state.commands(), surface_view);
        }
    }
}
