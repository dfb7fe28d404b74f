#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod ecs;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod graphics;
pub mod render;
pub mod systems;
pub mod terrain;
pub mod utils;

pub use ecs::{ComponentMask, Entity, EntityDatabase, System, TableKind};
pub use engine::Engine;
pub use errors::{Result, VesperError};
pub use graph::{NodeContext, NodeKey, RenderGraph, RenderNode};
pub use graphics::{Bindable, FrameBuffer, GraphicsState, Mesh, Program, Texture};
pub use render::{Camera, FrustumFilter, Pass, Renderable3D};
pub use terrain::{QuadTree, RenderableTerrain};
pub use utils::time::FrameClock;
