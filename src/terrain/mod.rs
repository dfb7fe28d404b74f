//! Level-of-Detail Terrain
//!
//! A restricted quadtree ([`QuadTree`]) that keeps adjacent leaves within
//! one LOD level of each other as the observer moves, plus the
//! [`RenderableTerrain`] component the terrain renderer consumes.

pub mod quad_tree;
pub mod terrain;

pub use quad_tree::{Direction, LeafInfo, QuadNode, QuadNodeKey, QuadTree};
pub use terrain::RenderableTerrain;
