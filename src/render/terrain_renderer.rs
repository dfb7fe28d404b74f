//! Terrain Renderer Node
//!
//! Draws the quadtree's leaves as instanced patches. Every leaf becomes one
//! instance carrying its XZ offset and LOD; the patch *mesh* is chosen from
//! nine variants (full, four sides, four corners) so that edges facing a
//! coarser neighbour drop their midpoint vertex and the seam between LOD
//! levels closes without gaps or T-junctions.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::pass::SharedPass;
use crate::graph::{NodeContext, NodeSpec, RenderNode};
use crate::graphics::{FrameBuffer, GraphicsState, Mesh, PrimitiveType};
use crate::terrain::LeafInfo;

use super::mesh_renderer::TARGET_SLOT;

bitflags! {
    /// Sides of a leaf whose neighbour is one LOD coarser.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EdgeMask: u8 {
        const BOTTOM = 1 << 0;
        const TOP    = 1 << 1;
        const LEFT   = 1 << 2;
        const RIGHT  = 1 << 3;
    }
}

/// Patch vertex: XZ position in the unit patch, [-0.5, 0.5].
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 2],
}

/// Per-leaf instance attributes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TerrainInstance {
    /// Leaf centre relative to the terrain centre.
    pub offset: [f32; 2],
    pub lod: i32,
}

/// One queued leaf.
#[derive(Clone, Copy, Debug)]
pub struct TerrainLeaf {
    pub xz: Vec2,
    pub lod: i32,
    pub neighbour_lods: [i32; 4],
}

impl From<&LeafInfo> for TerrainLeaf {
    fn from(leaf: &LeafInfo) -> Self {
        Self {
            xz: leaf.xz,
            lod: leaf.lod,
            neighbour_lods: leaf.neighbour_lods,
        }
    }
}

/// Queue of `(leaf, pass)` submissions, filled by the terrain system.
#[derive(Default)]
pub struct TerrainQueue {
    entries: Vec<(TerrainLeaf, SharedPass)>,
}

impl TerrainQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(256),
        }
    }

    pub fn submit(&mut self, leaf: TerrainLeaf, pass: SharedPass) {
        self.entries.push((leaf, pass));
    }

    pub fn sort(&mut self) {
        self.entries.sort_unstable_by_key(|(_, pass)| pass.id());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[(TerrainLeaf, SharedPass)] {
        &self.entries
    }
}

/// Handle shared between the terrain system and the draining node.
pub type SharedTerrainQueue = Rc<RefCell<TerrainQueue>>;

// ============================================================================
// Patch geometry
// ============================================================================

/// Vertex grid of one patch: 3 × 3, indexed `z * 3 + x`, bottom row first.
const PATCH_GRID: [TerrainVertex; 9] = [
    TerrainVertex { position: [-0.5, -0.5] },
    TerrainVertex { position: [0.0, -0.5] },
    TerrainVertex { position: [0.5, -0.5] },
    TerrainVertex { position: [-0.5, 0.0] },
    TerrainVertex { position: [0.0, 0.0] },
    TerrainVertex { position: [0.5, 0.0] },
    TerrainVertex { position: [-0.5, 0.5] },
    TerrainVertex { position: [0.0, 0.5] },
    TerrainVertex { position: [0.5, 0.5] },
];

/// Index lists of the nine variants. A "coarse" edge omits its midpoint
/// vertex and fans across the full edge instead, matching the vertex
/// spacing of a neighbour one LOD below.
const PATCH_FULL: &[u32] = &[0, 1, 4, 0, 4, 3, 1, 2, 5, 1, 5, 4, 3, 4, 7, 3, 7, 6, 4, 5, 8, 4, 8, 7];
const PATCH_BOTTOM: &[u32] = &[0, 2, 4, 0, 4, 3, 2, 5, 4, 3, 4, 7, 3, 7, 6, 4, 5, 8, 4, 8, 7];
const PATCH_TOP: &[u32] = &[6, 4, 8, 3, 4, 6, 4, 5, 8, 0, 1, 4, 0, 4, 3, 1, 2, 5, 1, 5, 4];
const PATCH_LEFT: &[u32] = &[6, 0, 4, 0, 1, 4, 4, 7, 6, 1, 2, 5, 1, 5, 4, 4, 5, 8, 4, 8, 7];
const PATCH_RIGHT: &[u32] = &[2, 8, 4, 1, 2, 4, 4, 8, 7, 0, 1, 4, 0, 4, 3, 3, 4, 7, 3, 7, 6];
const PATCH_BOTTOM_LEFT: &[u32] = &[0, 2, 4, 2, 5, 4, 6, 0, 4, 4, 7, 6, 4, 5, 8, 4, 8, 7];
const PATCH_BOTTOM_RIGHT: &[u32] = &[0, 2, 4, 0, 4, 3, 2, 8, 4, 4, 8, 7, 3, 4, 7, 3, 7, 6];
const PATCH_TOP_LEFT: &[u32] = &[6, 4, 8, 4, 5, 8, 6, 0, 4, 0, 1, 4, 1, 2, 5, 1, 5, 4];
const PATCH_TOP_RIGHT: &[u32] = &[6, 4, 8, 3, 4, 6, 2, 8, 4, 1, 2, 4, 0, 1, 4, 0, 4, 3];

const PATCH_VARIANTS: [(&str, &[u32]); 9] = [
    ("terrain-patch-full", PATCH_FULL),
    ("terrain-patch-bottom", PATCH_BOTTOM),
    ("terrain-patch-top", PATCH_TOP),
    ("terrain-patch-left", PATCH_LEFT),
    ("terrain-patch-right", PATCH_RIGHT),
    ("terrain-patch-bottom-left", PATCH_BOTTOM_LEFT),
    ("terrain-patch-bottom-right", PATCH_BOTTOM_RIGHT),
    ("terrain-patch-top-left", PATCH_TOP_LEFT),
    ("terrain-patch-top-right", PATCH_TOP_RIGHT),
];

/// The nine patch meshes plus per-frame instance batches.
pub struct TerrainPatchSet {
    patches: [Mesh; 9],
    batches: [Vec<TerrainInstance>; 9],
}

impl Default for TerrainPatchSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TerrainPatchSet {
    #[must_use]
    pub fn new() -> Self {
        let patches = PATCH_VARIANTS.map(|(label, indices)| {
            Mesh::from_vertices(label, &PATCH_GRID).with_indices(indices.to_vec())
        });
        Self {
            patches,
            batches: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Which sides of a leaf face a coarser neighbour.
    #[must_use]
    pub fn coarse_edges(leaf: &TerrainLeaf) -> EdgeMask {
        const BITS: [EdgeMask; 4] = [
            EdgeMask::BOTTOM,
            EdgeMask::TOP,
            EdgeMask::LEFT,
            EdgeMask::RIGHT,
        ];
        let mut mask = EdgeMask::empty();
        for (direction, bit) in BITS.iter().enumerate() {
            let neighbour = leaf.neighbour_lods[direction];
            if neighbour >= 0 && neighbour < leaf.lod {
                mask |= *bit;
            }
        }
        mask
    }

    /// Which patch variant a leaf needs, from its coarser-neighbour sides.
    #[must_use]
    pub fn variant_for(leaf: &TerrainLeaf) -> usize {
        let mask = Self::coarse_edges(leaf);
        let sides = (
            mask.contains(EdgeMask::BOTTOM),
            mask.contains(EdgeMask::TOP),
            mask.contains(EdgeMask::LEFT),
            mask.contains(EdgeMask::RIGHT),
        );
        match sides {
            (false, false, false, false) => 0,
            (true, false, false, false) => 1,
            (false, true, false, false) => 2,
            (false, false, true, false) => 3,
            (false, false, false, true) => 4,
            (true, false, true, false) => 5,
            (true, false, false, true) => 6,
            (false, true, true, false) => 7,
            (false, true, false, true) => 8,
            _ => {
                // Opposite-side combinations cannot come out of a
                // restricted tree; a stray one still draws, just unseamed.
                log::debug!("Unexpected terrain edge mask {mask:?}, using full patch");
                0
            }
        }
    }

    /// Draws a sorted `(leaf, pass)` queue: one pass bind per run, one
    /// instanced draw per non-empty patch variant within the run.
    pub fn draw_queue(
        &mut self,
        state: &mut GraphicsState,
        entries: &[(TerrainLeaf, SharedPass)],
    ) {
        let mut current: Option<&SharedPass> = None;
        for (leaf, pass) in entries {
            match current {
                Some(bound) if bound.id() == pass.id() => {}
                _ => {
                    if let Some(bound) = current {
                        self.flush(state);
                        bound.unbind(state);
                    }
                    pass.bind(state);
                    current = Some(pass);
                }
            }
            self.batches[Self::variant_for(leaf)].push(TerrainInstance {
                offset: leaf.xz.to_array(),
                lod: leaf.lod,
            });
        }
        if let Some(bound) = current {
            self.flush(state);
            bound.unbind(state);
        }
    }

    fn flush(&mut self, state: &mut GraphicsState) {
        for (variant, batch) in self.batches.iter_mut().enumerate() {
            if !batch.is_empty() {
                self.patches[variant].draw_instanced(state, PrimitiveType::Triangles, batch);
                batch.clear();
            }
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// Queue-draining node for terrain leaves.
pub struct TerrainRenderer {
    queue: SharedTerrainQueue,
    patches: TerrainPatchSet,
}

impl Default for TerrainRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerrainRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(TerrainQueue::new())),
            patches: TerrainPatchSet::new(),
        }
    }

    /// Submission handle for the terrain system.
    #[must_use]
    pub fn queue(&self) -> SharedTerrainQueue {
        self.queue.clone()
    }
}

impl RenderNode for TerrainRenderer {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new()
            .slot(None, true)
            .input::<FrameBuffer>("target", TARGET_SLOT)
            .output::<FrameBuffer>("target", TARGET_SLOT)
            .attach_input("attach")
            .attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        let mut queue = self.queue.borrow_mut();
        queue.sort();
        self.patches.draw_queue(ctx.state, queue.entries());
        queue.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(lod: i32, neighbour_lods: [i32; 4]) -> TerrainLeaf {
        TerrainLeaf {
            xz: Vec2::ZERO,
            lod,
            neighbour_lods,
        }
    }

    #[test]
    fn variant_selection() {
        // All neighbours at our level: full patch.
        assert_eq!(TerrainPatchSet::variant_for(&leaf(2, [2, 2, 2, 2])), 0);
        // Coarser neighbour below: bottom variant.
        assert_eq!(TerrainPatchSet::variant_for(&leaf(2, [1, 2, 2, 2])), 1);
        // Coarser below and left: corner variant.
        assert_eq!(TerrainPatchSet::variant_for(&leaf(2, [1, 2, 1, 2])), 5);
        // Finer neighbours never change the patch.
        assert_eq!(TerrainPatchSet::variant_for(&leaf(2, [3, 3, 3, 3])), 0);
        // Tree edge (-1) counts as same-level.
        assert_eq!(TerrainPatchSet::variant_for(&leaf(0, [-1, -1, -1, -1])), 0);
    }

    #[test]
    fn patch_triangulations_cover_the_patch() {
        // Every variant must triangulate the full unit square: the signed
        // areas of its triangles must sum to 1 (no holes, no overlap given
        // positive orientation).
        for (label, indices) in PATCH_VARIANTS {
            assert_eq!(indices.len() % 3, 0);
            let mut area = 0.0f32;
            for tri in indices.chunks(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| PATCH_GRID[i as usize].position);
                let signed =
                    0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]));
                assert!(signed > 0.0, "{label}: triangle {tri:?} is degenerate or flipped");
                area += signed;
            }
            assert!(
                (area - 1.0).abs() < 1e-6,
                "{label}: triangulated area {area} != 1"
            );
        }
    }
}
