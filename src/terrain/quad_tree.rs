//! Terrain QuadTree
//!
//! Recursive subdivision of a square in the XZ plane, used to give terrain
//! a higher geometry resolution near an observer than far away. The tree is
//! *restricted*: any two adjacent leaves differ by at most one LOD level,
//! which is what lets the terrain renderer close the seams between patches.
//!
//! Nodes live in a slotmap pool, so a key held by a renderer stays valid
//! across splits and collapses until that node itself is released.

use glam::{Vec2, Vec3};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Stable handle of a node inside the quadtree pool.
    pub struct QuadNodeKey;
}

/// Neighbour direction of a node, in the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Bottom = 0,
    Top = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Bottom,
        Direction::Top,
        Direction::Left,
        Direction::Right,
    ];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn inverse(self) -> Direction {
        match self {
            Direction::Bottom => Direction::Top,
            Direction::Top => Direction::Bottom,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// One node of the quadtree.
///
/// Quarter index layout: bit 0 set = right half (+x), bit 1 set = top half
/// (+z). `neighbour_lods[d]` holds the maximum LOD over all leaves touching
/// side `d`, or -1 when the tree ends there.
#[derive(Debug)]
pub struct QuadNode {
    /// `None` for a leaf, otherwise the four children indexed by quarter.
    pub children: Option<[QuadNodeKey; 4]>,
    pub parent: Option<QuadNodeKey>,
    pub quarter_index: u8,
    /// Offset of this node's centre from its parent's centre.
    pub xz_separation: Vec2,
    pub lod: i32,
    pub neighbour_lods: [i32; 4],
}

impl QuadNode {
    fn root() -> Self {
        Self {
            children: None,
            parent: None,
            quarter_index: 0,
            xz_separation: Vec2::ZERO,
            lod: 0,
            neighbour_lods: [-1; 4],
        }
    }

    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A leaf yielded by [`QuadTree::for_each_leaf`].
#[derive(Clone, Copy, Debug)]
pub struct LeafInfo {
    /// Centre of the leaf relative to the root centre.
    pub xz: Vec2,
    pub lod: i32,
    pub neighbour_lods: [i32; 4],
}

/// Adaptive spatial subdivision with neighbour-LOD consistency.
pub struct QuadTree {
    size: f32,
    /// Minimum observer distance per level, outermost level first.
    lod_distances: Vec<f32>,
    nodes: SlotMap<QuadNodeKey, QuadNode>,
    root: QuadNodeKey,
}

impl QuadTree {
    /// Creates a tree covering a `size` × `size` square.
    ///
    /// `lod_distances` must contain at least one entry (LOD 0).
    #[must_use]
    pub fn new(size: f32, lod_distances: Vec<f32>) -> Self {
        assert!(
            !lod_distances.is_empty(),
            "lod_distances must cover at least LOD 0"
        );
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(QuadNode::root());
        Self {
            size,
            lod_distances,
            nodes,
            root,
        }
    }

    #[must_use]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[must_use]
    pub fn lod_distances(&self) -> &[f32] {
        &self.lod_distances
    }

    #[must_use]
    pub fn root(&self) -> QuadNodeKey {
        self.root
    }

    #[must_use]
    pub fn node(&self, key: QuadNodeKey) -> Option<&QuadNode> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resets the tree to a single root leaf covering the new size.
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        self.reset();
    }

    /// Resets the tree to a single root leaf with new LOD distances.
    pub fn set_lod_distances(&mut self, lod_distances: Vec<f32>) {
        assert!(
            !lod_distances.is_empty(),
            "lod_distances must cover at least LOD 0"
        );
        self.lod_distances = lod_distances;
        self.reset();
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(QuadNode::root());
    }

    /// Re-walks the tree against the observer position (local space),
    /// splitting nodes the observer is near and collapsing nodes it left.
    /// Called once per frame before terrain submission.
    pub fn update_highest_lod_location(&mut self, position: Vec3) {
        let focus = Vec2::new(position.x, position.z);
        self.update_node(self.root, Vec2::ZERO, focus);
    }

    /// Visits every leaf with its absolute XZ offset, LOD and neighbour
    /// LODs.
    pub fn for_each_leaf(&self, mut callback: impl FnMut(&LeafInfo)) {
        self.visit_leaves(self.root, Vec2::ZERO, &mut callback);
    }

    fn visit_leaves(
        &self,
        key: QuadNodeKey,
        parent_location: Vec2,
        callback: &mut impl FnMut(&LeafInfo),
    ) {
        let node = &self.nodes[key];
        let location = parent_location + node.xz_separation;
        match node.children {
            None => callback(&LeafInfo {
                xz: location,
                lod: node.lod,
                neighbour_lods: node.neighbour_lods,
            }),
            Some(children) => {
                for child in children {
                    self.visit_leaves(child, location, callback);
                }
            }
        }
    }

    // ========================================================================
    // Update walk
    // ========================================================================

    fn max_lod(&self) -> i32 {
        self.lod_distances.len() as i32 - 1
    }

    fn update_node(&mut self, key: QuadNodeKey, parent_location: Vec2, focus: Vec2) {
        let node_location = parent_location + self.nodes[key].xz_separation;
        let distance = focus.distance(node_location);
        let lod = self.nodes[key].lod;

        if lod < self.max_lod() && distance < self.lod_distances[lod as usize] {
            // The observer is close enough for a finer level.
            if self.nodes[key].children.is_none() {
                self.split(key);
            }
            for quarter in 0..4 {
                // Re-read: neighbour splits during the walk may reshape us.
                if let Some(children) = self.nodes[key].children {
                    self.update_node(children[quarter], node_location, focus);
                }
            }
        } else if self.nodes[key].children.is_some() {
            for quarter in 0..4 {
                if let Some(children) = self.nodes[key].children {
                    self.update_node(children[quarter], node_location, focus);
                }
            }

            // Collapse only when all four children are leaves and no
            // neighbour is finer than they are.
            let collapsible = self.nodes[key].children.is_some_and(|children| {
                children.iter().all(|&child| {
                    let c = &self.nodes[child];
                    c.is_leaf() && c.neighbour_lods.iter().all(|&l| l - c.lod <= 0)
                })
            });
            if collapsible {
                self.collapse(key);
            }
        }
    }

    /// Splits a leaf into four children and re-syncs neighbour LODs,
    /// splitting neighbours as needed to keep the 2:1 restriction.
    fn split(&mut self, key: QuadNodeKey) {
        // Neighbour cascades may reach a node that was already split
        // earlier in the same walk.
        if !self.nodes[key].is_leaf() {
            return;
        }
        let lod = self.nodes[key].lod;

        let child_separation = self.size / 2f32.powi(lod + 2);
        let mut children = [QuadNodeKey::default(); 4];
        for i in 0..2u8 {
            for j in 0..2u8 {
                let quarter = 2 * i + j;
                let child = self.nodes.insert(QuadNode {
                    children: None,
                    parent: Some(key),
                    quarter_index: quarter,
                    xz_separation: Vec2::new(
                        if j == 1 { child_separation } else { -child_separation },
                        if i == 1 { child_separation } else { -child_separation },
                    ),
                    lod: lod + 1,
                    neighbour_lods: [-1; 4],
                });
                children[quarter as usize] = child;
            }
        }
        self.nodes[key].children = Some(children);

        self.update_neighbours(key);
    }

    /// Collapses an internal node back into a leaf, releasing the children,
    /// then refreshes the neighbour-LOD bookkeeping.
    fn collapse(&mut self, key: QuadNodeKey) {
        if let Some(children) = self.nodes[key].children.take() {
            for child in children {
                self.remove_subtree(child);
            }
        }
        self.update_neighbours(key);
    }

    fn remove_subtree(&mut self, key: QuadNodeKey) {
        if let Some(node) = self.nodes.remove(key)
            && let Some(children) = node.children
        {
            for child in children {
                self.remove_subtree(child);
            }
        }
    }

    /// Syncs the neighbour-LOD arrays of `key` (a leaf) and of every leaf
    /// facing it, splitting whichever side violates the 2:1 restriction.
    fn update_neighbours(&mut self, key: QuadNodeKey) {
        if let Some(children) = self.nodes[key].children {
            for child in children {
                self.update_neighbours(child);
            }
            return;
        }

        for direction in Direction::ALL {
            self.nodes[key].neighbour_lods[direction.index()] = -1;

            for neighbour in self.neighbours(key, direction) {
                if !self.nodes.contains_key(neighbour) {
                    continue;
                }

                // Refresh the neighbour's view of our side first.
                let inverse = direction.inverse();
                let mut facing_max = -1;
                for facing in self.neighbours(neighbour, inverse) {
                    if let Some(n) = self.nodes.get(facing) {
                        facing_max = facing_max.max(n.lod);
                    }
                }
                self.nodes[neighbour].neighbour_lods[inverse.index()] = facing_max;

                let neighbour_lod = self.nodes[neighbour].lod;
                let own = &mut self.nodes[key].neighbour_lods[direction.index()];
                *own = (*own).max(neighbour_lod);

                // Restore the restriction by splitting the coarser side.
                let lod_difference = self.nodes[key].lod - neighbour_lod;
                if lod_difference > 1 {
                    self.split(neighbour);
                } else if lod_difference < -1 {
                    self.split(key);
                }
            }
        }
    }

    // ========================================================================
    // Neighbour search
    // ========================================================================

    /// All leaves touching `key`'s side in `direction`.
    ///
    /// Classical restricted-quadtree walk: ascend while the node lies on
    /// the facing side, then descend the mirrored path, fanning out over
    /// the children that touch the shared edge.
    fn neighbours(&self, key: QuadNodeKey, direction: Direction) -> Vec<QuadNodeKey> {
        let mut path = Vec::new();
        let mut result = Vec::new();
        self.collect_neighbours(key, direction, true, &mut path, &mut result);
        result
    }

    fn collect_neighbours(
        &self,
        key: QuadNodeKey,
        direction: Direction,
        ascending: bool,
        path: &mut Vec<QuadNodeKey>,
        result: &mut Vec<QuadNodeKey>,
    ) {
        let node = &self.nodes[key];

        if ascending {
            // The root has no neighbour in any direction.
            let Some(parent) = node.parent else {
                return;
            };
            path.push(key);
            let continue_ascending = Self::is_at_direction(node.quarter_index, direction);
            self.collect_neighbours(parent, direction, continue_ascending, path, result);
        } else if node.is_leaf() {
            result.push(key);
        } else if path.is_empty() {
            // Fan out over every child on the edge facing back at us.
            let children = node.children.expect("internal node has children");
            for child in children {
                if Self::is_at_direction(self.nodes[child].quarter_index, direction.inverse()) {
                    self.collect_neighbours(child, direction, false, path, result);
                }
            }
        } else {
            // Mirror the ascent path back down.
            let path_key = path.pop().expect("checked non-empty");
            let path_node = &self.nodes[path_key];
            let child_direction = if path_node.parent == Some(key) {
                direction
            } else {
                direction.inverse()
            };
            let quarter = Self::select_child(path_node.quarter_index, child_direction);
            let children = node.children.expect("internal node has children");
            self.collect_neighbours(children[quarter as usize], direction, false, path, result);
        }
    }

    /// Whether a quarter lies on the given side of its parent.
    const fn is_at_direction(quarter_index: u8, direction: Direction) -> bool {
        match direction {
            Direction::Bottom => (quarter_index >> 1) == 0,
            Direction::Top => (quarter_index >> 1) == 1,
            Direction::Left => (quarter_index & 1) == 0,
            Direction::Right => (quarter_index & 1) == 1,
        }
    }

    /// Child quarter adjacent to `quarter_index` across `direction`.
    const fn select_child(quarter_index: u8, direction: Direction) -> u8 {
        match direction {
            Direction::Bottom => quarter_index & 1,
            Direction::Top => 2 + (quarter_index & 1),
            Direction::Left => 2 * (quarter_index >> 1),
            Direction::Right => 1 + 2 * (quarter_index >> 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_side_tests() {
        // Quarter 0 = bottom-left, 1 = bottom-right, 2 = top-left,
        // 3 = top-right.
        assert!(QuadTree::is_at_direction(0, Direction::Bottom));
        assert!(QuadTree::is_at_direction(0, Direction::Left));
        assert!(QuadTree::is_at_direction(3, Direction::Top));
        assert!(QuadTree::is_at_direction(3, Direction::Right));
        assert!(!QuadTree::is_at_direction(1, Direction::Left));
    }

    #[test]
    fn select_child_mirrors_across_edges() {
        // The top neighbour of quarter 2 (top-left) is reached through the
        // bottom-left child (quarter 0) of the node above.
        assert_eq!(QuadTree::select_child(2, Direction::Bottom), 0);
        // And descending back down towards the top edge selects the
        // matching top quarter.
        assert_eq!(QuadTree::select_child(0, Direction::Top), 2);
        assert_eq!(QuadTree::select_child(1, Direction::Top), 3);
        assert_eq!(QuadTree::select_child(2, Direction::Right), 3);
    }

    #[test]
    fn split_creates_quarter_offsets() {
        let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0]);
        tree.split(tree.root());

        let root = tree.node(tree.root()).unwrap();
        let children = root.children.unwrap();
        // Separation is size / 2^(lod + 2) = 250.
        let bl = tree.node(children[0]).unwrap();
        assert_eq!(bl.xz_separation, Vec2::new(-250.0, -250.0));
        let tr = tree.node(children[3]).unwrap();
        assert_eq!(tr.xz_separation, Vec2::new(250.0, 250.0));
        assert_eq!(tr.lod, 1);
    }
}
