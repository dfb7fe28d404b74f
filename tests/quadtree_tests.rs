//! Terrain QuadTree Integration Tests
//!
//! Tests for:
//! - Observer-driven split and collapse
//! - The restricted-quadtree invariant (adjacent leaves within 1 LOD)
//! - Neighbour-LOD bookkeeping
//! - Reset via set_size / set_lod_distances

use glam::{Vec2, Vec3};
use vesper::terrain::{LeafInfo, QuadTree};

fn leaves(tree: &QuadTree) -> Vec<LeafInfo> {
    let mut out = Vec::new();
    tree.for_each_leaf(|leaf| out.push(*leaf));
    out
}

fn leaf_size(tree: &QuadTree, leaf: &LeafInfo) -> f32 {
    tree.size() / 2f32.powi(leaf.lod)
}

/// True when the two leaves share an edge (corner contact excluded).
fn adjacent(tree: &QuadTree, a: &LeafInfo, b: &LeafInfo) -> bool {
    let half_sum = (leaf_size(tree, a) + leaf_size(tree, b)) * 0.5;
    let dx = (a.xz.x - b.xz.x).abs();
    let dz = (a.xz.y - b.xz.y).abs();
    let eps = 1e-3;
    let touch_x = (dx - half_sum).abs() < eps && dz < half_sum - eps;
    let touch_z = (dz - half_sum).abs() < eps && dx < half_sum - eps;
    touch_x || touch_z
}

/// Asserts the 2:1 restriction over the actual leaf geometry.
fn assert_restricted(tree: &QuadTree) {
    let leaves = leaves(tree);
    for (i, a) in leaves.iter().enumerate() {
        for b in &leaves[i + 1..] {
            if adjacent(tree, a, b) {
                assert!(
                    (a.lod - b.lod).abs() <= 1,
                    "adjacent leaves at {:?} (lod {}) and {:?} (lod {}) break the restriction",
                    a.xz,
                    a.lod,
                    b.xz,
                    b.lod
                );
            }
        }
    }
}

// ============================================================================
// Basic shape
// ============================================================================

#[test]
fn fresh_tree_is_one_root_leaf() {
    let tree = QuadTree::new(1000.0, vec![500.0]);
    let all = leaves(&tree);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].lod, 0);
    assert_eq!(all[0].xz, Vec2::ZERO);
    assert_eq!(all[0].neighbour_lods, [-1; 4], "the root has no neighbours");
}

#[test]
fn observer_at_centre_splits_root() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0, 125.0]);
    tree.update_highest_lod_location(Vec3::ZERO);

    let all = leaves(&tree);
    assert_eq!(all.len(), 4, "root splits into four LOD-1 leaves");
    assert!(all.iter().all(|l| l.lod == 1));

    // Quarter offsets are ±size / 2^(lod + 2).
    let offsets: Vec<Vec2> = all.iter().map(|l| l.xz).collect();
    for expected in [
        Vec2::new(-250.0, -250.0),
        Vec2::new(250.0, -250.0),
        Vec2::new(-250.0, 250.0),
        Vec2::new(250.0, 250.0),
    ] {
        assert!(offsets.contains(&expected), "missing quarter at {expected:?}");
    }
}

// ============================================================================
// End-to-end scenario 5
// ============================================================================

#[test]
fn observer_movement_keeps_restriction() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0, 125.0]);

    // Observer at centre: root splits to LOD 1.
    tree.update_highest_lod_location(Vec3::ZERO);
    assert_eq!(leaves(&tree).len(), 4);
    assert_restricted(&tree);

    // Observer at one quadrant centre: that quadrant splits further.
    tree.update_highest_lod_location(Vec3::new(-250.0, 0.0, -250.0));
    let all = leaves(&tree);
    assert_eq!(
        all.iter().filter(|l| l.lod == 2).count(),
        4,
        "the focused quadrant subdivides"
    );
    assert_eq!(all.iter().filter(|l| l.lod == 1).count(), 3);
    assert_restricted(&tree);

    // Wander around; the invariant must hold everywhere.
    for position in [
        Vec3::new(-400.0, 0.0, -400.0),
        Vec3::new(-400.0, 0.0, 400.0),
        Vec3::new(10.0, 0.0, 10.0),
        Vec3::new(499.0, 0.0, 0.0),
    ] {
        tree.update_highest_lod_location(position);
        assert_restricted(&tree);
    }
}

#[test]
fn observer_height_does_not_change_the_walk() {
    let mut flat = QuadTree::new(1000.0, vec![500.0, 250.0]);
    let mut high = QuadTree::new(1000.0, vec![500.0, 250.0]);

    flat.update_highest_lod_location(Vec3::new(-250.0, 0.0, -250.0));
    high.update_highest_lod_location(Vec3::new(-250.0, 9000.0, -250.0));

    assert_eq!(leaves(&flat).len(), leaves(&high).len(), "distance is XZ only");
}

// ============================================================================
// Collapse
// ============================================================================

#[test]
fn split_then_collapse_restores_the_leaf() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0]);

    tree.update_highest_lod_location(Vec3::ZERO);
    assert_eq!(leaves(&tree).len(), 4);

    // Move the observer far away: the tree folds back to a single root
    // leaf with its original state.
    tree.update_highest_lod_location(Vec3::new(10_000.0, 0.0, 10_000.0));
    let all = leaves(&tree);
    assert_eq!(all.len(), 1, "collapse releases the children");
    assert_eq!(all[0].lod, 0);
    assert_eq!(all[0].neighbour_lods, [-1; 4]);
    assert_eq!(tree.node_count(), 1, "released nodes leave the pool");
}

#[test]
fn partial_collapse_respects_finer_neighbours() {
    let mut tree = QuadTree::new(1000.0, vec![600.0, 400.0, 200.0]);

    // Deep subdivision near one corner.
    tree.update_highest_lod_location(Vec3::new(-400.0, 0.0, -400.0));
    assert_restricted(&tree);
    let deep = leaves(&tree).len();
    assert!(deep > 4);

    // Stepping back one ring coarsens gradually, never past the
    // restriction.
    tree.update_highest_lod_location(Vec3::new(-100.0, 0.0, -100.0));
    assert_restricted(&tree);
    tree.update_highest_lod_location(Vec3::new(2000.0, 0.0, 2000.0));
    assert_eq!(leaves(&tree).len(), 1);
}

// ============================================================================
// Neighbour bookkeeping
// ============================================================================

#[test]
fn neighbour_lods_match_geometry() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0, 125.0]);
    tree.update_highest_lod_location(Vec3::new(-250.0, 0.0, -250.0));

    let all = leaves(&tree);
    // Directions: 0 = bottom (-z), 1 = top (+z), 2 = left (-x), 3 = right.
    for leaf in &all {
        for (direction, &recorded) in leaf.neighbour_lods.iter().enumerate() {
            let expected = all
                .iter()
                .filter(|other| {
                    adjacent(&tree, leaf, other)
                        && match direction {
                            0 => other.xz.y < leaf.xz.y,
                            1 => other.xz.y > leaf.xz.y,
                            2 => other.xz.x < leaf.xz.x,
                            _ => other.xz.x > leaf.xz.x,
                        }
                })
                .map(|other| other.lod)
                .max()
                .unwrap_or(-1);
            assert_eq!(
                recorded, expected,
                "leaf at {:?} lod {}: direction {direction}",
                leaf.xz, leaf.lod
            );
        }
    }
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn set_size_resets_to_root_leaf() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0]);
    tree.update_highest_lod_location(Vec3::ZERO);
    assert!(tree.node_count() > 1);

    tree.set_size(2000.0);
    assert_eq!(tree.size(), 2000.0);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(leaves(&tree).len(), 1);
}

#[test]
fn set_lod_distances_resets_to_root_leaf() {
    let mut tree = QuadTree::new(1000.0, vec![500.0, 250.0]);
    tree.update_highest_lod_location(Vec3::ZERO);

    tree.set_lod_distances(vec![800.0, 400.0, 200.0, 100.0]);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.lod_distances(), &[800.0, 400.0, 200.0, 100.0]);
}
