//! Renderer Node Integration Tests
//!
//! Tests for:
//! - Frustum filter plane extraction and AABB rejection (scenario 6)
//! - Queue sorting: one pass bind per run, draw counts, clear-after-render
//! - Terrain renderer: patch variant batching, instanced draws
//! - 2D renderer: z-ordering and batch flushes
//! - Shadow sub-graph: per-light depth passes and merge wiring

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use vesper::graph::RenderGraph;
use vesper::graphics::{
    Bindable, GraphicsCommand, GraphicsState, Mesh, Program, SharedBindable,
};
use vesper::render::{
    Filter, FrustumFilter, MergeShadowsNode, MeshRenderer, Pass, Quad2D, Renderable3D, Renderer2D,
    ShadowSubGraph, SharedPass, SharedRenderable, TerrainLeaf, TerrainRenderer,
};

/// Renderable stub with a fixed AABB and a draw counter.
struct BoxRenderable {
    min: Vec3,
    max: Vec3,
    draws: Rc<RefCell<u32>>,
}

impl BoxRenderable {
    fn shared(min: Vec3, max: Vec3, draws: &Rc<RefCell<u32>>) -> SharedRenderable {
        Rc::new(Self {
            min,
            max,
            draws: draws.clone(),
        })
    }
}

impl Renderable3D for BoxRenderable {
    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }

    fn draw(&self, _state: &mut GraphicsState) {
        *self.draws.borrow_mut() += 1;
    }
}

fn program_pass(label: &str) -> (SharedPass, Arc<Program>) {
    let program = Arc::new(Program::new(label));
    let bindable: SharedBindable = program.clone();
    (Rc::new(Pass::new().with_bindable(bindable)), program)
}

fn bind_program_count(state: &GraphicsState, program: &Program) -> usize {
    state
        .commands()
        .iter()
        .filter(|c| **c == GraphicsCommand::BindProgram(program.resource_id()))
        .count()
}

// ============================================================================
// Frustum Filter (end-to-end scenario 6)
// ============================================================================

#[test]
fn frustum_rejects_box_behind_camera() {
    // near = 1, far = 10, looking down -Z from the origin.
    let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 1.0, 10.0);
    let filter = FrustumFilter::new();
    filter.update_frustum(projection);

    let draws = Rc::new(RefCell::new(0));
    let behind = BoxRenderable::shared(
        Vec3::new(-0.5, -0.5, 4.5),
        Vec3::new(0.5, 0.5, 5.5),
        &draws,
    );
    let in_front = BoxRenderable::shared(
        Vec3::new(-0.5, -0.5, -5.5),
        Vec3::new(0.5, 0.5, -4.5),
        &draws,
    );

    assert!(
        !filter.should_be_rendered(behind.as_ref()),
        "box at z = +5 is behind the camera"
    );
    assert!(
        filter.should_be_rendered(in_front.as_ref()),
        "box at z = -5 is inside the frustum"
    );
}

#[test]
fn frustum_rejects_beyond_far_plane() {
    let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 1.0, 10.0);
    let filter = FrustumFilter::new();
    filter.update_frustum(projection);

    let draws = Rc::new(RefCell::new(0));
    let too_far = BoxRenderable::shared(
        Vec3::new(-0.5, -0.5, -50.0),
        Vec3::new(0.5, 0.5, -49.0),
        &draws,
    );
    assert!(!filter.should_be_rendered(too_far.as_ref()));
}

#[test]
fn fresh_filter_accepts_everything() {
    let filter = FrustumFilter::new();
    let draws = Rc::new(RefCell::new(0));
    let anywhere = BoxRenderable::shared(Vec3::splat(1e6), Vec3::splat(1e6 + 1.0), &draws);
    assert!(filter.should_be_rendered(anywhere.as_ref()));
}

#[test]
fn filter_applies_at_submission() {
    struct RejectAll;
    impl Filter for RejectAll {
        fn should_be_rendered(&self, _renderable: &dyn Renderable3D) -> bool {
            false
        }
    }

    let renderer = MeshRenderer::new();
    renderer.add_filter(Rc::new(RejectAll));

    let draws = Rc::new(RefCell::new(0));
    let (pass, _) = program_pass("opaque");
    renderer.submit(
        BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws),
        pass,
    );
    assert_eq!(renderer.queue().borrow().len(), 0, "rejected at submit time");
}

// ============================================================================
// Queue sorting and pass binding
// ============================================================================

#[test]
fn each_pass_binds_once_per_run() {
    let mut graph = RenderGraph::new();
    let renderer = MeshRenderer::new();
    let queue = renderer.queue();
    graph.add_node("meshes", renderer).unwrap();
    graph.prepare().unwrap();

    let draws = Rc::new(RefCell::new(0));
    let (pass_a, program_a) = program_pass("pass-a");
    let (pass_b, program_b) = program_pass("pass-b");

    // Interleaved submissions across two passes.
    {
        let mut q = queue.borrow_mut();
        q.submit(BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws), pass_b.clone());
        q.submit(BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws), pass_a.clone());
        q.submit(BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws), pass_b.clone());
        q.submit(BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws), pass_a.clone());
    }

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    assert_eq!(*draws.borrow(), 4, "every submission draws");
    assert_eq!(
        bind_program_count(&state, &program_a),
        1,
        "pass A binds exactly once"
    );
    assert_eq!(
        bind_program_count(&state, &program_b),
        1,
        "pass B binds exactly once"
    );
    assert_eq!(queue.borrow().len(), 0, "queue clears after render");
}

#[test]
fn passes_draw_in_id_order() {
    let (pass_first, program_first) = program_pass("first");
    let (pass_second, program_second) = program_pass("second");
    assert!(pass_first.id() < pass_second.id(), "creation order gives ids");

    let mut graph = RenderGraph::new();
    let renderer = MeshRenderer::new();
    let queue = renderer.queue();
    graph.add_node("meshes", renderer).unwrap();
    graph.prepare().unwrap();

    let draws = Rc::new(RefCell::new(0));
    {
        let mut q = queue.borrow_mut();
        q.submit(
            BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws),
            pass_second.clone(),
        );
        q.submit(
            BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws),
            pass_first.clone(),
        );
    }

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    let first_pos = state
        .commands()
        .iter()
        .position(|c| *c == GraphicsCommand::BindProgram(program_first.resource_id()))
        .unwrap();
    let second_pos = state
        .commands()
        .iter()
        .position(|c| *c == GraphicsCommand::BindProgram(program_second.resource_id()))
        .unwrap();
    assert!(first_pos < second_pos, "lower pass id draws first");
}

// ============================================================================
// Terrain renderer
// ============================================================================

#[test]
fn terrain_leaves_batch_into_instanced_draws() {
    let mut graph = RenderGraph::new();
    let renderer = TerrainRenderer::new();
    let queue = renderer.queue();
    graph.add_node("terrain", renderer).unwrap();
    graph.prepare().unwrap();

    let (pass, program) = program_pass("terrain-pass");
    {
        let mut q = queue.borrow_mut();
        // Two full patches and one bottom-stitched patch.
        for (xz, neighbours) in [
            (glam::Vec2::new(-250.0, -250.0), [1, 1, 1, 1]),
            (glam::Vec2::new(250.0, -250.0), [1, 1, 1, 1]),
            (glam::Vec2::new(-250.0, 250.0), [0, 1, 1, 1]),
        ] {
            q.submit(
                TerrainLeaf {
                    xz,
                    lod: 1,
                    neighbour_lods: neighbours,
                },
                pass.clone(),
            );
        }
    }

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    let draws: Vec<u32> = state
        .commands()
        .iter()
        .filter_map(|c| match c {
            GraphicsCommand::Draw { instances, .. } => Some(*instances),
            _ => None,
        })
        .collect();
    assert_eq!(draws.len(), 2, "one draw per non-empty patch variant");
    assert!(draws.contains(&2), "the two full patches share one draw");
    assert!(draws.contains(&1));
    assert_eq!(bind_program_count(&state, &program), 1);
    assert_eq!(queue.borrow().len(), 0);

    let uploads = state
        .commands()
        .iter()
        .filter(|c| matches!(c, GraphicsCommand::UploadInstances { .. }))
        .count();
    assert_eq!(uploads, 2, "instance data per drawn variant");
}

// ============================================================================
// 2D renderer
// ============================================================================

#[test]
fn renderer2d_orders_by_z_and_batches() {
    let mut graph = RenderGraph::new();
    let renderer = Renderer2D::new();
    renderer.set_resolution(800.0, 600.0);
    let queue = renderer.queue();
    graph.add_node("hud", renderer).unwrap();
    graph.prepare().unwrap();

    let (pass, program) = program_pass("hud-pass");
    let quad = |x: f32| Quad2D {
        position: [x, 0.0],
        size: [10.0, 10.0],
        color: [1.0, 1.0, 1.0, 1.0],
    };
    queue.submit(quad(0.0), 5, pass.clone());
    queue.submit(quad(20.0), 1, pass.clone());
    queue.submit(quad(40.0), 5, pass.clone());

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    // Same pass throughout: one bind, one instanced draw with all quads.
    assert_eq!(bind_program_count(&state, &program), 1);
    let instances: Vec<u32> = state
        .commands()
        .iter()
        .filter_map(|c| match c {
            GraphicsCommand::Draw { instances, .. } => Some(*instances),
            _ => None,
        })
        .collect();
    assert_eq!(instances, vec![3]);
}

// ============================================================================
// Shadow sub-graph and merge
// ============================================================================

#[test]
fn shadow_subgraph_renders_casters_per_light() {
    let mut graph = RenderGraph::new();
    let mut shadows = ShadowSubGraph::new(1024);
    let caster_queue = shadows.mesh_queue();
    let light_a = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0);
    let light_b = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)) * light_a;
    shadows.enable_shadow(0, light_a);
    shadows.enable_shadow(1, light_b);
    assert_eq!(shadows.active_count(), 2);

    graph.add_node("shadows", shadows).unwrap();
    graph.prepare().unwrap();

    let draws = Rc::new(RefCell::new(0));
    let (depth_pass, _) = program_pass("depth-pass");
    caster_queue.borrow_mut().submit(
        BoxRenderable::shared(Vec3::ZERO, Vec3::ONE, &draws),
        depth_pass,
    );

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    assert_eq!(*draws.borrow(), 2, "one caster render per active light");

    let depth_clears = state
        .commands()
        .iter()
        .filter(|c| matches!(c, GraphicsCommand::Clear { color: None, depth: true }))
        .count();
    assert_eq!(depth_clears, 2, "each light's depth target clears");

    assert_eq!(
        caster_queue.borrow().len(),
        0,
        "caster queue clears after all lights rendered"
    );
}

#[test]
fn merge_node_receives_shadow_maps_and_draws() {
    let mut graph = RenderGraph::new();

    let shadows = ShadowSubGraph::new(512);
    let shadow_map0 = shadows.depth_texture(0).unwrap().clone();
    graph.add_node("shadows", shadows).unwrap();

    let merge_program = Arc::new(Program::new("merge-program"));
    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct PlaneVertex {
        position: [f32; 2],
    }
    let plane = Arc::new(
        Mesh::from_vertices(
            "fullscreen-plane",
            &[
                PlaneVertex { position: [-1.0, -1.0] },
                PlaneVertex { position: [3.0, -1.0] },
                PlaneVertex { position: [-1.0, 3.0] },
            ],
        ),
    );
    let merge = MergeShadowsNode::new(merge_program.clone(), plane);
    merge.enable_shadow(0, true);
    merge.set_inv_camera_vp(Mat4::IDENTITY);
    graph.add_node("merge-shadows", merge).unwrap();

    graph
        .connect_names("shadows", "shadow0", "merge-shadows", "shadow0")
        .unwrap();
    graph.prepare().unwrap();

    let mut state = GraphicsState::new();
    graph.execute(&mut state);

    // The merge drew its plane under its own program.
    assert_eq!(bind_program_count(&state, &merge_program), 1);
    assert!(
        state
            .commands()
            .iter()
            .any(|c| matches!(c, GraphicsCommand::Draw { .. })),
        "merge draws the fullscreen plane"
    );

    // The connected shadow map is bound at unit 0.
    assert!(
        state.commands().iter().any(|c| {
            *c == GraphicsCommand::BindTexture {
                unit: 0,
                texture: shadow_map0.resource_id(),
            }
        }),
        "shadow map 0 must bind at texture unit 0"
    );
}
