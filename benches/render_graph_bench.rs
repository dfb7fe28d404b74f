//! Render graph and entity iteration benchmarks.
//!
//! Measures the per-frame hot paths: graph execution over a prepared node
//! chain, queue sort/render, and dense component iteration.

use std::any::Any;
use std::hint::black_box;
use std::rc::Rc;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;

use vesper::ecs::{EntityDatabase, TableKind};
use vesper::graph::{NodeContext, NodeSpec, RenderGraph, RenderNode};
use vesper::graphics::{GraphicsState, Program, SharedBindable};
use vesper::render::{MeshRenderer, Pass, Renderable3D, SharedPass, SharedRenderable};

struct Transform {
    position: Vec3,
}

struct Spin {
    speed: f32,
}

struct CounterNode;

impl RenderNode for CounterNode {
    fn spec(&self) -> NodeSpec {
        NodeSpec::new().attach_input("attach").attach_output("attach")
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        black_box(ctx.name());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct PointRenderable;

impl Renderable3D for PointRenderable {
    fn bounds(&self) -> (Vec3, Vec3) {
        (Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    fn draw(&self, state: &mut GraphicsState) {
        black_box(state.stats());
    }
}

fn bench_graph_execute(c: &mut Criterion) {
    let mut graph = RenderGraph::new();
    let mut previous = None;
    for i in 0..32 {
        let name = format!("node-{i}");
        let key = graph.add_node(&name, CounterNode).unwrap();
        if let Some(prev) = previous {
            graph.connect(prev, "attach", key, "attach").unwrap();
        }
        previous = Some(key);
    }
    graph.prepare().unwrap();

    let mut state = GraphicsState::new();
    c.bench_function("graph_execute_32_nodes", |b| {
        b.iter(|| {
            state.begin_frame();
            graph.execute(&mut state);
        });
    });
}

fn bench_queue_render(c: &mut Criterion) {
    let mut graph = RenderGraph::new();
    let renderer = MeshRenderer::new();
    let queue = renderer.queue();
    graph.add_node("meshes", renderer).unwrap();
    graph.prepare().unwrap();

    let passes: Vec<SharedPass> = (0..8)
        .map(|i| {
            let program: SharedBindable = Arc::new(Program::new(&format!("pass-{i}")));
            Rc::new(Pass::new().with_bindable(program))
        })
        .collect();
    let renderables: Vec<SharedRenderable> =
        (0..1024).map(|_| Rc::new(PointRenderable) as SharedRenderable).collect();

    let mut state = GraphicsState::new();
    c.bench_function("queue_sort_render_1024", |b| {
        b.iter(|| {
            {
                let mut q = queue.borrow_mut();
                for (i, renderable) in renderables.iter().enumerate() {
                    q.submit(renderable.clone(), passes[i % passes.len()].clone());
                }
            }
            state.begin_frame();
            graph.execute(&mut state);
        });
    });
}

fn bench_ecs_iteration(c: &mut Criterion) {
    let mut db = EntityDatabase::new(4096);
    db.add_component_table::<Transform>(4096, TableKind::Dense);
    db.add_component_table::<Spin>(4096, TableKind::Dense);

    for i in 0..4096 {
        let e = db.add_entity();
        db.add_component(
            e,
            Transform {
                position: Vec3::splat(i as f32),
            },
        );
        if i % 2 == 0 {
            db.add_component(e, Spin { speed: 0.1 });
        }
    }

    c.bench_function("ecs_iterate_two_components_4096", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            db.iterate_components::<(Transform, Spin)>(|_, (t, s)| {
                sum += t.position.x * s.speed;
            });
            black_box(sum);
        });
    });
}

criterion_group!(
    benches,
    bench_graph_execute,
    bench_queue_render,
    bench_ecs_iteration
);
criterion_main!(benches);
