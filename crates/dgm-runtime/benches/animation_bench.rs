//! Benchmarks for animation derivation and playback.
//!
//! Run with: cargo bench -p dgm-runtime --bench animation_bench

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dgm_model::{ElementSchema, ModelFactory, ModelMatcher};
use dgm_runtime::{
    AnimationPlayer, CancellationToken, CommandStack, Transition, UpdateModelAction,
    UpdateModelCommand, compute_animation,
};
use std::hint::black_box;
use web_time::Duration;

/// `nodes` nodes, every third one absent when `shift` is odd so updates
/// carry fades as well as moves.
fn graph(nodes: usize, shift: usize) -> ElementSchema {
    ElementSchema::new("graph", "graph").with_children(
        (0..nodes)
            .filter(|i| shift % 2 == 0 || i % 3 != 0)
            .map(|i| {
                ElementSchema::new(format!("n{i}"), "node")
                    .with_position((i * 10 + shift) as f64, 0.0)
                    .with_child(ElementSchema::new(format!("n{i}-label"), "label"))
            }),
    )
}

fn bench_compute(c: &mut Criterion) {
    let factory = ModelFactory::new();
    let mut group = c.benchmark_group("compute_animation");
    for &size in &[10usize, 100, 1000] {
        let old = factory.create_root(&graph(size, 0));
        let new = factory.create_root(&graph(size, 1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let matches = ModelMatcher::new().match_models(&old, &new).unwrap();
                black_box(compute_animation(
                    black_box(&new),
                    &matches,
                    Duration::from_millis(250),
                ))
            })
        });
    }
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let factory = ModelFactory::new();
    let mut group = c.benchmark_group("player_frame");
    for &size in &[100usize, 1000] {
        let old = factory.create_root(&graph(size, 0));
        let new = Arc::new(factory.create_root(&graph(size, 1)));
        let matches = ModelMatcher::new().match_models(&old, &new).unwrap();
        let animation = compute_animation(&new, &matches, Duration::from_secs(3600)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut player = AnimationPlayer::new(
                Transition::new(animation.clone(), Arc::clone(&new)),
                CancellationToken::never(),
            );
            let mut ts = 0.0;
            b.iter(|| {
                ts += 16.0;
                black_box(player.on_frame(black_box(ts)))
            })
        });
    }
    group.finish();
}

fn bench_update_command(c: &mut Criterion) {
    c.bench_function("stack_execute_update/100", |b| {
        let mut stack = CommandStack::new();
        let mut shift = 0;
        b.iter(|| {
            shift += 1;
            let cmd = UpdateModelCommand::new(UpdateModelAction::with_root(graph(100, shift)));
            stack.execute(Box::new(cmd)).unwrap();
            black_box(stack.undo_depth())
        })
    });
}

criterion_group!(benches, bench_compute, bench_frames, bench_update_command);
criterion_main!(benches);
