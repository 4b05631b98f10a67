//! # Dispatch Benchmark
//!
//! Measures the per-tick cost of the update pass and the refresh sweep.
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{CapabilityRegistry, Component, Entity, EntityManager};

struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {
    fn update(&mut self, owner: &mut Entity) {
        if let Some(pos) = owner.get_component_mut::<Position>() {
            pos.x += self.dx;
            pos.y += self.dy;
        }
    }
}

fn populated(count: usize) -> EntityManager {
    let mut manager = EntityManager::with_registry(Arc::new(CapabilityRegistry::new()));
    for i in 0..count {
        let entity = manager.add_entity();
        entity.add_component(Position { x: 0.0, y: 0.0 }).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let dx = i as f32 * 0.1;
        entity.add_component(Velocity { dx, dy: 1.0 }).unwrap();
    }
    manager
}

/// Benchmark: update pass over entities with a sibling lookup each.
fn bench_update_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_pass");

    for count in [1_000, 10_000, 100_000] {
        let mut manager = populated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                manager.update();
                black_box(manager.len())
            });
        });
    }

    group.finish();
}

/// Benchmark: sweep half of the entities.
fn bench_refresh_half(c: &mut Criterion) {
    c.bench_function("refresh_half_10k", |b| {
        b.iter_batched(
            || {
                let mut manager = populated(10_000);
                for (i, entity) in manager.iter_mut().enumerate() {
                    if i % 2 == 0 {
                        entity.destroy();
                    }
                }
                manager
            },
            |mut manager| black_box(manager.refresh()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_update_pass, bench_refresh_half);
criterion_main!(benches);
