use std::collections::HashSet;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pomo_core::{ConceptGraph, Entity, EntityCategory, EntityPool, RelationKind};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn make_pool(concepts: usize) -> EntityPool {
    let entities: Vec<Entity> = (0..concepts)
        .map(|i| Entity::new(&format!("concept {i}"), EntityCategory::Concept))
        .collect();
    EntityPool::new(entities).unwrap()
}

fn make_graph(concepts: usize) -> ConceptGraph {
    let mut graph = ConceptGraph::new();
    for i in 0..concepts.saturating_sub(1) {
        graph.add_symmetric(
            pomo_core::EntityId::from_display(&format!("concept {i}")),
            pomo_core::EntityId::from_display(&format!("concept {}", i + 1)),
            RelationKind::Complements,
            0.5,
        );
    }
    graph.finalize();
    graph
}

fn bench_draw(c: &mut Criterion) {
    let pool = make_pool(500);
    let excluded = HashSet::new();

    c.bench_function("weighted_draw_500", |b| {
        let mut rng = SmallRng::seed_from_u64(42);
        b.iter(|| {
            let entity = pool
                .draw(EntityCategory::Concept, None, &excluded, &mut rng)
                .unwrap();
            black_box(&entity.id);
        })
    });
}

fn bench_record_usage(c: &mut Criterion) {
    let graph = make_graph(500);

    c.bench_function("record_usage_500", |b| {
        let mut pool = make_pool(500);
        let target = pomo_core::EntityId::from_display("concept 250");
        let mut position = 0u64;
        b.iter(|| {
            position += 1;
            pool.record_usage(black_box(&target), &graph, None, position);
        })
    });
}

criterion_group!(benches, bench_draw, bench_record_usage);
criterion_main!(benches);
