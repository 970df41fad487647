use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stocktake_inventory::{CostLayer, MovementRequest, compute_movement, merge_layers};

fn layers(count: usize) -> Vec<CostLayer> {
    (0..count)
        .map(|i| CostLayer::new(10.0, 1.0 + (i % 7) as f64, None))
        .collect()
}

/// FIFO consumption across deep layer stacks (worst case: sell everything).
fn bench_compute_movement(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_movement");
    for depth in [1usize, 16, 256] {
        let stack = layers(depth);
        let sold = 10.0 * depth as f64;
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &stack, |b, stack| {
            b.iter(|| {
                compute_movement(black_box(&MovementRequest {
                    layers: stack,
                    sold,
                    received: 5.0,
                    unit_cost: 2.0,
                    timestamp: None,
                }))
            })
        });
    }
    group.finish();
}

fn bench_merge_layers(c: &mut Criterion) {
    let stack: Vec<CostLayer> = (0..512)
        .map(|i| CostLayer::new(1.0, (i / 8) as f64, None))
        .collect();
    c.bench_function("merge_layers/512", |b| {
        b.iter(|| merge_layers(black_box(stack.clone())))
    });
}

criterion_group!(benches, bench_compute_movement, bench_merge_layers);
criterion_main!(benches);
