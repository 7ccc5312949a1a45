//! Criterion benchmarks for the sample ring buffer hot paths.
//!
//! The push path runs in the timer context and must stay bounded-time; the
//! drain path is the consumer's two-phase batch copy. Both are exercised
//! uncontended here to establish baselines.
//!
//! Run with: cargo bench --bench ring

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pulse_daq::{RingBuffer, Sample};

fn sample(i: u64) -> Sample {
    Sample {
        tick_index: i,
        elapsed_ms: i * 1000,
        event_count: i % 17,
    }
}

/// Push/drain one record per iteration through a mostly-empty ring.
fn ring_push_pop(c: &mut Criterion) {
    let ring = RingBuffer::with_capacity(256);
    let mut i = 0u64;

    c.bench_function("ring_push_pop", |b| {
        b.iter(|| {
            ring.push(black_box(sample(i))).unwrap();
            i += 1;
            let batch = ring.begin_read();
            let out = batch.peek(0);
            batch.commit(1);
            black_box(out);
        });
    });
}

/// Fill the ring, then drain the whole backlog in one two-phase session.
fn ring_batch_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_batch_drain");

    for capacity in [64usize, 256, 1024] {
        group.throughput(Throughput::Elements(capacity as u64 - 1));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let ring = RingBuffer::with_capacity(capacity);
                b.iter(|| {
                    for i in 0..capacity as u64 - 1 {
                        ring.push(sample(i)).unwrap();
                    }
                    let batch = ring.begin_read();
                    let n = batch.len();
                    let mut acc = 0u64;
                    for i in 0..n {
                        acc += batch.peek(i).event_count;
                    }
                    batch.commit(n);
                    black_box(acc);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, ring_push_pop, ring_batch_drain);
criterion_main!(benches);
