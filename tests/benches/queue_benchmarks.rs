//! # Block Queue Benchmarks
//!
//! | Scenario | What it measures |
//! |----------|------------------|
//! | import_drain_in_order | phase 1 + phase 2 throughput, no reordering |
//! | import_drain_reversed | worst-case arrival: every block waits for its parent |
//! | phase1_only | `verify_block_basic` alone |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_block_queue::verification::{verify_block_basic, BasicLimits};
use qc_18_block_queue::QueueConfig;
use qc_tests::fixtures::*;

const CHAIN_LEN: usize = 256;

fn bench_import_drain(c: &mut Criterion) {
    let engine = easy_ethash();
    let genesis = work_genesis();
    let blocks = sealed_chain(&*engine, &genesis, CHAIN_LEN, 0);
    let mut reversed = blocks.clone();
    reversed.reverse();

    let mut group = c.benchmark_group("qc-18-block-queue");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(CHAIN_LEN as u64));

    for workers in [1usize, 2, 4, 8] {
        for (name, order) in [("import_drain_in_order", &blocks), ("import_drain_reversed", &reversed)] {
            group.bench_with_input(BenchmarkId::new(name, workers), &workers, |b, &workers| {
                b.iter(|| {
                    let config = QueueConfig {
                        worker_threads: workers,
                        ..Default::default()
                    };
                    let (queue, _events, _chain) =
                        new_queue(config, engine.clone(), genesis.clone());
                    for block in order.iter() {
                        queue.import(block.clone()).unwrap();
                    }
                    black_box(drain_n(&queue, CHAIN_LEN))
                })
            });
        }
    }

    group.finish();
}

fn bench_phase1(c: &mut Criterion) {
    let engine = easy_ethash();
    let genesis = work_genesis();
    let block = sealed_block(&*engine, &genesis, 0, (0..64).map(transfer).collect(), vec![]);
    let limits = BasicLimits::from(&QueueConfig::default());
    let now = GENESIS_TIMESTAMP + 1_000;

    c.bench_function("phase1_only/64_transactions", |b| {
        b.iter(|| verify_block_basic(black_box(&block), &*engine, &limits, now).unwrap())
    });
}

criterion_group!(benches, bench_import_drain, bench_phase1);
criterion_main!(benches);
