// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(missing_docs, reason = "Benchmark code")]
#![expect(clippy::unwrap_used, reason = "Benchmark code")]

//! Compares a lazy clock with a ticking clock under the same workload. The scenario:
//! * One consumer process waits for the sample point of 1000 consecutive cycles
//! * The simulation runs until the consumer finishes
//!
//! The lazy clock suspends the consumer once per cycle and schedules nothing else. The ticking
//! clock also runs its own process, which wakes at every edge and every sample and set-edge
//! point and notifies an event each time.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use lazy_clock::{ClockConfig, ClockSignal, LazyClock, TickingClock};
use sim_tick::Simulation;

const CYCLES: u32 = 1000;

fn criterion_benchmark(c: &mut Criterion) {
    waits(c);
    queries(c);
}

fn config() -> ClockConfig {
    ClockConfig::new(Duration::from_nanos(10))
        .duty_cycle(0.4)
        .sample(Duration::from_nanos(2))
}

fn waits(c: &mut Criterion) {
    let mut group = c.benchmark_group("wait_sample");

    group.bench_function("lazy", |b| {
        b.iter(|| {
            let mut sim = Simulation::new();
            let clock = Arc::new(LazyClock::new("clk", sim.kernel(), config()).unwrap());
            sim.spawn(consume(clock)).unwrap();
            black_box(sim.run());
        });
    });

    group.bench_function("ticking", |b| {
        b.iter(|| {
            let mut sim = Simulation::new();
            let clock = Arc::new(TickingClock::new("clk", sim.kernel(), config()).unwrap());
            sim.spawn(Arc::clone(&clock).drive()).unwrap();
            sim.spawn(consume(clock)).unwrap();
            black_box(sim.run_until(Duration::from_nanos(10 * u64::from(CYCLES) + 2)));
        });
    });

    group.finish();
}

fn queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("landmark_queries");
    let sim = Simulation::new();
    let clock = LazyClock::new("clk", sim.kernel(), config()).unwrap();

    group.bench_function("until_all", |b| {
        b.iter(|| {
            black_box(clock.until_posedge(0));
            black_box(clock.until_negedge(0));
            black_box(clock.until_anyedge(0));
            black_box(clock.until_sample(0));
            black_box(clock.until_setedge(0));
        });
    });

    group.bench_function("cycles", |b| {
        b.iter(|| black_box(clock.cycles()));
    });

    group.finish();
}

async fn consume<C: ClockSignal>(clock: Arc<C>) {
    for _ in 0..CYCLES {
        clock.wait_sample(1).await;
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
