// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(clippy::unwrap_used, reason = "example code")]

//! This example shows two independently built models sharing one clock through a registry.
//!
//! A producer drives a value at every set-edge point and a consumer reads it at every sample
//! point. Neither model knows about the other; both only know the clock's name. Halfway through,
//! the producer halves the clock frequency and the cycle count carries on without a jump.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lazy_clock::{ClockConfig, ClockRegistry, ClockSignal};
use sim_tick::Simulation;

fn main() {
    let mut sim = Simulation::new();
    let registry = ClockRegistry::new(sim.kernel());
    let bus = Arc::new(Mutex::new(0_u64));

    registry
        .global(
            "bus",
            ClockConfig::new(Duration::from_nanos(20))
                .sample(Duration::from_nanos(2))
                .set_edge(Duration::from_nanos(12)),
        )
        .unwrap();

    let producer = {
        let clock = registry.lookup("bus").unwrap();
        let bus = Arc::clone(&bus);
        async move {
            clock.wait_setedge(0).await;

            for value in 1..=8_u64 {
                *bus.lock().unwrap() = value;

                if value == 4 {
                    clock.set_frequency(2.5e7).unwrap();
                    println!("{:?}: clock is now {} Hz", clock.kernel().now(), clock.frequency());
                }

                clock.wait_setedge(1).await;
            }
        }
    };

    let consumer = {
        let clock = registry.lookup("bus").unwrap();
        async move {
            for _ in 0..8 {
                clock.wait_sample(1).await;
                let value = *bus.lock().unwrap();
                println!("{:?}: cycle {} read {value}", clock.kernel().now(), clock.cycles());
            }
        }
    };

    sim.spawn(producer).unwrap();
    sim.spawn(consumer).unwrap();

    let end = sim.run();
    let clock = registry.lookup("bus").unwrap();
    println!("simulation ended at {end:?} after {} cycles", clock.cycles());
    println!("frequency changes: {}", clock.frequency_changes());
}
