// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(clippy::unwrap_used, reason = "test code")]

//! A model written against `ClockSignal` observes the same landmark times on either clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use jiff::SignedDuration;
use lazy_clock::{ClockConfig, ClockSignal, Landmark, LazyClock, TickingClock};
use sim_tick::Simulation;

type Trace = Rc<RefCell<Vec<(&'static str, Duration)>>>;

fn config() -> ClockConfig {
    ClockConfig::new(Duration::from_nanos(10))
        .duty_cycle(0.3)
        .offset(Duration::from_nanos(2))
        .sample(Duration::from_nanos(4))
        .set_edge(Duration::from_nanos(8))
}

async fn observe<C: ClockSignal>(clock: Arc<C>, trace: Trace) {
    let mark = |what: &'static str| trace.borrow_mut().push((what, clock.kernel().now()));

    clock.wait_posedge(0).await;
    mark("posedge");
    clock.wait_negedge(0).await;
    mark("negedge");
    clock.wait_sample(1).await;
    mark("sample");
    clock.wait_setedge(0).await;
    mark("setedge");
    clock.wait_anyedge(0).await;
    mark("anyedge");
    clock.wait_posedge(2).await;
    mark("posedge");
}

fn expected() -> Vec<(&'static str, Duration)> {
    [
        ("posedge", 2),
        ("negedge", 5),
        ("sample", 24),
        ("setedge", 28),
        ("anyedge", 32),
        ("posedge", 52),
    ]
    .into_iter()
    .map(|(what, at)| (what, Duration::from_nanos(at)))
    .collect()
}

#[test]
fn lazy_clock_landmarks() {
    let mut sim = Simulation::new();
    let clock = Arc::new(LazyClock::new("clk", sim.kernel(), config()).unwrap());
    let trace = Trace::default();

    sim.spawn(observe(clock, Rc::clone(&trace))).unwrap();

    assert_eq!(sim.run(), Duration::from_nanos(52));
    assert_eq!(*trace.borrow(), expected());
}

#[test]
fn ticking_clock_landmarks() {
    let mut sim = Simulation::new();
    let clock = Arc::new(TickingClock::new("clk", sim.kernel(), config()).unwrap());
    let trace = Trace::default();

    sim.spawn(Arc::clone(&clock).drive()).unwrap();
    sim.spawn(observe(clock, Rc::clone(&trace))).unwrap();

    sim.run_until(Duration::from_nanos(60));
    assert_eq!(*trace.borrow(), expected());
}

#[test]
fn only_ticking_clock_triggers_landmark_events() {
    let mut lazy_sim = Simulation::new();
    let lazy = Arc::new(LazyClock::new("clk", lazy_sim.kernel(), config()).unwrap());
    lazy_sim.spawn(observe(Arc::clone(&lazy), Trace::default())).unwrap();
    lazy_sim.run();

    let mut ticking_sim = Simulation::new();
    let ticking = Arc::new(TickingClock::new("clk", ticking_sim.kernel(), config()).unwrap());
    ticking_sim.spawn(Arc::clone(&ticking).drive()).unwrap();
    ticking_sim.spawn(observe(Arc::clone(&ticking), Trace::default())).unwrap();
    ticking_sim.run_until(Duration::from_nanos(60));

    let triggers = |clock: &dyn Fn(Landmark) -> u64| Landmark::ALL.iter().map(|&l| clock(l)).sum::<u64>();

    assert_eq!(triggers(&|l| lazy.landmark_event(l).trigger_count()), 0);

    // Each of the 6 periods produced 2 edges, 1 sample point, 1 set-edge point and 2 any-edge
    // notifications.
    assert_eq!(triggers(&|l| ticking.landmark_event(l).trigger_count()), 36);
}

#[test]
fn both_clocks_count_the_same_cycles() {
    let configs = [config(), config().time_shift(SignedDuration::from_nanos(4))];

    for config in configs {
        let mut lazy_sim = Simulation::new();
        let lazy = LazyClock::new("clk", lazy_sim.kernel(), config.clone()).unwrap();

        let mut ticking_sim = Simulation::new();
        let ticking = Arc::new(TickingClock::new("clk", ticking_sim.kernel(), config).unwrap());
        ticking_sim.spawn(Arc::clone(&ticking).drive()).unwrap();

        for at in [9, 10, 35] {
            lazy_sim.run_until(Duration::from_nanos(at));
            ticking_sim.run_until(Duration::from_nanos(at));
            assert_eq!(ticking.cycles(), lazy.cycles(), "at {at}ns");
        }

        lazy.set_period(Duration::from_nanos(9)).unwrap();
        ticking.set_period(Duration::from_nanos(9)).unwrap();

        lazy_sim.run_until(Duration::from_nanos(60));
        ticking_sim.run_until(Duration::from_nanos(60));
        assert_eq!(ticking.cycles(), lazy.cycles());
        assert_eq!(lazy.cycles(), 5);
    }
}
