// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(clippy::unwrap_used, reason = "test code")]

//! Lazy clocks driving processes inside a simulation.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use lazy_clock::{ClockConfig, ClockSignal, Landmark, LazyClock};
use sim_tick::Simulation;

fn ns(value: u64) -> Duration {
    Duration::from_nanos(value)
}

#[test]
fn waiters_on_same_landmark_resume_together() {
    let mut sim = Simulation::new();
    let clock = Arc::new(LazyClock::new("clk", sim.kernel(), ClockConfig::new(ns(10)).offset(ns(3))).unwrap());
    let resumed = Rc::new(RefCell::new(Vec::new()));

    for id in 0..3 {
        let clock = Arc::clone(&clock);
        let resumed = Rc::clone(&resumed);
        sim.spawn(async move {
            clock.wait_posedge(1).await;
            resumed.borrow_mut().push((id, clock.kernel().now()));
        })
        .unwrap();
    }

    assert_eq!(sim.run(), ns(13));

    let mut resumed = resumed.take();
    resumed.sort();
    assert_eq!(resumed, vec![(0, ns(13)), (1, ns(13)), (2, ns(13))]);
}

#[test]
fn posedge_event_releases_event_waiters() {
    let mut sim = Simulation::new();
    let clock = Arc::new(LazyClock::new("clk", sim.kernel(), ClockConfig::new(ns(10)).offset(ns(3))).unwrap());
    let woken_at = Rc::new(RefCell::new(None));

    {
        let event = clock.landmark_event(Landmark::Posedge).clone();
        let kernel = sim.kernel().clone();
        let woken_at = Rc::clone(&woken_at);
        sim.spawn(async move {
            event.wait().await;
            *woken_at.borrow_mut() = Some(kernel.now());
        })
        .unwrap();
    }

    {
        let clock = Arc::clone(&clock);
        sim.spawn(async move {
            let event = clock.posedge_event(1).await;
            assert!(event.same_as(clock.landmark_event(Landmark::Posedge)));
        })
        .unwrap();
    }

    sim.run();

    assert_eq!(*woken_at.borrow(), Some(ns(13)));
    assert_eq!(clock.landmark_event(Landmark::Posedge).trigger_count(), 1);
}

#[test]
fn wait_on_current_landmark_does_not_suspend() {
    let sim = Simulation::new();
    let clock = LazyClock::new("clk", sim.kernel(), ClockConfig::new(ns(10))).unwrap();

    assert_eq!(clock.wait_posedge(0).now_or_never(), Some(()));
    assert_eq!(sim.kernel().pending_timers(), 0);

    // A pending wait registers exactly one timer.
    let mut pending = Box::pin(clock.wait_negedge(0));
    assert!((&mut pending).now_or_never().is_none());
    assert_eq!(sim.kernel().pending_timers(), 1);
}

#[test]
fn frequency_change_mid_run_keeps_counting() {
    let mut sim = Simulation::new();
    let clock = Arc::new(LazyClock::new("clk", sim.kernel(), ClockConfig::new(ns(10))).unwrap());
    let seen = Rc::new(RefCell::new(Vec::new()));

    {
        let clock = Arc::clone(&clock);
        let seen = Rc::clone(&seen);
        sim.spawn(async move {
            for _ in 0..3 {
                clock.wait_posedge(1).await;
                seen.borrow_mut().push((clock.kernel().now(), clock.cycles()));
            }

            clock.set_period(ns(4)).unwrap();

            for _ in 0..2 {
                clock.wait_posedge(1).await;
                seen.borrow_mut().push((clock.kernel().now(), clock.cycles()));
            }
        })
        .unwrap();
    }

    assert_eq!(sim.run(), ns(40));

    // Edges of the new period stay aligned to time zero. Counting restarts at the change.
    assert_eq!(
        *seen.borrow(),
        vec![(ns(10), 1), (ns(20), 2), (ns(30), 3), (ns(36), 4), (ns(40), 5)]
    );
    assert_eq!(clock.frequency_changes(), 1);
}

#[test]
fn sample_points_observe_signal_level() {
    let mut sim = Simulation::new();
    let config = ClockConfig::new(ns(10)).duty_cycle(0.4).sample(ns(2));
    let clock = Arc::new(LazyClock::new("clk", sim.kernel(), config).unwrap());
    let levels = Rc::new(RefCell::new(Vec::new()));

    {
        let clock = Arc::clone(&clock);
        let levels = Rc::clone(&levels);
        sim.spawn(async move {
            for _ in 0..3 {
                clock.wait_sample(1).await;
                levels.borrow_mut().push(clock.read());
                clock.wait_setedge(0).await;
                levels.borrow_mut().push(clock.read());
            }
        })
        .unwrap();
    }

    sim.run();

    // Samples land inside the high phase; set-edge points default to the falling edge, which
    // still reads high.
    assert_eq!(*levels.borrow(), vec![true; 6]);
}
