// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(
    test,
    allow(
        clippy::arithmetic_side_effects,
        clippy::unwrap_used,
        reason = "allow these lints in tests to improve the readability of the tests"
    )
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A deterministic time kernel for discrete-event simulation.
//!
//! Simulated time in this crate is a [`Duration`][std::time::Duration] measured from a
//! zero-time reference. It never follows the wall clock: it only moves when the simulation
//! is advanced, and it always moves straight to the next point where something happens.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use sim_tick::Simulation;
//!
//! let mut sim = Simulation::new();
//! let kernel = sim.kernel().clone();
//! let ready = kernel.event();
//!
//! let signal = ready.clone();
//! let producer = kernel.clone();
//! sim.spawn(async move {
//!     producer.delay(Duration::from_nanos(40)).await;
//!     signal.notify(Duration::from_nanos(2));
//! })
//! .unwrap();
//!
//! let consumer = kernel.clone();
//! sim.spawn(async move {
//!     ready.wait().await;
//!     assert_eq!(consumer.now(), Duration::from_nanos(42));
//! })
//! .unwrap();
//!
//! assert_eq!(sim.run(), Duration::from_nanos(42));
//! ```
//!
//! # Overview
//!
//! - [`Kernel`] - The shared simulated timeline. Reports the current time, creates delays and
//!   events, and can be advanced by hand.
//! - [`Delay`] - Suspends a process for a duration of simulated time.
//! - [`Event`] - A notification point processes can wait on. Notifications may be immediate
//!   (next delta step) or delayed.
//! - [`Simulation`] - Runs processes cooperatively and advances the kernel from timer to timer.
//!
//! # Delta steps
//!
//! A notification with zero delay does not move simulated time, yet it does not wake waiters
//! synchronously either. The waiters resume in the next delta step, after every process that was
//! runnable at the time of the notification has suspended. Two processes therefore agree on the
//! ordering of a zero-delay notification no matter which of them the executor polls first.

mod delay;
mod event;
mod kernel;
mod simulation;
mod timers;

pub use delay::Delay;
pub use event::{Event, EventWait};
pub use kernel::Kernel;
pub use simulation::Simulation;
