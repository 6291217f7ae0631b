// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(
    test,
    allow(
        clippy::arithmetic_side_effects,
        clippy::float_cmp,
        clippy::unwrap_used,
        reason = "allow these lints in tests to improve the readability of the tests"
    )
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Clock signals for discrete-event simulation that compute their edges instead of ticking.
//!
//! A conventional simulated clock wakes the scheduler at every edge, forever, whether or not
//! anything downstream cares. A [`LazyClock`] instead treats the clock as a function of
//! simulated time: given the current time, it computes how far away the next rising edge,
//! falling edge, sample point or set-edge point is, and lets a process wait exactly that long,
//! or not at all when it already sits on the landmark.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use lazy_clock::{ClockConfig, ClockRegistry, ClockSignal};
//! use sim_tick::Simulation;
//!
//! let mut sim = Simulation::new();
//! let registry = ClockRegistry::new(sim.kernel());
//! let clock = registry.global(
//!     "cpu",
//!     ClockConfig::new(Duration::from_nanos(10)).sample(Duration::from_nanos(1)),
//! )?;
//!
//! sim.spawn(async move {
//!     for _ in 0..100 {
//!         // One suspension per cycle, however fine the simulation time resolution is.
//!         clock.wait_sample(1).await;
//!     }
//!     assert_eq!(clock.cycles(), 100);
//! })
//! .unwrap();
//!
//! assert_eq!(sim.run(), Duration::from_nanos(1001));
//! # Ok::<(), lazy_clock::Error>(())
//! ```
//!
//! # Overview
//!
//! - [`ClockSignal`] - The capabilities of a clock: landmark queries, waits, events,
//!   reconfiguration and cycle counting.
//! - [`LazyClock`] - Computes every landmark on demand from simulated time.
//! - [`TickingClock`] - Generates every edge with its own process. Useful as a reference and
//!   for measuring what the lazy clock saves.
//! - [`ClockConfig`] - Period, duty cycle, offset, first edge polarity, sample and set-edge
//!   points, temporal shift and policies.
//! - [`ClockRegistry`] - Named clocks shared between independently constructed models.
//! - [`arith`] - The landmark arithmetic, exposed for other clock implementations.
//!
//! # Reconfiguration
//!
//! Clocks can be reconfigured while the simulation runs. Every change folds the cycles elapsed
//! so far into a base count and restarts counting at the time of the change, so the cycle count
//! stays continuous across frequency changes.
//!
//! # Features
//!
//! - **`serde`** - Adds serialization and deserialization support for [`ClockConfig`] and the
//!   policy enums via [serde](https://serde.rs/).

pub mod arith;
mod config;
mod error;
mod landmark;
mod lazy;
mod registry;
mod signal;
mod ticking;
mod timing;

pub use config::{ClockConfig, Edge, NegativeTimePolicy, ResetPolicy};
pub use error::{Error, Result};
pub use landmark::Landmark;
pub use lazy::LazyClock;
pub use registry::ClockRegistry;
pub use signal::ClockSignal;
pub use ticking::TickingClock;
