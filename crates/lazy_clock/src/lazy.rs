// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Mutex;
use std::time::Duration;

use jiff::SignedDuration;
use sim_tick::{Event, Kernel};

use crate::arith::{self, clocks, time_diff};
use crate::landmark::LandmarkEvents;
use crate::timing::Timing;
use crate::{ClockConfig, ClockSignal, Edge, Error, Landmark, NegativeTimePolicy, ResetPolicy, Result};

/// A clock signal computed from simulated time instead of generated edge by edge.
///
/// A lazy clock schedules nothing on its own. Every query computes, from the kernel's current
/// time and the clock configuration, how far away the requested landmark is. A process waiting
/// for the next rising edge is therefore suspended exactly once, however many edges a ticking
/// clock would have produced in between.
///
/// The clock can be reconfigured while the simulation runs. Each reconfiguration folds the cycles
/// elapsed so far into a base count, so [`cycles`][ClockSignal::cycles] never jumps when the
/// period changes.
///
/// Share a lazy clock between models by wrapping it in an [`Arc`][std::sync::Arc], or register
/// it in a [`ClockRegistry`][crate::ClockRegistry].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lazy_clock::{ClockConfig, ClockSignal};
/// use sim_tick::Kernel;
///
/// let kernel = Kernel::new();
/// let clock = ClockConfig::new(Duration::from_nanos(10)).build("clk", &kernel)?;
///
/// assert!(clock.at_posedge_time());
/// assert_eq!(clock.until_negedge(0), Duration::from_nanos(5));
///
/// kernel.advance(Duration::from_nanos(8));
/// assert_eq!(clock.until_posedge(0), Duration::from_nanos(2));
/// assert!(!clock.read());
/// # Ok::<(), lazy_clock::Error>(())
/// ```
#[derive(Debug)]
pub struct LazyClock {
    name: String,
    kernel: Kernel,
    events: LandmarkEvents,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    config: ClockConfig,
    timing: Timing,
    // Shifted time of the last reconfiguration.
    anchor: SignedDuration,
    base_count: u64,
    change_count: u64,
}

impl State {
    fn cycles_at(&self, now: Duration, policy: NegativeTimePolicy) -> u64 {
        let elapsed = time_diff(arith::shifted(now, self.timing.shift), self.anchor, policy);
        self.base_count.saturating_add(clocks(elapsed, self.timing.period))
    }
}

impl LazyClock {
    /// Creates a clock named `name` reading time from `kernel`.
    ///
    /// Cycle counting starts at the zero-time reference.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(name: impl Into<String>, kernel: &Kernel, config: ClockConfig) -> Result<Self> {
        let timing = Timing::resolve(&config)?;

        Ok(Self {
            name: name.into(),
            kernel: kernel.clone(),
            events: LandmarkEvents::new(kernel),
            state: Mutex::new(State {
                config,
                timing,
                anchor: SignedDuration::ZERO,
                base_count: 0,
                change_count: 0,
            }),
        })
    }

    /// Returns the current configuration, including every change applied since creation.
    #[must_use]
    pub fn config(&self) -> ClockConfig {
        self.with_state(|s| s.config.clone())
    }

    /// Returns the time from the zero-time reference to the first edge.
    #[must_use]
    pub fn offset(&self) -> Duration {
        self.with_state(|s| s.timing.offset)
    }

    /// Returns the polarity of the first edge.
    #[must_use]
    pub fn first_edge(&self) -> Edge {
        self.with_state(|s| s.timing.first_edge)
    }

    /// Returns the offset of the rising edge within a cycle.
    #[must_use]
    pub fn posedge_offset(&self) -> Duration {
        self.with_state(|s| s.timing.posedge)
    }

    /// Returns the offset of the falling edge within a cycle.
    #[must_use]
    pub fn negedge_offset(&self) -> Duration {
        self.with_state(|s| s.timing.negedge)
    }

    /// Returns the sample point within a cycle.
    #[must_use]
    pub fn sample_time(&self) -> Duration {
        self.with_state(|s| s.timing.sample)
    }

    /// Returns the set-edge point within a cycle.
    #[must_use]
    pub fn setedge_time(&self) -> Duration {
        self.with_state(|s| s.timing.set_edge)
    }

    /// Returns the cycle count the clock has, or had, at simulated time `time`.
    ///
    /// Times before the last reconfiguration are resolved through the clock's
    /// [`NegativeTimePolicy`], which logs a warning.
    #[must_use]
    pub fn cycles_at(&self, time: Duration) -> u64 {
        self.with_state(|s| s.cycles_at(time, s.config.negative_time_policy))
    }

    fn reconfigure<F>(&self, change: &'static str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ClockConfig),
    {
        let now = self.kernel.now();

        self.with_state(|s| {
            let mut config = s.config.clone();
            apply(&mut config);
            let timing = Timing::resolve(&config)?;

            s.base_count = s.cycles_at(now, s.config.negative_time_policy);
            s.change_count = s.change_count.saturating_add(1);
            s.anchor = arith::shifted(now, timing.shift);
            s.config = config;
            s.timing = timing;

            tracing::event!(
                name: "lazy_clock.reconfigured",
                tracing::Level::DEBUG,
                clock.name = %self.name,
                clock.change = change,
                clock.period = ?timing.period,
                clock.cycles = s.base_count,
                sim.now = ?now,
            );

            Ok(())
        })
    }

    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut State) -> R,
    {
        f(&mut self.state.lock().expect("acquiring lock must always succeed"))
    }
}

impl ClockSignal for LazyClock {
    fn name(&self) -> &str {
        &self.name
    }

    fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn period(&self) -> Duration {
        self.with_state(|s| s.timing.period)
    }

    fn duty(&self) -> f64 {
        self.with_state(|s| s.timing.duty)
    }

    fn time_shift(&self) -> SignedDuration {
        self.with_state(|s| s.timing.shift)
    }

    fn cycles(&self) -> u64 {
        self.cycles_at(self.kernel.now())
    }

    fn frequency_changes(&self) -> u64 {
        self.with_state(|s| s.change_count)
    }

    fn set_period(&self, period: Duration) -> Result<()> {
        self.reconfigure("period", |c| c.period = period)
    }

    fn set_offset(&self, offset: Duration) -> Result<()> {
        self.reconfigure("offset", |c| c.offset = offset)
    }

    fn set_duty_cycle(&self, duty: f64) -> Result<()> {
        self.reconfigure("duty_cycle", |c| c.duty = duty)
    }

    fn set_sample_time(&self, sample: Duration) -> Result<()> {
        self.reconfigure("sample_time", |c| c.sample = Some(sample))
    }

    fn set_setedge_time(&self, set_edge: Duration) -> Result<()> {
        self.reconfigure("setedge_time", |c| c.set_edge = Some(set_edge))
    }

    fn set_time_shift(&self, shift: SignedDuration) -> Result<()> {
        self.reconfigure("time_shift", |c| c.time_shift = shift)
    }

    fn reset(&self) -> Result<()> {
        let now = self.kernel.now();

        self.with_state(|s| match s.config.reset_policy {
            ResetPolicy::Reject => Err(Error::usage(format!(
                "clock '{}' does not support reset; configure ResetPolicy::ClearHistory to allow it",
                self.name
            ))),
            ResetPolicy::ClearHistory => {
                s.base_count = 0;
                s.change_count = 0;
                s.anchor = arith::shifted(now, s.timing.shift);
                Ok(())
            }
        })
    }

    fn until(&self, landmark: Landmark, cycles: u32) -> Duration {
        let now = self.kernel.now();
        self.with_state(|s| s.timing.until(now, landmark, cycles))
    }

    fn next(&self, landmark: Landmark, cycles: u32) -> Duration {
        let now = self.kernel.now();
        self.with_state(|s| s.timing.next(now, landmark, cycles))
    }

    fn read(&self) -> bool {
        let now = self.kernel.now();
        self.with_state(|s| s.timing.read(now))
    }

    fn landmark_event(&self, landmark: Landmark) -> &Event {
        self.events.get(landmark)
    }
}
