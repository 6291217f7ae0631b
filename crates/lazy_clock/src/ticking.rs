// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::select;
use jiff::SignedDuration;
use sim_tick::{Event, Kernel};

use crate::arith::{self, clocks, time_diff};
use crate::landmark::LandmarkEvents;
use crate::timing::Timing;
use crate::{ClockConfig, ClockSignal, Error, Landmark, ResetPolicy, Result};

const TIMED: [Landmark; 4] = [Landmark::Posedge, Landmark::Negedge, Landmark::Sample, Landmark::Setedge];

/// A clock signal generated edge by edge by its own process.
///
/// A ticking clock stores its logic value and relies on [`drive`][Self::drive] running as a
/// process of the simulation. The process wakes the kernel at every edge, every sample and
/// set-edge point, and every cycle boundary. It updates the value and the cycle count, and
/// notifies the matching landmark events. Waiting on a ticking clock means waiting on those events, one wake-up per landmark
/// occurrence.
///
/// It answers the same [`ClockSignal`] queries as a [`LazyClock`][crate::LazyClock] with the
/// same configuration, which makes it a drop-in reference for comparing both approaches. The
/// stored value and cycle count change when the process handles a landmark, so
/// [`read`][ClockSignal::read] and [`cycles`][ClockSignal::cycles] at that instant depend on
/// whether the process already ran.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use lazy_clock::{ClockConfig, ClockSignal, TickingClock};
/// use sim_tick::Simulation;
///
/// let mut sim = Simulation::new();
/// let clock = Arc::new(TickingClock::new(
///     "clk",
///     sim.kernel(),
///     ClockConfig::new(Duration::from_nanos(10)),
/// )?);
///
/// sim.spawn(Arc::clone(&clock).drive()).unwrap();
/// sim.run_until(Duration::from_nanos(35));
///
/// // Three full periods have elapsed.
/// assert_eq!(clock.cycles(), 3);
/// # Ok::<(), lazy_clock::Error>(())
/// ```
#[derive(Debug)]
pub struct TickingClock {
    name: String,
    kernel: Kernel,
    events: LandmarkEvents,
    reconfigured: Event,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    config: ClockConfig,
    timing: Timing,
    value: bool,
    // Shifted time of the last reconfiguration.
    anchor: SignedDuration,
    base_count: u64,
    cycles: u64,
    change_count: u64,
    last_tick: Option<Duration>,
    // Landmarks already notified at `last_tick`.
    handled: Vec<Landmark>,
}

impl State {
    fn cycles_at(&self, now: Duration) -> u64 {
        let elapsed = time_diff(arith::shifted(now, self.timing.shift), self.anchor, self.config.negative_time_policy);
        self.base_count.saturating_add(clocks(elapsed, self.timing.period))
    }

    // Cycle boundaries share the phase of the anchor.
    fn until_boundary(&self, now: Duration) -> Duration {
        let period = arith::nanos(self.timing.period);
        let phase = arith::from_nanos(self.anchor.as_nanos().rem_euclid(period));

        match arith::delay(now, self.timing.period, phase, self.timing.shift) {
            Duration::ZERO => self.timing.period,
            left => left,
        }
    }

    fn reanchor(&mut self, now: Duration) {
        self.anchor = arith::shifted(now, self.timing.shift);
        self.cycles = self.base_count;
    }
}

impl TickingClock {
    /// Creates a clock named `name` on `kernel`. The clock does not tick until
    /// [`drive`][Self::drive] runs.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(name: impl Into<String>, kernel: &Kernel, config: ClockConfig) -> Result<Self> {
        let timing = Timing::resolve(&config)?;
        let value = timing.read(kernel.now());

        Ok(Self {
            name: name.into(),
            kernel: kernel.clone(),
            events: LandmarkEvents::new(kernel),
            reconfigured: kernel.event(),
            state: Mutex::new(State {
                config,
                timing,
                value,
                anchor: SignedDuration::ZERO,
                base_count: 0,
                cycles: 0,
                change_count: 0,
                last_tick: None,
                handled: Vec::new(),
            }),
        })
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> ClockConfig {
        self.with_state(|s| s.config.clone())
    }

    /// The clock's own process. Never completes.
    ///
    /// Spawn it once per clock. Reconfiguring the clock wakes the process so that it reschedules
    /// against the new configuration.
    #[cfg_attr(test, mutants::skip)] // a zero wake-up delay spins forever at one instant
    pub async fn drive(self: Arc<Self>) {
        loop {
            self.tick();

            let now = self.kernel.now();
            let wake_in = self.with_state(|s| {
                TIMED
                    .iter()
                    .map(|&landmark| s.timing.next(now, landmark, 0))
                    .fold(s.until_boundary(now), Duration::min)
            });

            // The losing future is dropped here, which releases its timer or waiter.
            let _ = select(self.kernel.delay(wake_in), self.reconfigured.wait()).await;
        }
    }

    /// Handles every landmark due at the current time. Each landmark is notified at most once per
    /// simulated instant, including when a reconfiguration moves it onto an instant that was
    /// already handled.
    fn tick(&self) {
        let now = self.kernel.now();

        let due = self.with_state(|s| {
            if s.last_tick != Some(now) {
                s.last_tick = Some(now);
                s.handled.clear();
            }

            s.cycles = s.cycles_at(now);

            let due: Vec<Landmark> = TIMED
                .into_iter()
                .filter(|&l| !s.handled.contains(&l) && s.timing.until(now, l, 0).is_zero())
                .collect();
            s.handled.extend_from_slice(&due);

            let rising = due.contains(&Landmark::Posedge);
            let falling = due.contains(&Landmark::Negedge);

            match (rising, falling) {
                (true, true) => s.value = s.timing.high >= s.timing.period,
                (true, false) => s.value = true,
                (false, true) => s.value = false,
                (false, false) => {}
            }

            due
        });

        if due.iter().any(|l| l.is_edge()) {
            self.events.get(Landmark::Anyedge).notify(Duration::ZERO);
        }

        for landmark in due {
            self.events.get(landmark).notify(Duration::ZERO);
        }
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

            s.base_count = s.cycles_at(now);
            s.change_count = s.change_count.saturating_add(1);
            s.config = config;
            s.timing = timing;
            s.reanchor(now);

            tracing::event!(
                name: "lazy_clock.reconfigured",
                tracing::Level::DEBUG,
                clock.name = %self.name,
                clock.change = change,
                clock.period = ?s.timing.period,
                clock.cycles = s.base_count,
                sim.now = ?now,
            );

            Ok(())
        })?;

        self.reconfigured.notify(Duration::ZERO);
        Ok(())
    }

    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut State) -> R,
    {
        f(&mut self.state.lock().expect("acquiring lock must always succeed"))
    }
}

impl ClockSignal for TickingClock {
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

    /// Returns the cycle count last stored by [`drive`][TickingClock::drive].
    fn cycles(&self) -> u64 {
        self.with_state(|s| s.cycles)
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
            ResetPolicy::Reject => Err(Error::usage(format!("clock '{}' does not support reset", self.name))),
            ResetPolicy::ClearHistory => {
                s.base_count = 0;
                s.change_count = 0;
                s.reanchor(now);
                Ok(())
            }
        })?;

        self.reconfigured.notify(Duration::ZERO);
        Ok(())
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
        self.with_state(|s| s.value)
    }

    fn landmark_event(&self, landmark: Landmark) -> &Event {
        self.events.get(landmark)
    }

    /// Waits on the landmark's event until the target time is reached. Requires
    /// [`drive`][TickingClock::drive] to be running.
    fn wait(&self, landmark: Landmark, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        async move {
            let target = self.kernel.now().saturating_add(self.until(landmark, cycles));
            let event = self.events.get(landmark);

            while self.kernel.now() < target {
                event.wait().await;
            }
        }
    }
}
