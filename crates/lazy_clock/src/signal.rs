// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;
use sim_tick::{Event, Kernel};

use crate::{Error, Landmark, Result};

/// The capabilities of a clock signal as seen by the models that consume it.
///
/// A model written against this trait works the same whether it is handed a [`LazyClock`],
/// which computes edge times on demand, or a [`TickingClock`], which runs a process toggling its
/// value at every edge.
///
/// Each landmark of a cycle ([`Landmark`]) is reachable through four families of methods:
///
/// - `until_*` returns the time left until the landmark, zero when already on it;
/// - `next_*` returns the same time but never zero, so loops always make progress;
/// - `wait_*` suspends the calling process until the landmark, without suspending at all when
///   already on it;
/// - `at_*_time` tells whether the current time is on the landmark.
///
/// The `*_event` methods wait for a landmark and then notify the landmark's event in the next
/// delta step, for models that prefer observing events over awaiting inline.
///
/// The `cycles` argument of these methods pushes the landmark that many whole periods further.
///
/// [`LazyClock`]: crate::LazyClock
/// [`TickingClock`]: crate::TickingClock
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lazy_clock::{ClockConfig, ClockSignal};
/// use sim_tick::Simulation;
///
/// async fn sample_three<C: ClockSignal>(clock: &C) -> Vec<Duration> {
///     let mut seen = Vec::new();
///     for _ in 0..3 {
///         clock.wait_sample(1).await;
///         seen.push(clock.kernel().now());
///     }
///     seen
/// }
///
/// let mut sim = Simulation::new();
/// let clock = ClockConfig::new(Duration::from_nanos(10))
///     .sample(Duration::from_nanos(2))
///     .build("clk", sim.kernel())?;
///
/// sim.spawn(async move {
///     let seen = sample_three(&clock).await;
///     assert_eq!(seen, [12, 22, 32].map(Duration::from_nanos));
/// })
/// .unwrap();
///
/// sim.run();
/// # Ok::<(), lazy_clock::Error>(())
/// ```
pub trait ClockSignal: Send + Sync {
    /// Returns the name of the clock.
    fn name(&self) -> &str;

    /// Returns the kernel providing the clock's notion of current time.
    fn kernel(&self) -> &Kernel;

    /// Returns the length of one cycle.
    fn period(&self) -> Duration;

    /// Returns the fraction of each period during which the clock is high.
    fn duty(&self) -> f64;

    /// Returns the temporal shift applied to the current time before every landmark computation.
    fn time_shift(&self) -> SignedDuration;

    /// Returns the number of cycles elapsed since the clock was created or last reset.
    ///
    /// The count carries over configuration changes: cycles elapsed under an earlier period are
    /// kept, and only cycles after the change are counted with the new period.
    fn cycles(&self) -> u64;

    /// Returns how many times the clock was reconfigured.
    fn frequency_changes(&self) -> u64;

    /// Changes the period.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the period is zero or not longer than the offset, sample
    /// or set-edge times. The clock is left unchanged.
    fn set_period(&self, period: Duration) -> Result<()>;

    /// Changes the time to the first edge.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the offset is not shorter than the period.
    fn set_offset(&self, offset: Duration) -> Result<()>;

    /// Changes the duty cycle.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the duty cycle is outside `[0, 1]`.
    fn set_duty_cycle(&self, duty: f64) -> Result<()>;

    /// Changes the sample point within each cycle.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the time is not shorter than the period.
    fn set_sample_time(&self, sample: Duration) -> Result<()>;

    /// Changes the set-edge point within each cycle.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the time is not shorter than the period.
    fn set_setedge_time(&self, set_edge: Duration) -> Result<()>;

    /// Changes the temporal shift.
    ///
    /// # Errors
    ///
    /// Implementations may reject shifts they cannot represent.
    fn set_time_shift(&self, shift: SignedDuration) -> Result<()>;

    /// Resets the cycle count and frequency change history according to the clock's
    /// [`ResetPolicy`][crate::ResetPolicy].
    ///
    /// # Errors
    ///
    /// Returns a usage error if the policy rejects resets.
    fn reset(&self) -> Result<()>;

    /// Returns the time left until `landmark`, `cycles` periods further. Zero when already on
    /// the landmark and `cycles` is zero.
    fn until(&self, landmark: Landmark, cycles: u32) -> Duration;

    /// Returns the time left until `landmark`, `cycles` periods further, never zero. When
    /// already on the landmark, the next occurrence is one full period away.
    fn next(&self, landmark: Landmark, cycles: u32) -> Duration;

    /// Returns the current logic level: `true` while the clock is high.
    fn read(&self) -> bool;

    /// Returns the event associated with `landmark`.
    fn landmark_event(&self, landmark: Landmark) -> &Event;

    /// Suspends until `landmark`, `cycles` periods further. Does not suspend when that is the
    /// current time.
    fn wait(&self, landmark: Landmark, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        async move {
            let left = self.until(landmark, cycles);
            if !left.is_zero() {
                self.kernel().delay(left).await;
            }
        }
    }

    /// Returns `true` if the current time is on `landmark`.
    fn at(&self, landmark: Landmark) -> bool {
        self.until(landmark, 0).is_zero()
    }

    /// Waits for `landmark`, then notifies its event with zero delay and returns the event.
    fn event_after(&self, landmark: Landmark, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        async move {
            self.wait(landmark, cycles).await;

            let event = self.landmark_event(landmark);
            event.notify(Duration::ZERO);
            event.clone()
        }
    }

    /// Returns the length of `cycles` periods.
    fn periods(&self, cycles: u32) -> Duration {
        self.period().saturating_mul(cycles)
    }

    /// Returns the clock frequency in hertz.
    fn frequency(&self) -> f64 {
        1.0 / self.period().as_secs_f64()
    }

    /// Changes the period to `1 / frequency` seconds, rounded to the nearest nanosecond.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the frequency is not a positive finite number, or if the
    /// resulting period is rejected by [`set_period`][Self::set_period].
    fn set_frequency(&self, frequency: f64) -> Result<()> {
        self.set_period(period_of(frequency)?)
    }

    /// Always fails: a clock is a derived signal and cannot be driven.
    ///
    /// # Errors
    ///
    /// Always returns a usage error.
    fn write(&self, value: bool) -> Result<()> {
        tracing::event!(
            name: "lazy_clock.write_rejected",
            tracing::Level::ERROR,
            clock.name = self.name(),
            clock.value = value,
        );

        Err(Error::usage(format!("write() is not allowed on clock '{}'", self.name())))
    }

    /// Returns the time left until the next rising edge.
    fn until_posedge(&self, cycles: u32) -> Duration {
        self.until(Landmark::Posedge, cycles)
    }

    /// Returns the time left until the next falling edge.
    fn until_negedge(&self, cycles: u32) -> Duration {
        self.until(Landmark::Negedge, cycles)
    }

    /// Returns the time left until the next edge given the current level.
    fn until_anyedge(&self, cycles: u32) -> Duration {
        self.until(Landmark::Anyedge, cycles)
    }

    /// Returns the time left until the next sample point.
    fn until_sample(&self, cycles: u32) -> Duration {
        self.until(Landmark::Sample, cycles)
    }

    /// Returns the time left until the next set-edge point.
    fn until_setedge(&self, cycles: u32) -> Duration {
        self.until(Landmark::Setedge, cycles)
    }

    /// Like [`until_posedge`][Self::until_posedge], but never zero.
    fn next_posedge(&self, cycles: u32) -> Duration {
        self.next(Landmark::Posedge, cycles)
    }

    /// Like [`until_negedge`][Self::until_negedge], but never zero.
    fn next_negedge(&self, cycles: u32) -> Duration {
        self.next(Landmark::Negedge, cycles)
    }

    /// Like [`until_anyedge`][Self::until_anyedge], but never zero.
    fn next_anyedge(&self, cycles: u32) -> Duration {
        self.next(Landmark::Anyedge, cycles)
    }

    /// Like [`until_sample`][Self::until_sample], but never zero.
    fn next_sample(&self, cycles: u32) -> Duration {
        self.next(Landmark::Sample, cycles)
    }

    /// Like [`until_setedge`][Self::until_setedge], but never zero.
    fn next_setedge(&self, cycles: u32) -> Duration {
        self.next(Landmark::Setedge, cycles)
    }

    /// Suspends until the next rising edge.
    fn wait_posedge(&self, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        self.wait(Landmark::Posedge, cycles)
    }

    /// Suspends until the next falling edge.
    fn wait_negedge(&self, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        self.wait(Landmark::Negedge, cycles)
    }

    /// Suspends until the next edge given the current level.
    fn wait_anyedge(&self, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        self.wait(Landmark::Anyedge, cycles)
    }

    /// Suspends until the next sample point.
    fn wait_sample(&self, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        self.wait(Landmark::Sample, cycles)
    }

    /// Suspends until the next set-edge point.
    fn wait_setedge(&self, cycles: u32) -> impl Future<Output = ()> + Send + '_ {
        self.wait(Landmark::Setedge, cycles)
    }

    /// Returns `true` on a rising edge.
    fn at_posedge_time(&self) -> bool {
        self.at(Landmark::Posedge)
    }

    /// Returns `true` on a falling edge.
    fn at_negedge_time(&self) -> bool {
        self.at(Landmark::Negedge)
    }

    /// Returns `true` on an edge of either polarity.
    fn at_anyedge_time(&self) -> bool {
        self.at(Landmark::Anyedge)
    }

    /// Returns `true` on a sample point.
    fn at_sample_time(&self) -> bool {
        self.at(Landmark::Sample)
    }

    /// Returns `true` on a set-edge point.
    fn at_setedge_time(&self) -> bool {
        self.at(Landmark::Setedge)
    }

    /// Waits for the next rising edge and notifies the rising-edge event.
    fn posedge_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.event_after(Landmark::Posedge, cycles)
    }

    /// Waits for the next falling edge and notifies the falling-edge event.
    fn negedge_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.event_after(Landmark::Negedge, cycles)
    }

    /// Waits for the next sample point and notifies the sample event.
    fn sample_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.event_after(Landmark::Sample, cycles)
    }

    /// Waits for the next set-edge point and notifies the set-edge event.
    fn setedge_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.event_after(Landmark::Setedge, cycles)
    }

    /// Waits for the next edge and notifies the any-edge event.
    fn value_changed_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.event_after(Landmark::Anyedge, cycles)
    }

    /// Same as [`value_changed_event`][Self::value_changed_event].
    fn default_event(&self, cycles: u32) -> impl Future<Output = Event> + Send + '_ {
        self.value_changed_event(cycles)
    }
}

/// Converts a frequency in hertz into a period rounded to the nearest nanosecond.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "the value is checked to be a whole number of nanoseconds within u64 range"
)]
pub(crate) fn period_of(frequency: f64) -> Result<Duration> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(Error::configuration(format!("frequency {frequency} must be positive and finite")));
    }

    let nanos = (1e9 / frequency).round();
    if nanos < 1.0 || nanos > u64::MAX as f64 {
        return Err(Error::configuration(format!(
            "frequency {frequency} Hz does not give a period of at least one nanosecond"
        )));
    }

    Ok(Duration::from_nanos(nanos as u64))
}
