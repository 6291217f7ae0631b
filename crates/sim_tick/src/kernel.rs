// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, Mutex};
use std::task::Waker;
use std::time::Duration;

use crate::timers::{TimerKey, Timers};
use crate::{Delay, Event};

/// Handle to the simulated time of a discrete-event simulation.
///
/// The kernel owns the single simulated timeline shared by every process of a simulation.
/// Time starts at zero (or at the time given to [`Kernel::new_at`]) and only moves forward,
/// either explicitly through [`advance`][Self::advance], [`advance_to`][Self::advance_to] and
/// [`step`][Self::step], or through a [`Simulation`][crate::Simulation] that advances timer by
/// timer while running its processes.
///
/// The kernel offers the three primitives simulation models need:
///
/// - the current simulated time ([`now`][Self::now]);
/// - suspension for a duration ([`delay`][Self::delay]);
/// - events that can be notified with an optional delay ([`event`][Self::event]).
///
/// # Cloning and shared state
///
/// Cloning a kernel is inexpensive (an `Arc` clone) and every clone observes the same
/// timeline and the same registered timers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sim_tick::Kernel;
///
/// let kernel = Kernel::new();
/// assert_eq!(kernel.now(), Duration::ZERO);
///
/// kernel.advance(Duration::from_nanos(42));
/// assert_eq!(kernel.now(), Duration::from_nanos(42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Kernel {
    /// Processes may hold kernel handles on several threads, so the timeline is behind a mutex.
    state: Arc<Mutex<State>>,
}

impl Kernel {
    /// Creates a kernel whose simulated time starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a kernel whose simulated time starts at `start`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use sim_tick::Kernel;
    ///
    /// let kernel = Kernel::new_at(Duration::from_micros(3));
    /// assert_eq!(kernel.now(), Duration::from_micros(3));
    /// ```
    #[must_use]
    pub fn new_at(start: Duration) -> Self {
        let kernel = Self::new();
        kernel.with_state(|s| s.now = start);
        kernel
    }

    /// Returns the current simulated time, measured from the zero-time reference.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.with_state(|s| s.now)
    }

    /// Creates a [`Delay`] that completes once simulated time has moved forward by `duration`.
    ///
    /// A zero duration completes immediately without registering a timer.
    #[must_use]
    pub fn delay(&self, duration: Duration) -> Delay {
        Delay::new(self, duration)
    }

    /// Creates a new [`Event`] bound to this kernel.
    #[must_use]
    pub fn event(&self) -> Event {
        Event::new(self)
    }

    /// Moves simulated time forward by `duration`, firing every timer that becomes due.
    ///
    /// Timers due exactly at the new time fire as well.
    pub fn advance(&self, duration: Duration) {
        let target = self.now().saturating_add(duration);
        self.advance_to(target);
    }

    /// Moves simulated time forward to `time`, firing every timer due at or before it.
    ///
    /// Simulated time never flows backward. A target in the past does not move the
    /// timeline, but timers already due at the current time are still fired.
    pub fn advance_to(&self, time: Duration) {
        let ready = self.with_state(|s| {
            if time > s.now {
                s.now = time;
            } else if time < s.now {
                tracing::event!(
                    name: "sim_tick.backward_advance",
                    tracing::Level::DEBUG,
                    sim.now = ?s.now,
                    sim.target = ?time,
                );
            }

            s.timers.take_ready(s.now)
        });

        // Wakers run outside the lock; waking an event re-enters the kernel.
        for waker in ready {
            waker.wake();
        }
    }

    /// Advances simulated time to the earliest pending timer and fires every timer due then.
    ///
    /// Returns the new simulated time, or `None` when no timer is pending. Timers registered
    /// for the current time (zero-delay notifications) are fired without moving time forward;
    /// each such call is one delta step.
    pub fn step(&self) -> Option<Duration> {
        let next = self.next_timer()?;
        self.advance_to(next);
        Some(self.now())
    }

    /// Returns the simulated time of the earliest pending timer.
    #[must_use]
    pub fn next_timer(&self) -> Option<Duration> {
        self.with_state(|s| s.timers.next_timer())
    }

    /// Returns the number of timers that have not fired yet.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.with_state(|s| s.timers.len())
    }

    pub(crate) fn register_timer(&self, when: Duration, waker: Waker) -> TimerKey {
        self.with_state(|s| s.timers.register(when, waker))
    }

    pub(crate) fn unregister_timer(&self, key: TimerKey) {
        self.with_state(|s| s.timers.unregister(key));
    }

    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut State) -> R,
    {
        f(&mut self.state.lock().expect("acquiring lock must always succeed"))
    }
}

impl AsRef<Self> for Kernel {
    fn as_ref(&self) -> &Self {
        self
    }
}

#[derive(Debug, Default)]
struct State {
    now: Duration,
    timers: Timers,
}
