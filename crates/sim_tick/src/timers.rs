// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::mem;
use std::task::Waker;
use std::time::Duration;

/// Unique identifier for a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerKey {
    tick: Duration,

    /// Discriminator that orders timers sharing the same simulated time by registration.
    discriminator: u64,
}

impl TimerKey {
    const fn new(tick: Duration, id: u64) -> Self {
        Self { tick, discriminator: id }
    }

    /// Simulated time at which the timer fires.
    pub const fn tick(&self) -> Duration {
        self.tick
    }
}

/// One-shot timers ordered by the simulated time at which they fire.
///
/// Timers registered for the same time fire in registration order, which keeps a
/// simulation run reproducible.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    wakers: BTreeMap<TimerKey, Waker>,
    last_discriminator: u64,
}

impl Timers {
    pub fn len(&self) -> usize {
        self.wakers.len()
    }

    #[cfg(test)]
    fn contains(&self, id: TimerKey) -> bool {
        self.wakers.contains_key(&id)
    }

    /// Registers a new timer that fires at `when`.
    pub fn register(&mut self, when: Duration, waker: Waker) -> TimerKey {
        self.last_discriminator = self.last_discriminator.wrapping_add(1);
        let key = TimerKey::new(when, self.last_discriminator);

        self.wakers.insert(key, waker);

        key
    }

    /// Unregisters a timer. Unknown keys are ignored.
    pub fn unregister(&mut self, id: TimerKey) {
        self.wakers.remove(&id);
    }

    /// Returns the time of the earliest pending timer.
    pub fn next_timer(&self) -> Option<Duration> {
        self.wakers.keys().next().map(TimerKey::tick)
    }

    /// Removes every timer due at or before `now` and returns their wakers in firing order.
    ///
    /// The wakers are returned rather than woken so the caller can release its lock first.
    #[cfg_attr(test, mutants::skip)] // Causes test timeout.
    pub fn take_ready(&mut self, now: Duration) -> Vec<Waker> {
        match self.wakers.first_key_value() {
            Some((first, _)) if first.tick() <= now => {
                // `split_off` keeps keys equal to the split point in the upper half. Discriminators
                // start at 1, so a zero discriminator one nanosecond later splits after every
                // timer due at `now`.
                let split = TimerKey::new(now.saturating_add(Duration::from_nanos(1)), 0);
                let pending = self.wakers.split_off(&split);
                let ready = mem::replace(&mut self.wakers, pending);

                ready.into_values().collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_timers_same_time() {
        let mut timers = Timers::default();
        let when = Duration::from_nanos(20);

        let key1 = timers.register(when, Waker::noop().clone());
        let key2 = timers.register(when, Waker::noop().clone());

        assert_ne!(key1, key2);
        assert!(key1 < key2);

        assert_eq!(timers.take_ready(when).len(), 2);
        assert_eq!(timers.len(), 0);
    }

    #[test]
    fn take_ready_ensure_order() {
        let mut timers = Timers::default();
        let first = Duration::from_nanos(10);
        let second = Duration::from_nanos(20);

        let id1 = timers.register(first, Waker::noop().clone());
        let id2 = timers.register(second, Waker::noop().clone());

        assert_eq!(timers.len(), 2);
        assert_eq!(timers.take_ready(first).len(), 1);
        assert!(!timers.contains(id1));
        assert!(timers.contains(id2));

        assert_eq!(timers.take_ready(second).len(), 1);
        assert_eq!(timers.len(), 0);
    }

    #[test]
    fn take_ready_before_due_is_empty() {
        let mut timers = Timers::default();
        let _ = timers.register(Duration::from_nanos(10), Waker::noop().clone());

        assert!(timers.take_ready(Duration::from_nanos(9)).is_empty());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn unregister_ok() {
        let mut timers = Timers::default();
        let id = timers.register(Duration::ZERO, Waker::noop().clone());

        assert!(timers.contains(id));
        timers.unregister(id);
        assert!(!timers.contains(id));
    }

    #[test]
    fn next_timer_ok() {
        let mut timers = Timers::default();
        assert_eq!(timers.next_timer(), None);

        let _ = timers.register(Duration::from_secs(1), Waker::noop().clone());
        let _ = timers.register(Duration::from_nanos(5), Waker::noop().clone());

        assert_eq!(timers.next_timer(), Some(Duration::from_nanos(5)));
    }
}
