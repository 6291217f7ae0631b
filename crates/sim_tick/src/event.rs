// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use crate::Kernel;

/// A notification point that processes can wait on.
///
/// Notifying an event schedules its trigger on the kernel timeline. A zero-delay notification
/// fires in the next delta step: simulated time does not move, but only after every process
/// runnable in the current step has had the chance to start waiting. Each notification fires
/// once; there is no cancellation.
///
/// Waiting is edge-sensitive: [`Event::wait`] completes on the first trigger that happens after
/// the wait was first polled. Triggers that happened earlier are not remembered.
///
/// Cloning an event yields another handle to the same event.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sim_tick::Simulation;
///
/// let mut sim = Simulation::new();
/// let event = sim.kernel().event();
/// let kernel = sim.kernel().clone();
///
/// let waiter = event.clone();
/// sim.spawn(async move {
///     waiter.wait().await;
///     assert_eq!(kernel.now(), Duration::from_nanos(7));
/// })
/// .unwrap();
///
/// event.notify(Duration::from_nanos(7));
/// sim.run();
/// assert_eq!(event.trigger_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Event {
    kernel: Kernel,
    trigger: Arc<Trigger>,
}

impl Event {
    pub(crate) fn new(kernel: &Kernel) -> Self {
        Self {
            kernel: kernel.clone(),
            trigger: Arc::default(),
        }
    }

    /// Schedules the event to fire `delay` after the current simulated time.
    pub fn notify(&self, delay: Duration) {
        let when = self.kernel.now().saturating_add(delay);
        let _ = self.kernel.register_timer(when, Waker::from(Arc::clone(&self.trigger)));
    }

    /// Returns a future that completes on the next trigger of this event.
    #[must_use]
    pub fn wait(&self) -> EventWait {
        EventWait {
            trigger: Arc::clone(&self.trigger),
            armed_at: None,
        }
    }

    /// Returns how many times the event has fired.
    #[must_use]
    pub fn trigger_count(&self) -> u64 {
        self.trigger.with_state(|s| s.fired)
    }

    /// Returns the number of wakers currently parked on the event.
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.trigger.with_state(|s| s.waiters.len())
    }

    /// Returns `true` if both handles refer to the same event.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.trigger, &other.trigger)
    }
}

#[derive(Debug, Default)]
struct Trigger {
    state: Mutex<TriggerState>,
}

#[derive(Debug, Default)]
struct TriggerState {
    fired: u64,
    waiters: Vec<Waker>,
}

impl Trigger {
    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut TriggerState) -> R,
    {
        f(&mut self.state.lock().expect("acquiring lock must always succeed"))
    }
}

impl Wake for Trigger {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let waiters = self.with_state(|s| {
            s.fired = s.fired.wrapping_add(1);
            mem::take(&mut s.waiters)
        });

        for waker in waiters {
            waker.wake();
        }
    }
}

/// Future returned by [`Event::wait`].
#[derive(Debug)]
pub struct EventWait {
    trigger: Arc<Trigger>,
    // Trigger count observed on the first poll.
    armed_at: Option<u64>,
}

impl Future for EventWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let armed_at = &mut this.armed_at;

        this.trigger.with_state(|s| match *armed_at {
            Some(seen) if s.fired != seen => Poll::Ready(()),
            Some(_) => {
                if !s.waiters.iter().any(|w| w.will_wake(cx.waker())) {
                    s.waiters.push(cx.waker().clone());
                }
                Poll::Pending
            }
            None => {
                *armed_at = Some(s.fired);
                s.waiters.push(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Event: Send, Sync, Clone);
        static_assertions::assert_impl_all!(EventWait: Send, Sync);
    }

    #[test]
    fn notify_zero_fires_on_next_step() {
        // arrange
        let kernel = Kernel::new_at(Duration::from_nanos(3));
        let event = kernel.event();
        let mut wait = event.wait();
        assert_eq!(poll_wait(&mut wait), Poll::Pending);

        // act
        event.notify(Duration::ZERO);

        // assert
        assert_eq!(event.trigger_count(), 0);
        assert_eq!(kernel.step(), Some(Duration::from_nanos(3)));
        assert_eq!(event.trigger_count(), 1);
        assert_eq!(poll_wait(&mut wait), Poll::Ready(()));
    }

    #[test]
    fn notify_with_delay() {
        let kernel = Kernel::new();
        let event = kernel.event();
        let mut wait = event.wait();
        assert_eq!(poll_wait(&mut wait), Poll::Pending);

        event.notify(Duration::from_nanos(10));
        kernel.advance(Duration::from_nanos(9));
        assert_eq!(poll_wait(&mut wait), Poll::Pending);

        kernel.advance(Duration::from_nanos(1));
        assert_eq!(poll_wait(&mut wait), Poll::Ready(()));
    }

    #[test]
    fn earlier_triggers_not_remembered() {
        let kernel = Kernel::new();
        let event = kernel.event();

        event.notify(Duration::ZERO);
        kernel.step();

        let mut wait = event.wait();
        assert_eq!(poll_wait(&mut wait), Poll::Pending);
    }

    #[test]
    fn repeated_polls_do_not_duplicate_waker() {
        let kernel = Kernel::new();
        let event = kernel.event();
        let mut wait = event.wait();

        assert_eq!(poll_wait(&mut wait), Poll::Pending);
        assert_eq!(poll_wait(&mut wait), Poll::Pending);

        assert_eq!(event.waiters(), 1);
    }

    #[test]
    fn clones_are_same_event() {
        let kernel = Kernel::new();
        let event = kernel.event();

        assert!(event.same_as(&event.clone()));
        assert!(!event.same_as(&kernel.event()));
    }

    fn poll_wait(wait: &mut EventWait) -> Poll<()> {
        let mut cx = Context::from_waker(Waker::noop());
        std::pin::pin!(wait).poll(&mut cx)
    }
}
