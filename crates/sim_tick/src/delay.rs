// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use crate::Kernel;
use crate::timers::TimerKey;

/// Suspends the awaiting process until simulated time has moved forward by a duration.
///
/// The deadline is computed when the delay is first polled, so a delay created and awaited
/// by a process completes exactly `duration` after the simulated time at which the process
/// started waiting.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sim_tick::Simulation;
///
/// let mut sim = Simulation::new();
/// let kernel = sim.kernel().clone();
///
/// sim.spawn(async move {
///     kernel.delay(Duration::from_nanos(25)).await;
///     assert_eq!(kernel.now(), Duration::from_nanos(25));
/// })
/// .unwrap();
///
/// assert_eq!(sim.run(), Duration::from_nanos(25));
/// ```
#[derive(Debug)]
pub struct Delay {
    // Not registered until the first call to `Future::poll`.
    current_timer: Option<TimerKey>,
    kernel: Kernel,
    duration: Duration,
}

impl Delay {
    /// Creates a new delay that completes after `duration` of simulated time.
    ///
    /// If the duration is [`Duration::ZERO`], the delay completes immediately.
    /// If the deadline would overflow the simulated timeline, the delay never completes.
    ///
    /// > **Note**: Consider using [`Kernel::delay()`] as a shortcut for creating delays.
    #[must_use]
    pub fn new(kernel: &Kernel, duration: Duration) -> Self {
        Self {
            duration,
            current_timer: None,
            kernel: kernel.clone(),
        }
    }

    /// Returns the duration this delay waits for.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn register_timer(&mut self, waker: &Waker) -> Poll<()> {
        if let Some(when) = self.kernel.now().checked_add(self.duration) {
            self.current_timer = Some(self.kernel.register_timer(when, waker.clone()));
        } else {
            self.duration = Duration::MAX;
            self.current_timer = None;
        }

        Poll::Pending
    }
}

impl Future for Delay {
    type Output = ();

    #[cfg_attr(test, mutants::skip)] // some mutations never finish and cause timeouts
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match this.current_timer {
            None if this.duration == Duration::MAX => Poll::Pending,
            None if this.duration == Duration::ZERO => Poll::Ready(()),
            None => this.register_timer(cx.waker()),
            Some(key) if key.tick() <= this.kernel.now() => {
                this.current_timer = None;

                // The timer is already gone when time advanced past it; this covers explicit polls.
                this.kernel.unregister_timer(key);

                Poll::Ready(())
            }
            Some(_) => Poll::Pending,
        }
    }
}

impl Drop for Delay {
    fn drop(&mut self) {
        if let Some(key) = self.current_timer {
            self.kernel.unregister_timer(key);
        }
    }
}
