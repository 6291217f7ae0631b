// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::{LocalSpawnExt, SpawnError};

use crate::Kernel;

/// Drives processes against a [`Kernel`] timeline.
///
/// A simulation runs its processes cooperatively on a single thread. Each round runs every
/// runnable process until it suspends, then advances the kernel to the earliest pending timer
/// and fires it. Processes therefore never observe time moving while they run, and processes
/// released by the same timer all resume at the same simulated time.
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
///     for _ in 0..3 {
///         kernel.delay(Duration::from_nanos(10)).await;
///     }
/// })
/// .unwrap();
///
/// assert_eq!(sim.run(), Duration::from_nanos(30));
/// ```
#[derive(Debug)]
pub struct Simulation {
    kernel: Kernel,
    pool: LocalPool,
    spawner: LocalSpawner,
}

impl Simulation {
    /// Creates a simulation with a fresh kernel starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kernel(Kernel::new())
    }

    /// Creates a simulation driving an existing kernel.
    #[must_use]
    pub fn with_kernel(kernel: Kernel) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();

        Self { kernel, pool, spawner }
    }

    /// Returns the kernel driven by this simulation.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Adds a process to the simulation. The process first runs on the next call to one of the
    /// `run*` methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor refuses the process.
    pub fn spawn<F>(&self, process: F) -> Result<(), SpawnError>
    where
        F: Future<Output = ()> + 'static,
    {
        self.spawner.spawn_local(process)
    }

    /// Runs until no process is runnable and no timer is pending.
    ///
    /// Returns the final simulated time. Processes that never stop scheduling timers keep this
    /// call from returning; bound such simulations with [`run_until`][Self::run_until].
    pub fn run(&mut self) -> Duration {
        self.run_until(Duration::MAX)
    }

    /// Runs until simulated time would pass `deadline`.
    ///
    /// Timers due at or before the deadline fire; afterwards the kernel is moved to the deadline
    /// (unless it is [`Duration::MAX`]) and the processes released there run. Returns the final
    /// simulated time.
    pub fn run_until(&mut self, deadline: Duration) -> Duration {
        let mut steps: u64 = 0;

        loop {
            self.pool.run_until_stalled();

            match self.kernel.next_timer() {
                Some(next) if next <= deadline => {
                    self.kernel.advance_to(next);
                    steps = steps.wrapping_add(1);
                }
                _ => break,
            }
        }

        if deadline != Duration::MAX && deadline > self.kernel.now() {
            self.kernel.advance_to(deadline);
            self.pool.run_until_stalled();
        }

        tracing::event!(
            name: "sim_tick.run",
            tracing::Level::TRACE,
            sim.now = ?self.kernel.now(),
            sim.steps = steps,
        );

        self.kernel.now()
    }

    /// Runs for `duration` of simulated time from the current time.
    pub fn run_for(&mut self, duration: Duration) -> Duration {
        let deadline = self.kernel.now().saturating_add(duration);
        self.run_until(deadline)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
