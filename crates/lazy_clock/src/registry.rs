// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sim_tick::Kernel;

use crate::{ClockConfig, Error, LazyClock, Result};

/// Named clocks shared by independently constructed models.
///
/// Create one registry when the simulation is set up and hand clones of it to every model that
/// needs a shared clock. All clones see the same clocks. Clocks are created on first
/// registration and stay registered for the lifetime of the registry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lazy_clock::{ClockConfig, ClockRegistry, ClockSignal};
/// use sim_tick::Kernel;
///
/// let registry = ClockRegistry::new(&Kernel::new());
///
/// // The first registration defines the clock.
/// let cpu = registry.global("cpu", ClockConfig::new(Duration::from_nanos(10)))?;
///
/// // Later registrations return the same clock and ignore their configuration.
/// let again = registry.global("cpu", ClockConfig::new(Duration::from_nanos(99)))?;
/// assert_eq!(again.period(), Duration::from_nanos(10));
///
/// // Models that only consume the clock look it up by name.
/// let bus = registry.lookup("cpu")?;
/// assert!(std::sync::Arc::ptr_eq(&cpu, &bus));
/// # Ok::<(), lazy_clock::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClockRegistry {
    kernel: Kernel,
    clocks: Arc<Mutex<HashMap<String, Arc<LazyClock>>>>,
}

impl ClockRegistry {
    /// Creates an empty registry whose clocks read time from `kernel`.
    #[must_use]
    pub fn new(kernel: &Kernel) -> Self {
        Self {
            kernel: kernel.clone(),
            clocks: Arc::default(),
        }
    }

    /// Returns the clock registered as `name`, creating it from `config` if no such clock exists.
    ///
    /// The first registration wins: when `name` is already registered, `config` is ignored and
    /// the existing clock is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the clock has to be created and `config` is invalid.
    /// Nothing is registered in that case.
    pub fn global(&self, name: &str, config: ClockConfig) -> Result<Arc<LazyClock>> {
        self.with_clocks(|clocks| {
            if let Some(clock) = clocks.get(name) {
                tracing::event!(
                    name: "lazy_clock.registered",
                    tracing::Level::DEBUG,
                    clock.name = name,
                    clock.existing = true,
                );
                return Ok(Arc::clone(clock));
            }

            let clock = Arc::new(LazyClock::new(name, &self.kernel, config)?);
            clocks.insert(name.to_owned(), Arc::clone(&clock));

            tracing::event!(
                name: "lazy_clock.registered",
                tracing::Level::INFO,
                clock.name = name,
                clock.existing = false,
            );

            Ok(clock)
        })
    }

    /// Returns the clock registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no clock is registered as `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<LazyClock>> {
        let found = self.with_clocks(|clocks| clocks.get(name).map(Arc::clone));

        found.ok_or_else(|| {
            tracing::event!(
                name: "lazy_clock.lookup_failed",
                tracing::Level::ERROR,
                clock.name = name,
            );

            Error::usage(format!("missing definition for global clock '{name}'"))
        })
    }

    /// Returns `true` if a clock is registered as `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.with_clocks(|clocks| clocks.contains_key(name))
    }

    /// Returns the number of registered clocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_clocks(|clocks| clocks.len())
    }

    /// Returns `true` if no clock is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_clocks(|clocks| clocks.is_empty())
    }

    /// Returns the names of the registered clocks in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names = self.with_clocks(|clocks| clocks.keys().cloned().collect::<Vec<_>>());
        names.sort_unstable();
        names
    }

    fn with_clocks<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<String, Arc<LazyClock>>) -> R,
    {
        f(&mut self.clocks.lock().expect("acquiring lock must always succeed"))
    }
}
