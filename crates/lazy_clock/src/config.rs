// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;
use sim_tick::Kernel;

use crate::{Error, LazyClock, Result};

pub(crate) const DEFAULT_DUTY: f64 = 0.5;

/// Polarity of the first edge of a clock after its offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Edge {
    /// The clock rises at its offset and stays high for the duty-cycle fraction of the period.
    #[default]
    Positive,

    /// The clock falls at its offset and rises once the low part of the period has elapsed.
    ///
    /// The rising edge sits at `offset + period - duty * period`, not at `offset + duty * period`,
    /// so the duty cycle stays the high fraction of the period for either polarity.
    Negative,
}

/// How a clock resolves a time difference that came out negative.
///
/// Simulated durations are never negative. A negative difference shows up when a cycle count is
/// requested for a time before the clock's last reconfiguration. Either policy logs a warning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NegativeTimePolicy {
    /// Clamp the difference to zero.
    #[default]
    Zero,

    /// Use the magnitude of the difference.
    Mirror,
}

/// What [`reset`][crate::ClockSignal::reset] does to a clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResetPolicy {
    /// Resetting fails with a usage error and leaves the clock unchanged.
    #[default]
    Reject,

    /// Resetting clears the cycle count and the frequency change history, and restarts cycle
    /// counting at the current simulated time.
    ClearHistory,
}

/// Configuration of a clock signal.
///
/// Only the period is required. The remaining settings default to a 50% duty cycle, no offset,
/// a rising first edge and no temporal shift. Unless set explicitly, the sample point follows the
/// rising edge and the set-edge point follows the falling edge.
///
/// Values are validated when the configuration is applied to a clock:
///
/// - the period must be positive;
/// - the duty cycle must lie in `[0, 1]`;
/// - the offset, sample and set-edge times must be shorter than the period.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lazy_clock::{ClockConfig, ClockSignal, Edge};
/// use sim_tick::Kernel;
///
/// let clock = ClockConfig::new(Duration::from_nanos(10))
///     .duty_cycle(0.3)
///     .offset(Duration::from_nanos(2))
///     .first_edge(Edge::Negative)
///     .build("clk", &Kernel::new())?;
///
/// assert_eq!(clock.negedge_offset(), Duration::from_nanos(2));
/// assert_eq!(clock.posedge_offset(), Duration::from_nanos(9));
/// # Ok::<(), lazy_clock::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockConfig {
    pub(crate) period: Duration,

    #[cfg_attr(feature = "serde", serde(default = "default_duty"))]
    pub(crate) duty: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) offset: Duration,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) first_edge: Edge,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) sample: Option<Duration>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) set_edge: Option<Duration>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) time_shift: SignedDuration,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) negative_time_policy: NegativeTimePolicy,

    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) reset_policy: ResetPolicy,
}

impl ClockConfig {
    /// Creates a configuration for a clock with the given period.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            duty: DEFAULT_DUTY,
            offset: Duration::ZERO,
            first_edge: Edge::Positive,
            sample: None,
            set_edge: None,
            time_shift: SignedDuration::ZERO,
            negative_time_policy: NegativeTimePolicy::Zero,
            reset_policy: ResetPolicy::Reject,
        }
    }

    /// Sets the fraction of each period during which the clock is high.
    #[must_use]
    pub fn duty_cycle(mut self, duty: f64) -> Self {
        self.duty = duty;
        self
    }

    /// Sets the time from the zero-time reference to the first edge.
    #[must_use]
    pub fn offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the polarity of the first edge.
    #[must_use]
    pub fn first_edge(mut self, edge: Edge) -> Self {
        self.first_edge = edge;
        self
    }

    /// Sets the sample point, measured from the start of each cycle.
    #[must_use]
    pub fn sample(mut self, sample: Duration) -> Self {
        self.sample = Some(sample);
        self
    }

    /// Sets the set-edge point, measured from the start of each cycle.
    #[must_use]
    pub fn set_edge(mut self, set_edge: Duration) -> Self {
        self.set_edge = Some(set_edge);
        self
    }

    /// Sets the temporal shift added to the current simulated time before every landmark
    /// computation.
    #[must_use]
    pub fn time_shift(mut self, shift: SignedDuration) -> Self {
        self.time_shift = shift;
        self
    }

    /// Sets how negative time differences are resolved.
    #[must_use]
    pub fn negative_time_policy(mut self, policy: NegativeTimePolicy) -> Self {
        self.negative_time_policy = policy;
        self
    }

    /// Sets what resetting the clock does.
    #[must_use]
    pub fn reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    /// Creates a [`LazyClock`] named `name` on `kernel` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid.
    pub fn build(self, name: impl Into<String>, kernel: &Kernel) -> Result<LazyClock> {
        LazyClock::new(name, kernel, self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(Error::configuration("period must be positive"));
        }

        if !(0.0..=1.0).contains(&self.duty) {
            return Err(Error::configuration(format!("duty cycle {} is outside [0, 1]", self.duty)));
        }

        let within_period = [
            ("offset", Some(self.offset)),
            ("sample time", self.sample),
            ("set-edge time", self.set_edge),
        ];

        for (what, value) in within_period {
            if let Some(value) = value
                && value >= self.period
            {
                return Err(Error::configuration(format!(
                    "{what} {value:?} is not shorter than the period {:?}",
                    self.period
                )));
            }
        }

        Ok(())
    }
}

#[cfg(feature = "serde")]
fn default_duty() -> f64 {
    DEFAULT_DUTY
}
