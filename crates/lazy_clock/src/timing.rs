// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use jiff::SignedDuration;

use crate::arith::{self, delay};
use crate::{ClockConfig, Edge, Landmark, Result};

/// A validated configuration together with the edge offsets derived from it.
///
/// Every clock implementation answers landmark queries through this type so the modular
/// arithmetic lives in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Timing {
    pub period: Duration,
    pub duty: f64,
    pub offset: Duration,
    pub first_edge: Edge,
    pub shift: SignedDuration,
    pub posedge: Duration,
    pub negedge: Duration,
    pub sample: Duration,
    pub set_edge: Duration,
    pub high: Duration,
}

impl Timing {
    pub fn resolve(config: &ClockConfig) -> Result<Self> {
        config.validate()?;

        let period = config.period;
        let high = high_time(period, config.duty);
        let period_ns = arith::nanos(period);
        let offset_ns = arith::nanos(config.offset);

        let (posedge, negedge) = match config.first_edge {
            Edge::Positive => (offset_ns, offset_ns + arith::nanos(high)),
            Edge::Negative => (offset_ns + period_ns - arith::nanos(high), offset_ns),
        };

        let posedge = arith::from_nanos(posedge.rem_euclid(period_ns));
        let negedge = arith::from_nanos(negedge.rem_euclid(period_ns));

        Ok(Self {
            period,
            duty: config.duty,
            offset: config.offset,
            first_edge: config.first_edge,
            shift: config.time_shift,
            posedge,
            negedge,
            sample: config.sample.unwrap_or(posedge),
            set_edge: config.set_edge.unwrap_or(negedge),
            high,
        })
    }

    /// Offset of a landmark within a cycle. Any-edge has no fixed offset and maps to the rising
    /// edge.
    pub fn offset_of(&self, landmark: Landmark) -> Duration {
        match landmark {
            Landmark::Posedge | Landmark::Anyedge => self.posedge,
            Landmark::Negedge => self.negedge,
            Landmark::Sample => self.sample,
            Landmark::Setedge => self.set_edge,
        }
    }

    pub fn periods(&self, cycles: u32) -> Duration {
        self.period.saturating_mul(cycles)
    }

    pub fn until(&self, now: Duration, landmark: Landmark, cycles: u32) -> Duration {
        let left = match landmark {
            Landmark::Anyedge if self.read(now) => self.raw(now, self.negedge),
            Landmark::Anyedge => self.raw(now, self.posedge),
            other => self.raw(now, self.offset_of(other)),
        };

        self.periods(cycles).saturating_add(left)
    }

    /// Same as [`until`][Self::until], with a full period added when the landmark is now.
    pub fn next(&self, now: Duration, landmark: Landmark, cycles: u32) -> Duration {
        let left = match self.until(now, landmark, 0) {
            Duration::ZERO => self.period,
            left => left,
        };

        self.periods(cycles).saturating_add(left)
    }

    /// The clock reads high strictly after a rising edge, up to and including the falling edge.
    pub fn read(&self, now: Duration) -> bool {
        if self.high.is_zero() {
            false
        } else if self.high >= self.period {
            true
        } else {
            self.raw(now, self.negedge) < self.raw(now, self.posedge)
        }
    }

    /// Returns `true` if the rising and falling edges fall on the same instant.
    pub fn edges_coincide(&self) -> bool {
        self.posedge == self.negedge
    }

    fn raw(&self, now: Duration, offset: Duration) -> Duration {
        delay(now, self.period, offset, self.shift)
    }
}

/// Length of the high part of each period, rounded to the nearest nanosecond.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "duty is validated to [0, 1] and the product is clamped to the period"
)]
fn high_time(period: Duration, duty: f64) -> Duration {
    let high_ns = ((period.as_nanos() as f64) * duty).round() as u128;

    arith::from_nanos(i128::try_from(high_ns).unwrap_or(i128::MAX)).min(period)
}
