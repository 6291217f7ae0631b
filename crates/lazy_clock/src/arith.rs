// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Landmark arithmetic shared by every clock implementation.
//!
//! All functions are pure: they take the current simulated time as an argument and compute on
//! exact integer nanoseconds. Remainders are Euclidean, so a shifted time before the zero-time
//! reference still lands in `[0, period)`.

use std::time::Duration;

use jiff::SignedDuration;

use crate::NegativeTimePolicy;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Returns the time left until the landmark at `landmark` within each cycle of `period`,
/// evaluated at `now` shifted by `shift`.
///
/// The result is zero exactly when the shifted time sits on the landmark, and otherwise lies in
/// `(0, period)` for landmarks within one period. A zero period yields zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use jiff::SignedDuration;
/// use lazy_clock::arith::delay;
///
/// let period = Duration::from_nanos(10);
/// let landmark = Duration::from_nanos(5);
///
/// assert_eq!(delay(Duration::from_nanos(5), period, landmark, SignedDuration::ZERO), Duration::ZERO);
/// assert_eq!(delay(Duration::from_nanos(8), period, landmark, SignedDuration::ZERO), Duration::from_nanos(7));
/// assert_eq!(delay(Duration::from_nanos(8), period, landmark, SignedDuration::from_nanos(-4)), Duration::from_nanos(1));
/// ```
#[must_use]
pub fn delay(now: Duration, period: Duration, landmark: Duration, shift: SignedDuration) -> Duration {
    let period = nanos(period);
    if period == 0 {
        return Duration::ZERO;
    }

    let landmark = nanos(landmark);
    let remainder = shifted(now, shift).as_nanos().rem_euclid(period);

    let left = if remainder == landmark {
        0
    } else if remainder < landmark {
        landmark - remainder
    } else {
        period + landmark - remainder
    };

    from_nanos(left)
}

/// Returns the number of whole periods that fit in `elapsed`. A zero period yields zero.
#[must_use]
pub fn clocks(elapsed: Duration, period: Duration) -> u64 {
    match period.as_nanos() {
        0 => 0,
        period => u64::try_from(elapsed.as_nanos() / period).unwrap_or(u64::MAX),
    }
}

/// Returns `now` moved by `shift`. The result is negative when a negative shift reaches back
/// past the zero-time reference.
#[must_use]
pub fn shifted(now: Duration, shift: SignedDuration) -> SignedDuration {
    to_signed(nanos(now) + shift.as_nanos())
}

/// Returns the time from `earlier` to `later`.
///
/// Simulated durations cannot be negative. When `later` precedes `earlier`, the difference is
/// resolved according to `policy` and a warning is logged.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use jiff::SignedDuration;
/// use lazy_clock::NegativeTimePolicy;
/// use lazy_clock::arith::time_diff;
///
/// let early = SignedDuration::from_nanos(3);
/// let late = SignedDuration::from_nanos(10);
///
/// assert_eq!(time_diff(late, early, NegativeTimePolicy::Zero), Duration::from_nanos(7));
/// assert_eq!(time_diff(early, late, NegativeTimePolicy::Zero), Duration::ZERO);
/// assert_eq!(time_diff(early, late, NegativeTimePolicy::Mirror), Duration::from_nanos(7));
/// ```
#[must_use]
pub fn time_diff(later: SignedDuration, earlier: SignedDuration, policy: NegativeTimePolicy) -> Duration {
    let diff = later.as_nanos() - earlier.as_nanos();
    if diff >= 0 {
        return from_nanos(diff);
    }

    tracing::event!(
        name: "lazy_clock.negative_time",
        tracing::Level::WARN,
        time.later = ?later,
        time.earlier = ?earlier,
        time.policy = ?policy,
    );

    match policy {
        NegativeTimePolicy::Zero => Duration::ZERO,
        NegativeTimePolicy::Mirror => from_nanos(-diff),
    }
}

pub(crate) fn nanos(duration: Duration) -> i128 {
    // Every `Duration` fits: u64::MAX seconds is about 1.8e28 nanoseconds.
    i128::try_from(duration.as_nanos()).unwrap_or(i128::MAX)
}

/// Converts nanoseconds into a duration, clamping negative values to zero.
pub(crate) fn from_nanos(nanos: i128) -> Duration {
    let nanos = u128::try_from(nanos).unwrap_or(0);
    let secs = u64::try_from(nanos / NANOS_PER_SEC.unsigned_abs()).unwrap_or(u64::MAX);
    let subsec = u32::try_from(nanos % NANOS_PER_SEC.unsigned_abs()).unwrap_or(0);

    Duration::new(secs, subsec)
}

fn to_signed(nanos: i128) -> SignedDuration {
    let secs = nanos / NANOS_PER_SEC;
    let subsec = nanos % NANOS_PER_SEC;

    match (i64::try_from(secs), i32::try_from(subsec)) {
        (Ok(secs), Ok(subsec)) => SignedDuration::new(secs, subsec),
        _ if nanos < 0 => SignedDuration::MIN,
        _ => SignedDuration::MAX,
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn ns(value: u64) -> Duration {
        Duration::from_nanos(value)
    }

    #[rstest]
    #[case::on_landmark(0, 0, 0)]
    #[case::before_landmark(0, 5, 5)]
    #[case::past_landmark(8, 0, 2)]
    #[case::past_landmark_wraps(8, 5, 7)]
    #[case::later_cycle(23, 1, 8)]
    #[case::on_landmark_later_cycle(41, 1, 0)]
    fn delay_cases(#[case] now: u64, #[case] landmark: u64, #[case] expected: u64) {
        assert_eq!(delay(ns(now), ns(10), ns(landmark), SignedDuration::ZERO), ns(expected));
    }

    #[test]
    fn delay_stays_within_period() {
        let period = ns(7);

        for now in 0..50 {
            for landmark in 0..7 {
                let left = delay(ns(now), period, ns(landmark), SignedDuration::ZERO);
                assert!(left < period, "now={now} landmark={landmark} left={left:?}");
                assert_eq!(left.is_zero(), now % 7 == landmark);
            }
        }
    }

    #[test]
    fn delay_with_negative_shift_before_zero() {
        // 2 - 5 = -3, which is 7 modulo 10.
        assert_eq!(delay(ns(2), ns(10), ns(0), SignedDuration::from_nanos(-5)), ns(3));
        assert_eq!(delay(ns(2), ns(10), ns(7), SignedDuration::from_nanos(-5)), Duration::ZERO);
    }

    #[test]
    fn delay_with_positive_shift() {
        assert_eq!(delay(ns(0), ns(10), ns(0), SignedDuration::from_nanos(4)), ns(6));
    }

    #[test]
    fn delay_zero_period() {
        assert_eq!(delay(ns(5), Duration::ZERO, ns(0), SignedDuration::ZERO), Duration::ZERO);
    }

    #[test]
    fn delay_large_times() {
        let period = Duration::from_secs(3);
        let now = Duration::from_secs(u64::MAX / 2);

        let left = delay(now, period, Duration::ZERO, SignedDuration::ZERO);
        assert!(left < period);
    }

    #[test]
    fn clocks_ok() {
        assert_eq!(clocks(ns(0), ns(10)), 0);
        assert_eq!(clocks(ns(9), ns(10)), 0);
        assert_eq!(clocks(ns(10), ns(10)), 1);
        assert_eq!(clocks(ns(35), ns(10)), 3);
        assert_eq!(clocks(ns(35), Duration::ZERO), 0);
    }

    #[test]
    fn shifted_ok() {
        assert_eq!(shifted(ns(10), SignedDuration::from_nanos(-3)), SignedDuration::from_nanos(7));
        assert_eq!(shifted(ns(1), SignedDuration::from_nanos(-3)), SignedDuration::from_nanos(-2));
        assert_eq!(
            shifted(Duration::from_millis(1500), SignedDuration::from_millis(-2250)),
            SignedDuration::from_millis(-750)
        );
    }

    #[rstest]
    #[case::zero(NegativeTimePolicy::Zero, 0)]
    #[case::mirror(NegativeTimePolicy::Mirror, 6)]
    fn time_diff_negative(#[case] policy: NegativeTimePolicy, #[case] expected: u64) {
        let earlier = SignedDuration::from_nanos(10);
        let later = SignedDuration::from_nanos(4);

        assert_eq!(time_diff(later, earlier, policy), ns(expected));
    }

    #[test]
    fn time_diff_across_zero() {
        let earlier = SignedDuration::from_nanos(-4);
        let later = SignedDuration::from_nanos(6);

        assert_eq!(time_diff(later, earlier, NegativeTimePolicy::Zero), ns(10));
    }

    #[tracing_test::traced_test]
    #[test]
    fn time_diff_negative_logs_warning() {
        let _ = time_diff(SignedDuration::ZERO, SignedDuration::from_nanos(1), NegativeTimePolicy::Mirror);

        assert!(logs_contain("time.policy=Mirror"));
    }

    #[test]
    fn from_nanos_clamps_negative() {
        assert_eq!(from_nanos(-1), Duration::ZERO);
        assert_eq!(from_nanos(1_500_000_000), Duration::from_millis(1500));
    }
}
