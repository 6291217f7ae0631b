// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

/// The result type for fallible clock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised by a clock or a clock registry.
///
/// Two kinds of errors exist:
///
/// * Configuration errors: a period that is not positive, a duty cycle outside `[0, 1]`, or a
///   landmark offset that does not fall within one period. They are raised by the operation that
///   would have applied the configuration, which leaves the clock untouched.
/// * Usage errors: writing a value to a clock, looking up a clock that was never registered, or
///   resetting a clock whose reset policy rejects resets. They point at a mistake in the calling
///   model rather than at a recoverable condition.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lazy_clock::ClockConfig;
/// use sim_tick::Kernel;
///
/// let error = ClockConfig::new(Duration::ZERO)
///     .build("clk", &Kernel::new())
///     .unwrap_err();
///
/// assert!(error.is_configuration());
/// ```
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(ErrorKind);

#[derive(Debug, thiserror::Error)]
enum ErrorKind {
    #[error("invalid clock configuration: {0}")]
    Configuration(Cow<'static, str>),

    #[error("invalid clock usage: {0}")]
    Usage(Cow<'static, str>),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self(ErrorKind::Configuration(message.into()))
    }

    pub(crate) fn usage(message: impl Into<Cow<'static, str>>) -> Self {
        Self(ErrorKind::Usage(message.into()))
    }

    /// Returns `true` if the error was caused by an invalid clock configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.0, ErrorKind::Configuration(_))
    }

    /// Returns `true` if the error was caused by using a clock in a way it does not support.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self.0, ErrorKind::Usage(_))
    }
}
