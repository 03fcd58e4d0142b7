//! Logging statistics from training runs
mod display;

pub use display::DisplayLogger;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A value that can be logged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LogValue {
    /// A scalar value. Summarized by mean and standard deviation.
    Scalar(f64),
    /// An increment to a monotonic counter.
    CounterIncrement(u64),
    /// A time duration. Summarized by the mean.
    Duration(Duration),
}

impl LogValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::CounterIncrement(_) => "CounterIncrement",
            Self::Duration(_) => "Duration",
        }
    }
}

/// A value was logged under a name already used for a different kind of value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("\"{name}\": incompatible value {value:?}, expected {expected}")]
pub struct LogError {
    name: String,
    value: LogValue,
    expected: &'static str,
}

impl LogError {
    pub fn new(name: impl fmt::Display, value: LogValue, expected: &'static str) -> Self {
        Self {
            name: name.to_string(),
            value,
            expected,
        }
    }
}

/// Log statistics from a training run.
pub trait StatsLogger {
    /// Log a value under a `/`-separated name.
    ///
    /// # Errors
    /// If the value is structurally incompatible with previous values logged under the same name.
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError>;

    /// Mark the end of a group of related values (e.g. one policy update).
    fn group_end(&mut self) {}

    /// Write out any pending summaries.
    fn flush(&mut self) {}

    /// Log a scalar value.
    ///
    /// # Panics
    /// If `name` was previously used for a different kind of value.
    fn log_scalar(&mut self, name: &str, value: f64) {
        self.log(name, LogValue::Scalar(value))
            .unwrap_or_else(|err| panic!("{}", err))
    }

    /// Log an increment to a counter.
    ///
    /// # Panics
    /// If `name` was previously used for a different kind of value.
    fn log_counter_increment(&mut self, name: &str, increment: u64) {
        self.log(name, LogValue::CounterIncrement(increment))
            .unwrap_or_else(|err| panic!("{}", err))
    }

    /// Log a duration.
    ///
    /// # Panics
    /// If `name` was previously used for a different kind of value.
    fn log_duration(&mut self, name: &str, duration: Duration) {
        self.log(name, LogValue::Duration(duration))
            .unwrap_or_else(|err| panic!("{}", err))
    }
}

/// Logger that does nothing
impl StatsLogger for () {
    fn log(&mut self, _: &str, _: LogValue) -> Result<(), LogError> {
        Ok(())
    }
}

impl<L: StatsLogger + ?Sized> StatsLogger for &'_ mut L {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        L::log(self, name, value)
    }
    fn group_end(&mut self) {
        L::group_end(self)
    }
    fn flush(&mut self) {
        L::flush(self)
    }
}

impl<L: StatsLogger + ?Sized> StatsLogger for Box<L> {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        L::log(self, name, value)
    }
    fn group_end(&mut self) {
        L::group_end(self)
    }
    fn flush(&mut self) {
        L::flush(self)
    }
}
