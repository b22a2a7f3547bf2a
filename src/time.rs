//! Simulated time.
//!
//! Represents a point on the abstract simulation clock with no dependency
//! on `std::time`. Time advances only when the scheduler processes events,
//! never from wall-clock observation.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{SchedulerError, SchedulerResult};

/// A timestamp on the simulated clock.
///
/// Always finite and non-negative, which makes the underlying `f64`
/// totally ordered. `-0.0` is normalised to `0.0` on construction.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(try_from = "f64", into = "f64"))]
pub struct SimTime(f64);

impl SimTime {
    /// The zero-point of simulated time.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Create a timestamp, rejecting negative, NaN and infinite values.
    pub fn new(value: f64) -> SchedulerResult<Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(SimTime(value + 0.0))
        } else {
            Err(SchedulerError::InvalidTime { value })
        }
    }

    /// Return the raw value.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// The time `delay` units after `self`.
    ///
    /// Fails with `InvalidDelay` for a negative or non-finite delay, and
    /// with `InvalidTime` if the sum overflows to infinity.
    pub fn after(self, delay: f64) -> SchedulerResult<SimTime> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SchedulerError::InvalidDelay { delay });
        }
        SimTime::new(self.0 + delay)
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: SimTime) -> bool {
        self < other
    }

    /// Elapsed simulated time between `earlier` and `self`.
    /// Returns `None` if `earlier` is after `self`.
    pub fn duration_since(self, earlier: SimTime) -> Option<f64> {
        if earlier <= self {
            Some(self.0 - earlier.0)
        } else {
            None
        }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::ZERO
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u32> for SimTime {
    fn from(ticks: u32) -> Self {
        SimTime(f64::from(ticks))
    }
}

impl TryFrom<f64> for SimTime {
    type Error = SchedulerError;

    fn try_from(value: f64) -> SchedulerResult<Self> {
        SimTime::new(value)
    }
}

impl From<SimTime> for f64 {
    fn from(time: SimTime) -> f64 {
        time.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T={}", self.0)
    }
}
