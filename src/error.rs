//! Structured error types for the scheduler.
//!
//! All fallible public APIs return `Result<T, SchedulerError>`. Contract
//! violations (negative delays, scheduling in the past, re-entrant steps)
//! surface immediately to the caller instead of being clamped or ignored.

use crate::event::EventId;
use crate::time::SimTime;

/// The top-level error type for the scheduler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    // ── Scheduling errors ─────────────────────────────────

    /// A `timeout` delay was negative, NaN or infinite.
    #[error("invalid delay {delay}: delays must be finite and non-negative")]
    InvalidDelay { delay: f64 },

    /// A timestamp was negative, NaN or infinite.
    #[error("invalid simulated time {value}: times must be finite and non-negative")]
    InvalidTime { value: f64 },

    /// Attempted to schedule an event before the current time.
    #[error("cannot schedule event at {requested} when current time is {current}")]
    NonCausalEvent {
        requested: SimTime,
        current: SimTime,
    },

    /// The event is already sitting in (or has passed through) a queue.
    #[error("event {0} has already been scheduled")]
    AlreadyScheduled(EventId),

    // ── Execution errors ──────────────────────────────────

    /// `step()` was called from inside an action on the same scheduler.
    #[error("re-entrant step: a step is already in progress on this scheduler")]
    ReentrantStep,

    /// A weak scheduler handle outlived its scheduler.
    #[error("the scheduler behind this handle has been dropped")]
    SchedulerDropped,
}

/// Convenience alias for `Result<T, SchedulerError>`.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
