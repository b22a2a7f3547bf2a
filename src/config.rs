//! Scheduler configuration.
//!
//! [`SchedulerConfig`] is the construction-time input for
//! [`EventScheduler::with_config`](crate::EventScheduler::with_config) and
//! [`EventScheduler::configured`](crate::EventScheduler::configured).
//! There are no config files or environment variables; surrounding
//! application code builds this value however it likes.

// ── PastEventPolicy ───────────────────────────────────────────────────

/// What to do with an event whose absolute time is before the current
/// simulated time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PastEventPolicy {
    /// Fail with `NonCausalEvent`. Default.
    #[default]
    Reject,
    /// Accept the event. It runs on the next step without moving the clock
    /// backwards.
    Allow,
}

// ── SchedulerConfig ───────────────────────────────────────────────────

/// Configuration for an [`EventScheduler`](crate::EventScheduler).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Handling of past-dated absolute scheduling. Default: `Reject`.
    pub past_events: PastEventPolicy,
    /// Initial capacity of the pending-event heap. Default: 0.
    pub queue_capacity: usize,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_past_events(mut self, policy: PastEventPolicy) -> Self {
        self.past_events = policy;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
