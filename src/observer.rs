//! Injected observation hooks.
//!
//! Observers replace ad hoc print statements: the scheduler reports every
//! scheduling decision and every extraction to each registered observer,
//! synchronously and in registration order.

use crate::event::{Context, Event};

/// What just happened to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    /// The event entered the queue.
    Scheduled,
    /// The event was extracted while active and its action has run.
    Dispatched,
    /// The event was extracted while inactive and its action was skipped.
    Skipped,
}

/// Receives scheduler notifications.
///
/// Observers may inspect the event and read scheduler state, but must not
/// schedule events or register observers from inside `observe`.
pub trait EventObserver<R, C = Context> {
    fn observe(&mut self, observation: Observation, event: &Event<R, C>);
}

/// An observer backed by a closure.
impl<R, C, F> EventObserver<R, C> for F
where
    F: FnMut(Observation, &Event<R, C>),
{
    fn observe(&mut self, observation: Observation, event: &Event<R, C>) {
        (self)(observation, event);
    }
}
