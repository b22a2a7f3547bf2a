//! Events: the atomic unit of work on the simulated clock.
//!
//! An `Event` is a shared handle. The copy held by the caller and the copy
//! held by the queue refer to the same record, so a caller can deactivate
//! an event after scheduling it and observe its result once it has run.
//! Only `status` and `result` change after creation.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{SchedulerError, SchedulerResult};
use crate::time::SimTime;

/// Default context payload: an opaque string key/value map.
pub type Context = BTreeMap<String, String>;

/// A deferred zero-argument computation.
pub type Action<R> = Box<dyn FnOnce() -> R>;

// ── Event ID ──────────────────────────────────────────────────────────

/// Insertion sequence number of a scheduled event.
///
/// Strictly increasing per queue, so it breaks ties between events that
/// share the same `SimTime`: the event inserted first has the smaller ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw u64 into an `EventId`.
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Deterministic, strictly-increasing ID generator. One per queue.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Status ────────────────────────────────────────────────────────────

/// Whether an event will run when its turn comes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum EventStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Active => write!(f, "ACTIVE"),
            EventStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

struct EventInner<R, C> {
    time: SimTime,
    context: Option<C>,
    action: RefCell<Option<Action<R>>>,
    status: Cell<EventStatus>,
    id: Cell<Option<EventId>>,
    executed: Cell<bool>,
    result: OnceCell<R>,
}

/// A single scheduled occurrence.
///
/// Cloning an `Event` clones the handle, not the record. Equality is
/// identity: two handles are equal only if they point at the same record.
pub struct Event<R, C = Context> {
    inner: Rc<EventInner<R, C>>,
}

impl<R, C> Event<R, C> {
    /// An active event at `time` that runs `action`.
    pub fn new(time: SimTime, action: impl FnOnce() -> R + 'static) -> Self {
        Self::from_parts(time, Some(Box::new(action)), None)
    }

    /// Like [`Event::new`], carrying a caller-defined context payload.
    pub fn with_context(
        time: SimTime,
        action: impl FnOnce() -> R + 'static,
        context: C,
    ) -> Self {
        Self::from_parts(time, Some(Box::new(action)), Some(context))
    }

    /// An active event at `time` with no action. It runs as a no-op and
    /// never produces a result.
    pub fn at(time: SimTime) -> Self {
        Self::from_parts(time, None, None)
    }

    pub(crate) fn from_parts(
        time: SimTime,
        action: Option<Action<R>>,
        context: Option<C>,
    ) -> Self {
        Event {
            inner: Rc::new(EventInner {
                time,
                context,
                action: RefCell::new(action),
                status: Cell::new(EventStatus::Active),
                id: Cell::new(None),
                executed: Cell::new(false),
                result: OnceCell::new(),
            }),
        }
    }

    /// Insertion sequence number, or `None` if never scheduled.
    pub fn id(&self) -> Option<EventId> {
        self.inner.id.get()
    }

    /// The simulated time at which this event fires.
    pub fn time(&self) -> SimTime {
        self.inner.time
    }

    /// The caller-supplied payload, unchanged.
    pub fn context(&self) -> Option<&C> {
        self.inner.context.as_ref()
    }

    pub fn status(&self) -> EventStatus {
        self.inner.status.get()
    }

    pub fn is_active(&self) -> bool {
        self.status() == EventStatus::Active
    }

    /// Make the event eligible to run. Idempotent.
    pub fn activate(&self) {
        self.inner.status.set(EventStatus::Active);
    }

    /// Cancel pending execution. The event stays queued and is still
    /// logged when extracted. Idempotent and reversible via `activate`.
    pub fn deactivate(&self) {
        self.inner.status.set(EventStatus::Inactive);
    }

    pub fn set_status(&self, status: EventStatus) {
        self.inner.status.set(status);
    }

    /// The action's return value, once it has run.
    pub fn result(&self) -> Option<&R> {
        self.inner.result.get()
    }

    /// Whether the event was extracted while active and its action ran to
    /// completion.
    pub fn has_executed(&self) -> bool {
        self.inner.executed.get()
    }

    /// Returns `true` if both handles refer to the same event.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn assign_id(&self, id: EventId) -> SchedulerResult<()> {
        if let Some(existing) = self.inner.id.get() {
            return Err(SchedulerError::AlreadyScheduled(existing));
        }
        self.inner.id.set(Some(id));
        Ok(())
    }

    /// Run the action, if any, and store its value.
    ///
    /// The action is taken out before it is called so that it can freely
    /// touch this handle (or the scheduler) while running.
    pub(crate) fn execute(&self) {
        let action = self.inner.action.borrow_mut().take();
        if let Some(action) = action {
            let value = action();
            // Actions are taken exactly once, so the cell is still empty.
            let _ = self.inner.result.set(value);
        }
        self.inner.executed.set(true);
    }
}

impl<R, C> Clone for Event<R, C> {
    fn clone(&self) -> Self {
        Event {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R, C> PartialEq for Event<R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<R, C> Eq for Event<R, C> {}

impl<R: fmt::Debug, C: fmt::Debug> fmt::Debug for Event<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id())
            .field("time", &self.time())
            .field("status", &self.status())
            .field("context", &self.context())
            .field("result", &self.result())
            .finish()
    }
}
