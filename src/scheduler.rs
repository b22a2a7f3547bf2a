//! Simulation driver.
//!
//! `EventScheduler` owns the simulated clock, the pending-event queue and
//! the execution log. `step` pops one event, advances the clock, logs the
//! event and runs its action. Everything is synchronous and single-threaded.
//!
//! The scheduler is a cheap, cloneable handle. Actions schedule follow-up
//! events through a captured handle (preferably a [`WeakScheduler`], so a
//! pending action does not keep its own scheduler alive). Calling `step`
//! from inside an action fails with `ReentrantStep`.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::{PastEventPolicy, SchedulerConfig};
use crate::error::{SchedulerError, SchedulerResult};
use crate::event::{Context, Event, EventId};
use crate::eventlog::{Disposition, EventLog};
use crate::observer::{EventObserver, Observation};
use crate::queue::EventQueue;
use crate::time::SimTime;

// ── Internal state ────────────────────────────────────────────────────

struct State<R, C> {
    queue: EventQueue<R, C>,
    log: EventLog<R, C>,
    current_time: SimTime,
    events_processed: u64,
    config: SchedulerConfig,
}

struct Shared<R, C> {
    state: RefCell<State<R, C>>,
    observers: RefCell<Vec<Box<dyn EventObserver<R, C>>>>,
    stepping: Cell<bool>,
}

/// Marks a step in progress; clears the mark on drop, including when an
/// action panics.
struct StepGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> StepGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> SchedulerResult<Self> {
        if flag.replace(true) {
            warn!("rejected re-entrant step");
            return Err(SchedulerError::ReentrantStep);
        }
        Ok(StepGuard { flag })
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

// ── EventScheduler ────────────────────────────────────────────────────

/// Top-level discrete-event scheduler.
///
/// Starts at time zero with an empty queue and an empty log. Clones share
/// the same simulation.
pub struct EventScheduler<R, C = Context> {
    shared: Rc<Shared<R, C>>,
}

impl<R> EventScheduler<R, Context> {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::configured(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::configured(config)
    }
}

impl<R, C> EventScheduler<R, C> {
    /// Create a scheduler for a caller-defined context type.
    pub fn configured(config: SchedulerConfig) -> Self {
        let state = State {
            queue: EventQueue::with_capacity(config.queue_capacity),
            log: EventLog::new(),
            current_time: SimTime::ZERO,
            events_processed: 0,
            config,
        };
        EventScheduler {
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                observers: RefCell::new(Vec::new()),
                stepping: Cell::new(false),
            }),
        }
    }

    /// A handle that does not keep the scheduler alive.
    pub fn downgrade(&self) -> WeakScheduler<R, C> {
        WeakScheduler {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn add_observer(&self, observer: impl EventObserver<R, C> + 'static) {
        self.shared.observers.borrow_mut().push(Box::new(observer));
    }

    // ── Accessors ─────────────────────────────────────────────────

    /// Current simulated time.
    pub fn current_time(&self) -> SimTime {
        self.shared.state.borrow().current_time
    }

    /// Total events extracted so far, executed or skipped.
    pub fn events_processed(&self) -> u64 {
        self.shared.state.borrow().events_processed
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.state.borrow().config
    }

    /// Number of pending events.
    pub fn pending_count(&self) -> usize {
        self.shared.state.borrow().queue.len()
    }

    /// Returns `true` if there are no more events to process.
    pub fn is_finished(&self) -> bool {
        self.shared.state.borrow().queue.is_empty()
    }

    /// The event the next `step` will extract.
    pub fn peek_next(&self) -> Option<Event<R, C>> {
        self.shared.state.borrow().queue.peek_min().cloned()
    }

    /// Read-only view of the pending queue.
    ///
    /// The returned guard must be released before the next call that
    /// mutates the scheduler.
    pub fn event_queue(&self) -> Ref<'_, EventQueue<R, C>> {
        Ref::map(self.shared.state.borrow(), |state| &state.queue)
    }

    /// Read-only view of the execution log, in extraction order.
    ///
    /// The returned guard must be released before the next call that
    /// mutates the scheduler.
    pub fn event_log(&self) -> Ref<'_, EventLog<R, C>> {
        Ref::map(self.shared.state.borrow(), |state| &state.log)
    }

    // ── Scheduling ────────────────────────────────────────────────

    /// Schedule `action` to run `delay` units after the current time.
    ///
    /// Returns the event handle so the caller can deactivate it later.
    /// Fails with `InvalidDelay` if `delay` is negative or not finite.
    pub fn timeout(
        &self,
        delay: f64,
        action: impl FnOnce() -> R + 'static,
        context: Option<C>,
    ) -> SchedulerResult<Event<R, C>> {
        let time = self.current_time().after(delay).inspect_err(|err| {
            warn!(delay, error = %err, "rejected timeout");
        })?;
        let event = Event::from_parts(time, Some(Box::new(action)), context);
        self.enqueue(&event)?;
        Ok(event)
    }

    /// Schedule `action` at an absolute simulated time.
    pub fn schedule_at(
        &self,
        time: SimTime,
        action: impl FnOnce() -> R + 'static,
        context: Option<C>,
    ) -> SchedulerResult<Event<R, C>> {
        let event = Event::from_parts(time, Some(Box::new(action)), context);
        self.enqueue(&event)?;
        Ok(event)
    }

    /// Insert a standalone event.
    pub fn schedule(&self, event: &Event<R, C>) -> SchedulerResult<EventId> {
        self.enqueue(event)
    }

    fn enqueue(&self, event: &Event<R, C>) -> SchedulerResult<EventId> {
        let id = {
            let mut state = self.shared.state.borrow_mut();
            let current = state.current_time;
            if event.time() < current {
                match state.config.past_events {
                    PastEventPolicy::Reject => {
                        warn!(
                            requested = event.time().as_f64(),
                            current = current.as_f64(),
                            "rejected past-dated event"
                        );
                        return Err(SchedulerError::NonCausalEvent {
                            requested: event.time(),
                            current,
                        });
                    }
                    PastEventPolicy::Allow => {
                        debug!(
                            requested = event.time().as_f64(),
                            current = current.as_f64(),
                            "accepted past-dated event"
                        );
                    }
                }
            }
            state.queue.insert(event.clone())?
        };

        debug!(id = id.raw(), time = event.time().as_f64(), "scheduled event");
        self.notify(Observation::Scheduled, event);
        Ok(id)
    }

    // ── Execution ─────────────────────────────────────────────────

    /// Execute a single step: extract the next event, advance the clock,
    /// log the event, then run its action if it is active.
    ///
    /// Returns `Ok(None)` when the queue is empty; the clock is untouched.
    /// The event is logged before its action runs, so a panicking action
    /// leaves it in the log with no result. Panics are not caught.
    pub fn step(&self) -> SchedulerResult<Option<Event<R, C>>> {
        let _guard = StepGuard::enter(&self.shared.stepping)?;

        let (event, disposition) = {
            let mut state = self.shared.state.borrow_mut();
            let Some(event) = state.queue.extract_min() else {
                return Ok(None);
            };
            // Past-dated events (allowed by config) never pull the clock back.
            if state.current_time < event.time() {
                state.current_time = event.time();
            }
            state.events_processed += 1;

            let disposition = if event.is_active() {
                Disposition::Dispatched
            } else {
                Disposition::Skipped
            };
            state.log.record(event.clone(), disposition);
            (event, disposition)
        };

        let id = event.id().map(EventId::raw);
        match disposition {
            Disposition::Dispatched => {
                debug!(id, time = event.time().as_f64(), "dispatching event");
                event.execute();
                self.notify(Observation::Dispatched, &event);
            }
            Disposition::Skipped => {
                trace!(id, time = event.time().as_f64(), "skipped inactive event");
                self.notify(Observation::Skipped, &event);
            }
        }

        Ok(Some(event))
    }

    /// Step while the next event's time is at or before `stop_time`.
    ///
    /// Returns the number of events processed in this call.
    pub fn run_until(&self, stop_time: SimTime) -> SchedulerResult<u64> {
        self.ensure_not_stepping()?;
        let mut processed = 0u64;
        while self
            .peek_next()
            .is_some_and(|next| next.time() <= stop_time)
        {
            self.step()?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Step until the queue is empty.
    ///
    /// Returns the number of events processed in this call.
    pub fn run_until_empty(&self) -> SchedulerResult<u64> {
        self.ensure_not_stepping()?;
        let mut processed = 0u64;
        while self.step()?.is_some() {
            processed += 1;
        }
        Ok(processed)
    }

    /// Step until the queue is empty **or** `max_steps` events have been
    /// extracted, whichever comes first.
    pub fn run_for(&self, max_steps: u64) -> SchedulerResult<u64> {
        self.ensure_not_stepping()?;
        let mut processed = 0u64;
        while processed < max_steps {
            if self.step()?.is_none() {
                break;
            }
            processed += 1;
        }
        Ok(processed)
    }

    fn ensure_not_stepping(&self) -> SchedulerResult<()> {
        if self.shared.stepping.get() {
            warn!("rejected re-entrant run");
            return Err(SchedulerError::ReentrantStep);
        }
        Ok(())
    }

    fn notify(&self, observation: Observation, event: &Event<R, C>) {
        let mut observers = self.shared.observers.borrow_mut();
        for observer in observers.iter_mut() {
            observer.observe(observation, event);
        }
    }
}

impl<R, C> Clone for EventScheduler<R, C> {
    fn clone(&self) -> Self {
        EventScheduler {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<R, C> Default for EventScheduler<R, C> {
    fn default() -> Self {
        Self::configured(SchedulerConfig::default())
    }
}

impl<R, C> fmt::Debug for EventScheduler<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("EventScheduler")
            .field("current_time", &state.current_time)
            .field("pending", &state.queue.len())
            .field("logged", &state.log.len())
            .field("events_processed", &state.events_processed)
            .finish()
    }
}

// ── WeakScheduler ─────────────────────────────────────────────────────

/// Non-owning scheduler handle, for capture inside actions.
pub struct WeakScheduler<R, C = Context> {
    shared: Weak<Shared<R, C>>,
}

impl<R, C> WeakScheduler<R, C> {
    pub fn upgrade(&self) -> Option<EventScheduler<R, C>> {
        self.shared
            .upgrade()
            .map(|shared| EventScheduler { shared })
    }

    /// [`EventScheduler::timeout`] through the weak handle.
    ///
    /// Fails with `SchedulerDropped` if the scheduler no longer exists.
    pub fn timeout(
        &self,
        delay: f64,
        action: impl FnOnce() -> R + 'static,
        context: Option<C>,
    ) -> SchedulerResult<Event<R, C>> {
        self.upgrade()
            .ok_or(SchedulerError::SchedulerDropped)?
            .timeout(delay, action, context)
    }

    pub fn current_time(&self) -> SchedulerResult<SimTime> {
        self.upgrade()
            .map(|sched| sched.current_time())
            .ok_or(SchedulerError::SchedulerDropped)
    }
}

impl<R, C> Clone for WeakScheduler<R, C> {
    fn clone(&self) -> Self {
        WeakScheduler {
            shared: Weak::clone(&self.shared),
        }
    }
}
