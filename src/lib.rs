//! # Chronos — Deterministic Discrete-Event Scheduler
//!
//! A single-threaded scheduler that orders future events by simulated
//! time, breaks ties by insertion order, and records every processed event
//! in a replayable log. No async, no threads, no wall-clock time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │      EventScheduler       │ ← clock, step / run loop
//! │  ┌────────────────────┐  │
//! │  │     EventQueue      │  │ ← min-heap on (time, id)
//! │  └────────────────────┘  │
//! │  ┌────────────────────┐  │
//! │  │      EventLog       │  │ ← append-only, fingerprintable
//! │  └────────────────────┘  │
//! │  ┌────────────────────┐  │
//! │  │   EventObserver     │  │ ← injected hooks
//! │  └────────────────────┘  │
//! └──────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chronos::{Context, EventScheduler, SimTime};
//!
//! let sched = EventScheduler::new();
//! let mut ctx = Context::new();
//! ctx.insert("foo".into(), "bar".into());
//!
//! sched.timeout(10.0, || 2018, Some(ctx.clone())).unwrap();
//! let out = sched.step().unwrap().unwrap();
//!
//! assert_eq!(out.time(), SimTime::from(10));
//! assert_eq!(out.result(), Some(&2018));
//! assert_eq!(out.context(), Some(&ctx));
//! assert_eq!(sched.current_time(), SimTime::from(10));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod eventlog;
pub mod observer;
pub mod queue;
pub mod scheduler;
pub mod time;

// Re-exports for convenience.
pub use config::{PastEventPolicy, SchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use event::{Action, Context, Event, EventId, EventIdGen, EventStatus};
pub use eventlog::{logs_match, Disposition, EventLog, LogEntry, LogRecord};
pub use observer::{EventObserver, Observation};
pub use queue::EventQueue;
pub use scheduler::{EventScheduler, WeakScheduler};
pub use time::SimTime;
