//! Append-only execution log.
//!
//! Records every event the scheduler extracts, in extraction order,
//! whether it ran or was skipped. `trace()` reduces the log to plain
//! records, and `fingerprint()` reduces those to a hash, so two runs can
//! be compared for deterministic replay.

use std::fmt;

use crate::event::{Context, Event, EventId};
use crate::time::SimTime;

// ── Hash utility ──────────────────────────────────────────────────────

/// Combine two u64 hashes deterministically.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a;
    h = h.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

// ── Disposition ───────────────────────────────────────────────────────

/// What the scheduler did with an extracted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Disposition {
    /// The event was active and its action was invoked.
    Dispatched,
    /// The event was inactive; its action was not invoked.
    Skipped,
}

impl Disposition {
    fn code(self) -> u64 {
        match self {
            Disposition::Dispatched => 1,
            Disposition::Skipped => 2,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Dispatched => write!(f, "dispatched"),
            Disposition::Skipped => write!(f, "skipped"),
        }
    }
}

// ── Entries ───────────────────────────────────────────────────────────

/// One extracted event and what happened to it.
pub struct LogEntry<R, C = Context> {
    pub event: Event<R, C>,
    pub disposition: Disposition,
}

impl<R, C> Clone for LogEntry<R, C> {
    fn clone(&self) -> Self {
        LogEntry {
            event: self.event.clone(),
            disposition: self.disposition,
        }
    }
}

impl<R: fmt::Debug, C: fmt::Debug> fmt::Debug for LogEntry<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("event", &self.event)
            .field("disposition", &self.disposition)
            .finish()
    }
}

/// A value snapshot of one log entry, detached from the event handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LogRecord {
    pub id: Option<EventId>,
    pub time: SimTime,
    pub disposition: Disposition,
}

// ── Event Log ─────────────────────────────────────────────────────────

/// Append-only log of extracted events.
pub struct EventLog<R, C = Context> {
    entries: Vec<LogEntry<R, C>>,
}

impl<R, C> EventLog<R, C> {
    /// Create an empty event log.
    pub fn new() -> Self {
        EventLog {
            entries: Vec::new(),
        }
    }

    /// Append an extracted event. Entries are never removed or reordered.
    pub fn record(&mut self, event: Event<R, C>, disposition: Disposition) {
        self.entries.push(LogEntry { event, disposition });
    }

    /// Access the recorded entries in extraction order.
    pub fn entries(&self) -> &[LogEntry<R, C>] {
        &self.entries
    }

    /// The recorded events in extraction order.
    pub fn events(&self) -> impl Iterator<Item = &Event<R, C>> {
        self.entries.iter().map(|entry| &entry.event)
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry<R, C>> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&LogEntry<R, C>> {
        self.entries.last()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this exact event (by identity) has been recorded.
    pub fn contains(&self, event: &Event<R, C>) -> bool {
        self.events().any(|e| e.ptr_eq(event))
    }

    /// Plain records for every entry, in order.
    pub fn trace(&self) -> Vec<LogRecord> {
        self.entries
            .iter()
            .map(|entry| LogRecord {
                id: entry.event.id(),
                time: entry.event.time(),
                disposition: entry.disposition,
            })
            .collect()
    }

    /// Compute a deterministic hash of the entire log.
    ///
    /// Covers IDs, times and dispositions; action results are opaque and
    /// not included.
    pub fn fingerprint(&self) -> u64 {
        self.trace().iter().fold(0u64, |h, record| {
            let h = hash_combine(h, record.id.map_or(u64::MAX, EventId::raw));
            let h = hash_combine(h, record.time.as_f64().to_bits());
            hash_combine(h, record.disposition.code())
        })
    }
}

impl<R, C> Default for EventLog<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: fmt::Debug, C: fmt::Debug> fmt::Debug for EventLog<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

// ── Verification ──────────────────────────────────────────────────────

/// Compare two logs for identical extraction order, times and dispositions.
pub fn logs_match<R1, C1, R2, C2>(a: &EventLog<R1, C1>, b: &EventLog<R2, C2>) -> bool {
    a.trace() == b.trace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;

    fn extracted(times: &[u32]) -> Vec<Event<u32>> {
        let mut queue = EventQueue::new();
        for &t in times {
            queue.insert(Event::new(SimTime::from(t), move || t)).unwrap();
        }
        queue.drain_ordered()
    }

    fn build_log(times: &[u32]) -> EventLog<u32> {
        let mut log = EventLog::new();
        for event in extracted(times) {
            log.record(event, Disposition::Dispatched);
        }
        log
    }

    #[test]
    fn test_record_preserves_order() {
        let log = build_log(&[3, 1, 2]);
        let times: Vec<SimTime> = log.events().map(|e| e.time()).collect();
        assert_eq!(
            times,
            vec![SimTime::from(1), SimTime::from(2), SimTime::from(3)]
        );
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().unwrap().event.time(), SimTime::from(3));
    }

    #[test]
    fn test_contains_uses_identity() {
        let events = extracted(&[1, 1]);
        let mut log = EventLog::new();
        log.record(events[0].clone(), Disposition::Skipped);

        assert!(log.contains(&events[0]));
        assert!(!log.contains(&events[1]));
        assert_eq!(log.get(0).unwrap().disposition, Disposition::Skipped);
    }

    #[test]
    fn test_trace_records() {
        let log = build_log(&[4]);
        assert_eq!(
            log.trace(),
            vec![LogRecord {
                id: Some(EventId::new(0)),
                time: SimTime::from(4),
                disposition: Disposition::Dispatched,
            }]
        );
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = build_log(&[5, 3, 5, 1]);
        let b = build_log(&[5, 3, 5, 1]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(logs_match(&a, &b));
    }

    #[test]
    fn test_fingerprint_detects_divergence() {
        let a = build_log(&[1, 2]);
        let b = build_log(&[1, 3]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(!logs_match(&a, &b));

        let mut c = EventLog::new();
        for event in extracted(&[1, 2]) {
            c.record(event, Disposition::Skipped);
        }
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_empty_log() {
        let log: EventLog<()> = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.fingerprint(), 0);
        assert!(log.trace().is_empty());
    }
}
