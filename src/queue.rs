//! Pending-event priority queue.
//!
//! A `BinaryHeap` with reversed `Ord` on its entries acts as a min-heap
//! keyed by `(time, id)`. IDs are assigned in insertion order, so two
//! queues fed the same sequence of inserts always yield the same
//! extraction order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::error::SchedulerResult;
use crate::event::{Context, Event, EventId, EventIdGen};
use crate::time::SimTime;

// ── Heap entry ────────────────────────────────────────────────────────

/// The sort key is copied out of the event so the heap never has to look
/// through the shared handle while reordering.
struct QueueEntry<R, C> {
    time: SimTime,
    id: EventId,
    event: Event<R, C>,
}

/// Ordering: smallest `(time, id)` first.
///
/// `BinaryHeap` is a max-heap, so the natural ordering is reversed here.
impl<R, C> Ord for QueueEntry<R, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<R, C> PartialOrd for QueueEntry<R, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R, C> PartialEq for QueueEntry<R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl<R, C> Eq for QueueEntry<R, C> {}

// ── Queue ─────────────────────────────────────────────────────────────

/// Time-ordered queue of pending events.
///
/// Insert and extract are both O(log n).
pub struct EventQueue<R, C = Context> {
    heap: BinaryHeap<QueueEntry<R, C>>,
    id_gen: EventIdGen,
}

impl<R, C> EventQueue<R, C> {
    /// Create a new, empty queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty queue with room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        EventQueue {
            heap: BinaryHeap::with_capacity(capacity),
            id_gen: EventIdGen::new(),
        }
    }

    /// Add an event, assigning it the next insertion sequence number.
    ///
    /// Any `time` is accepted. An event that has been scheduled before is
    /// rejected so its action can never be queued twice.
    pub fn insert(&mut self, event: Event<R, C>) -> SchedulerResult<EventId> {
        let id = self.id_gen.peek();
        event.assign_id(id)?;
        self.id_gen.next_id();

        let time = event.time();
        trace!(id = id.raw(), time = time.as_f64(), "queued event");
        self.heap.push(QueueEntry { time, id, event });
        Ok(id)
    }

    /// The next event to be extracted, without removing it.
    pub fn peek_min(&self) -> Option<&Event<R, C>> {
        self.heap.peek().map(|entry| &entry.event)
    }

    /// Remove the event with the smallest `(time, id)`.
    ///
    /// Returns `None` when the queue is empty.
    pub fn extract_min(&mut self) -> Option<Event<R, C>> {
        self.heap.pop().map(|entry| entry.event)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Pending events in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Event<R, C>> {
        self.heap.iter().map(|entry| &entry.event)
    }

    /// The sequence number the next insert will receive.
    pub fn next_sequence(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Drain all events in extraction order into a `Vec`.
    pub fn drain_ordered(&mut self) -> Vec<Event<R, C>> {
        let mut events = Vec::with_capacity(self.heap.len());
        while let Some(e) = self.extract_min() {
            events.push(e);
        }
        events
    }
}

impl<R, C> Default for EventQueue<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;

    fn labelled(t: u32, label: &'static str) -> Event<&'static str> {
        Event::new(SimTime::from(t), move || label)
    }

    fn labels(events: &[Event<&'static str>]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| {
                e.execute();
                *e.result().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_fifo_at_same_time() {
        let mut queue = EventQueue::new();
        queue.insert(labelled(10, "first")).unwrap();
        queue.insert(labelled(10, "second")).unwrap();
        queue.insert(labelled(10, "third")).unwrap();

        let events = queue.drain_ordered();
        assert_eq!(labels(&events), vec!["first", "second", "third"]);
        assert!(events[0].id() < events[1].id());
        assert!(events[1].id() < events[2].id());
    }

    #[test]
    fn test_time_ordering() {
        let mut queue = EventQueue::new();
        queue.insert(labelled(30, "late")).unwrap();
        queue.insert(labelled(10, "early")).unwrap();
        queue.insert(labelled(20, "mid")).unwrap();

        assert_eq!(queue.extract_min().unwrap().time(), SimTime::from(10));
        assert_eq!(queue.extract_min().unwrap().time(), SimTime::from(20));
        assert_eq!(queue.extract_min().unwrap().time(), SimTime::from(30));
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn test_mixed_ordering() {
        let mut queue: EventQueue<()> = EventQueue::new();
        for t in [50, 10, 10, 30, 10] {
            queue.insert(Event::at(SimTime::from(t))).unwrap();
        }

        let events = queue.drain_ordered();
        for window in events.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            assert!(
                (a.time(), a.id()) <= (b.time(), b.id()),
                "events out of order: {:?} vs {:?}",
                (a.time(), a.id()),
                (b.time(), b.id())
            );
        }
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = EventQueue::new();
        let e = labelled(7, "x");
        queue.insert(e.clone()).unwrap();

        assert_eq!(queue.peek_min(), Some(&e));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.extract_min(), Some(e));
        assert!(queue.peek_min().is_none());
    }

    #[test]
    fn test_empty_queue() {
        let mut queue: EventQueue<()> = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.peek_min().is_none());
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn test_reinsert_rejected() {
        let mut queue: EventQueue<()> = EventQueue::new();
        let e = Event::at(SimTime::from(1));
        let id = queue.insert(e.clone()).unwrap();
        assert_eq!(
            queue.insert(e),
            Err(SchedulerError::AlreadyScheduled(id))
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_sequence(), EventId::new(1));
    }

    #[test]
    fn test_iter_sees_all_pending() {
        let mut queue: EventQueue<()> = EventQueue::new();
        for t in [3, 1, 2] {
            queue.insert(Event::at(SimTime::from(t))).unwrap();
        }
        let mut times: Vec<SimTime> = queue.iter().map(|e| e.time()).collect();
        times.sort();
        assert_eq!(
            times,
            vec![SimTime::from(1), SimTime::from(2), SimTime::from(3)]
        );
    }

    #[test]
    fn test_determinism_across_runs() {
        fn build() -> Vec<(SimTime, EventId)> {
            let mut queue: EventQueue<()> = EventQueue::new();
            for t in [5, 3, 5, 1, 3] {
                queue.insert(Event::at(SimTime::from(t))).unwrap();
            }
            queue
                .drain_ordered()
                .iter()
                .map(|e| (e.time(), e.id().unwrap()))
                .collect()
        }

        assert_eq!(build(), build());
    }
}
