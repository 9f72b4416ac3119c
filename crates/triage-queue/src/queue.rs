//! # Priority Queue
//!
//! One FIFO bucket per severity level behind a single `parking_lot`
//! mutex. The lock covers the buckets, the clock read, id assignment, and
//! the sequence counter, so every operation observes and produces a
//! consistent state.
//!
//! ## Invariants
//!
//! - Each bucket is sorted by `(arrival, sequence)`.
//! - `sequence` strictly increases across all enqueues of one queue.
//! - Service order equals [`PriorityQueue::snapshot`] order.
//!
//! Absent results are `None`; the queue has no error path.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use triage_core::{SeverityLevel, SEVERITY_LEVEL_COUNT};

use crate::clock::{Clock, IdGenerator, MonotonicClock, SequentialIds, TicketId};
use crate::ticket::Ticket;

struct Inner<P> {
    buckets: [VecDeque<Ticket<P>>; SEVERITY_LEVEL_COUNT],
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    next_sequence: u64,
}

impl<P> Inner<P> {
    /// Buckets from most to least severe.
    fn in_service_order(&self) -> impl Iterator<Item = &Ticket<P>> {
        SeverityLevel::descending().flat_map(move |l| self.buckets[l.rank()].iter())
    }

    fn locate(&self, id: TicketId) -> Option<(SeverityLevel, usize)> {
        SeverityLevel::descending().find_map(|l| {
            self.buckets[l.rank()]
                .iter()
                .position(|t| t.id == id)
                .map(|idx| (l, idx))
        })
    }
}

/// Thread-safe, cloneable severity queue. Clones share the same state.
pub struct PriorityQueue<P> {
    inner: Arc<Mutex<Inner<P>>>,
}

impl<P> Clone for PriorityQueue<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Clone + Send> Default for PriorityQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + Send> PriorityQueue<P> {
    /// Queue over a [`MonotonicClock`] and ids counting from 1.
    pub fn new() -> Self {
        Self::with_sources(Arc::new(MonotonicClock::new()), Box::new(SequentialIds::default()))
    }

    /// Queue over injected time and id sources.
    pub fn with_sources(clock: Arc<dyn Clock>, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                buckets: Default::default(),
                clock,
                ids,
                next_sequence: 0,
            })),
        }
    }

    /// Add a case. Always succeeds.
    pub fn enqueue(&self, severity: SeverityLevel, payload: P) -> Ticket<P> {
        let mut inner = self.inner.lock();
        let arrival = inner.clock.now();
        let id = inner.ids.next_id();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let ticket = Ticket {
            id,
            severity,
            arrival,
            sequence,
            enqueued_at: Utc::now(),
            payload,
        };
        let bucket = &mut inner.buckets[severity.rank()];
        let key = ticket.fifo_key();
        let at = bucket.partition_point(|t| t.fifo_key() <= key);
        bucket.insert(at, ticket.clone());
        drop(inner);

        tracing::info!(ticket = %id, severity = %severity, sequence, "ticket enqueued");
        ticket
    }

    /// Remove and return the next case: the most severe non-empty bucket,
    /// earliest `(arrival, sequence)` within it.
    pub fn serve_next(&self) -> Option<Ticket<P>> {
        let mut inner = self.inner.lock();
        let ticket = SeverityLevel::descending()
            .find_map(|l| inner.buckets[l.rank()].pop_front())?;
        drop(inner);

        tracing::info!(ticket = %ticket.id, severity = %ticket.severity, "ticket served");
        Some(ticket)
    }

    /// 1-based position of `id` in service order.
    pub fn position(&self, id: TicketId) -> Option<usize> {
        let inner = self.inner.lock();
        let position = inner
            .in_service_order()
            .position(|t| t.id == id)
            .map(|idx| idx + 1);
        position
    }

    /// Withdraw a case. `None` when `id` is not queued.
    pub fn remove(&self, id: TicketId) -> Option<Ticket<P>> {
        let mut inner = self.inner.lock();
        let Some((level, idx)) = inner.locate(id) else {
            tracing::debug!(ticket = %id, "remove: ticket not queued");
            return None;
        };
        let ticket = inner.buckets[level.rank()].remove(idx);
        drop(inner);

        if let Some(t) = &ticket {
            tracing::info!(ticket = %t.id, severity = %t.severity, "ticket removed");
        }
        ticket
    }

    /// Every queued case in service order.
    pub fn snapshot(&self) -> Vec<Ticket<P>> {
        self.inner.lock().in_service_order().cloned().collect()
    }

    /// Number of queued cases.
    pub fn size(&self) -> usize {
        self.inner.lock().buckets.iter().map(VecDeque::len).sum()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Queued cases per level, every level present.
    pub fn counts(&self) -> BTreeMap<SeverityLevel, usize> {
        let inner = self.inner.lock();
        let counts = SeverityLevel::ALL
            .into_iter()
            .map(|l| (l, inner.buckets[l.rank()].len()))
            .collect();
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ArrivalTime;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use SeverityLevel::*;

    /// Returns a fixed list of stamps, then repeats the last one.
    struct Scripted {
        stamps: Vec<u64>,
        next: AtomicU64,
    }

    impl Scripted {
        fn new(stamps: &[u64]) -> Arc<Self> {
            Arc::new(Self {
                stamps: stamps.to_vec(),
                next: AtomicU64::new(0),
            })
        }
    }

    impl Clock for Scripted {
        fn now(&self) -> ArrivalTime {
            let i = self.next.fetch_add(1, Ordering::SeqCst) as usize;
            let stamp = self
                .stamps
                .get(i)
                .or(self.stamps.last())
                .copied()
                .unwrap_or(0);
            ArrivalTime::from_nanos(stamp)
        }
    }

    fn scripted(stamps: &[u64]) -> PriorityQueue<&'static str> {
        PriorityQueue::with_sources(Scripted::new(stamps), Box::new(SequentialIds::default()))
    }

    fn ids<P>(tickets: &[Ticket<P>]) -> Vec<u64> {
        tickets.iter().map(|t| t.id.get()).collect()
    }

    #[test]
    fn test_empty_queue() {
        let q: PriorityQueue<()> = PriorityQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.serve_next(), None);
        assert!(q.snapshot().is_empty());
        assert_eq!(q.counts().values().sum::<usize>(), 0);
        assert_eq!(q.counts().len(), 4);
    }

    #[test]
    fn test_severity_then_arrival() {
        let q = scripted(&[1, 2, 3]);
        q.enqueue(Green, "a");
        q.enqueue(Red, "b");
        q.enqueue(Green, "c");
        let snap = q.snapshot();
        assert_eq!(snap.iter().map(|t| t.payload).collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(
            snap.iter().map(|t| t.arrival.as_nanos()).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn test_equal_arrival_ordered_by_sequence() {
        let q = scripted(&[5, 5, 5]);
        let a = q.enqueue(Yellow, "a");
        let b = q.enqueue(Yellow, "b");
        assert!(a.sequence < b.sequence);
        let first = q.snapshot();
        assert_eq!(ids(&first), vec![1, 2]);
        assert_eq!(q.snapshot(), first);
    }

    #[test]
    fn test_out_of_order_clock_still_fifo_by_arrival() {
        // An injected clock that goes backwards: the earlier stamp is
        // served first regardless of enqueue order.
        let q = scripted(&[10, 4]);
        q.enqueue(White, "late-stamp");
        q.enqueue(White, "early-stamp");
        assert_eq!(q.serve_next().map(|t| t.payload), Some("early-stamp"));
        assert_eq!(q.serve_next().map(|t| t.payload), Some("late-stamp"));
    }

    #[test]
    fn test_position_and_remove() {
        let q = scripted(&[1, 2, 3]);
        let a = q.enqueue(Green, "a");
        let b = q.enqueue(Yellow, "b");
        let c = q.enqueue(Green, "c");
        assert_eq!(q.position(b.id), Some(1));
        assert_eq!(q.position(a.id), Some(2));
        assert_eq!(q.position(c.id), Some(3));

        let removed = q.remove(a.id).unwrap();
        assert_eq!(removed.payload, "a");
        assert_eq!(q.position(c.id), Some(2));
        assert_eq!(q.position(a.id), None);
        assert_eq!(q.size(), 2);
    }

    #[test]
    fn test_remove_absent_is_none() {
        let q = scripted(&[1]);
        q.enqueue(Red, "a");
        assert_eq!(q.remove(TicketId::new(999)), None);
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn test_counts() {
        let q = scripted(&[1]);
        q.enqueue(Red, "a");
        q.enqueue(Red, "b");
        q.enqueue(White, "c");
        let counts = q.counts();
        assert_eq!(counts[&Red], 2);
        assert_eq!(counts[&Yellow], 0);
        assert_eq!(counts[&White], 1);
    }

    #[test]
    fn test_clones_share_state() {
        let q = scripted(&[1]);
        let other = q.clone();
        q.enqueue(Red, "a");
        assert_eq!(other.size(), 1);
    }

    #[test]
    fn test_concurrent_enqueue_unique_sequences() {
        let q: PriorityQueue<usize> = PriorityQueue::new();
        let handles: Vec<_> = (0..8)
            .map(|w| {
                let q = q.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        q.enqueue(SeverityLevel::ALL[(w + i) % 4], w * 1000 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = q.snapshot();
        assert_eq!(snap.len(), 800);
        let mut seqs: Vec<u64> = snap.iter().map(|t| t.sequence).collect();
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 800);
        assert!(snap.windows(2).all(|w| w[0].order_key() < w[1].order_key()));
    }

    #[test]
    fn test_ticket_serializes() {
        let q = scripted(&[3]);
        let t = q.enqueue(Red, "x");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["severity"], "red");
        assert_eq!(json["arrival"], 3);
    }

    fn any_level() -> impl Strategy<Value = SeverityLevel> {
        (0usize..4).prop_map(|r| SeverityLevel::ALL[r])
    }

    proptest! {
        #[test]
        fn prop_serve_order_equals_initial_snapshot(
            entries in prop::collection::vec((any_level(), 0u64..20), 0..60)
        ) {
            let stamps: Vec<u64> = entries.iter().map(|(_, s)| *s).collect();
            let q: PriorityQueue<usize> =
                PriorityQueue::with_sources(Scripted::new(&stamps), Box::new(SequentialIds::default()));
            for (i, (level, _)) in entries.iter().enumerate() {
                q.enqueue(*level, i);
            }
            let snapshot = q.snapshot();
            prop_assert_eq!(q.snapshot(), snapshot.clone());

            let mut served = Vec::new();
            while let Some(t) = q.serve_next() {
                served.push(t);
            }
            prop_assert_eq!(served, snapshot);
            prop_assert!(q.is_empty());
        }

        #[test]
        fn prop_serve_next_takes_bucket_minimum(
            entries in prop::collection::vec((any_level(), 0u64..5), 1..40)
        ) {
            let stamps: Vec<u64> = entries.iter().map(|(_, s)| *s).collect();
            let q: PriorityQueue<usize> =
                PriorityQueue::with_sources(Scripted::new(&stamps), Box::new(SequentialIds::default()));
            for (i, (level, _)) in entries.iter().enumerate() {
                q.enqueue(*level, i);
            }
            let before = q.snapshot();
            let served = q.serve_next().unwrap();
            let top = before.iter().map(|t| t.severity).max().unwrap();
            prop_assert_eq!(served.severity, top);
            let min_key = before
                .iter()
                .filter(|t| t.severity == top)
                .map(|t| (t.arrival, t.sequence))
                .min()
                .unwrap();
            prop_assert_eq!((served.arrival, served.sequence), min_key);
        }
    }
}
