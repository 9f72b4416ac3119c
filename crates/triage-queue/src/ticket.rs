//! # Tickets
//!
//! A [`Ticket`] is one queued case: its severity bucket, the arrival stamp
//! and sequence number that order it within the bucket, and the caller's
//! payload.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;

use triage_core::SeverityLevel;

use crate::clock::{ArrivalTime, TicketId};

/// A queued case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket<P> {
    /// Identifier from the queue's id generator.
    pub id: TicketId,
    /// Severity bucket.
    pub severity: SeverityLevel,
    /// Monotonic arrival stamp; the FIFO key within a bucket.
    pub arrival: ArrivalTime,
    /// Strictly increasing per queue; breaks arrival ties.
    pub sequence: u64,
    /// Wall-clock enqueue time, for display only.
    pub enqueued_at: DateTime<Utc>,
    /// Caller data.
    pub payload: P,
}

impl<P> Ticket<P> {
    /// Total service order: most severe first, then earliest arrival, then
    /// lowest sequence.
    pub fn order_key(&self) -> (Reverse<SeverityLevel>, ArrivalTime, u64) {
        (Reverse(self.severity), self.arrival, self.sequence)
    }

    /// Order within one bucket.
    pub(crate) fn fifo_key(&self) -> (ArrivalTime, u64) {
        (self.arrival, self.sequence)
    }
}

impl<P: std::fmt::Display> std::fmt::Display for Ticket<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} {}",
            self.id,
            self.severity,
            self.enqueued_at.format("%H:%M:%S"),
            self.payload
        )
    }
}
