//! # triage-queue — Severity-Ordered Patient Queue
//!
//! Cases wait in one bucket per [`SeverityLevel`](triage_core::SeverityLevel).
//! Service takes the most severe non-empty bucket first and, within a
//! bucket, the earliest arrival. Arrival ties break on a per-queue
//! sequence number, so the order is total and stable.
//!
//! Time and ticket ids come from injected [`Clock`] and [`IdGenerator`]
//! implementations. There is no process-wide counter.

pub mod clock;
pub mod queue;
pub mod ticket;

pub use clock::{
    ArrivalTime, Clock, IdGenerator, MonotonicClock, ParseTicketIdError, SequentialIds, TicketId,
};
pub use queue::PriorityQueue;
pub use ticket::Ticket;
