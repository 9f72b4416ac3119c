//! # Time and Identity Sources
//!
//! The queue never reads a global clock or a process-wide counter. Both
//! are injected at construction so tests can script arrivals and ids.

use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monotonic arrival stamp, in nanoseconds since the clock's origin.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArrivalTime(u64);

impl ArrivalTime {
    /// Stamp from raw nanoseconds.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Raw nanoseconds.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t+{}ns", self.0)
    }
}

/// Source of arrival stamps. Called with the queue lock held.
pub trait Clock: Send + Sync {
    /// Current stamp.
    fn now(&self) -> ArrivalTime;
}

/// [`Clock`] over [`Instant`]. Never goes backwards.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> ArrivalTime {
        let nanos = self.origin.elapsed().as_nanos();
        ArrivalTime(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

// ─── Ticket identifiers ──────────────────────────────────────────────

/// Ticket identifier, displayed as `T0001`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketId(u64);

impl TicketId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{:04}", self.0)
    }
}

/// A ticket id string was not `T<digits>` or `<digits>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ticket id {0:?}")]
pub struct ParseTicketIdError(pub String);

impl FromStr for TicketId {
    type Err = ParseTicketIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('T')
            .or_else(|| trimmed.strip_prefix('t'))
            .unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseTicketIdError(s.to_string()))
    }
}

/// Source of ticket ids. Called with the queue lock held.
pub trait IdGenerator: Send {
    /// Next id.
    fn next_id(&mut self) -> TicketId;
}

/// Counter starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Counter whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> TicketId {
        let id = TicketId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_id_display_and_parse() {
        let id = TicketId::new(7);
        assert_eq!(id.to_string(), "T0007");
        assert_eq!("T0007".parse::<TicketId>().unwrap(), id);
        assert_eq!("7".parse::<TicketId>().unwrap(), id);
        assert_eq!(" t12 ".parse::<TicketId>().unwrap(), TicketId::new(12));
        assert!("X1".parse::<TicketId>().is_err());
        assert_eq!(TicketId::new(12345).to_string(), "T12345");
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::default();
        assert_eq!(ids.next_id(), TicketId::new(1));
        assert_eq!(ids.next_id(), TicketId::new(2));
        let mut from_ten = SequentialIds::starting_at(10);
        assert_eq!(from_ten.next_id().get(), 10);
    }

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let mut last = clock.now();
        for _ in 0..1000 {
            let now = clock.now();
            assert!(now >= last);
            last = now;
        }
    }
}
