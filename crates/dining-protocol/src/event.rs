//! Lifecycle events emitted by diners.
//!
//! `Released` is recorded before the fork goes back into its slot and
//! `Acquired*` after it comes out, so the sequence numbers in a log never
//! show a fork changing hands before its previous holder let go.

use std::sync::{Mutex, PoisonError};

use dining_topology::{DinerId, ForkId};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    /// Started thinking
    Thinking,
    /// Finished thinking, wants to eat
    Hungry,
    /// Picked up its own fork
    AcquiredOwn { fork: ForkId },
    /// Picked up the neighbor's fork
    AcquiredNeighbor { fork: ForkId },
    /// Gave up waiting for the neighbor's fork
    AcquireTimeout { fork: ForkId },
    /// Holding both forks, eating
    Eating,
    /// Put a fork back
    Released { fork: ForkId },
    /// Ate every scheduled meal
    Done,
}

impl EventKind {
    /// Short label for log lines.
    pub const fn label(&self) -> &'static str {
        match self {
            EventKind::Thinking => "thinking",
            EventKind::Hungry => "hungry",
            EventKind::AcquiredOwn { .. } => "acquired own fork",
            EventKind::AcquiredNeighbor { .. } => "acquired neighbor fork",
            EventKind::AcquireTimeout { .. } => "timed out on neighbor fork",
            EventKind::Eating => "eating",
            EventKind::Released { .. } => "released fork",
            EventKind::Done => "done",
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinerEvent {
    /// Position in the log
    pub seq: u64,
    pub diner: DinerId,
    /// Meals finished before this event
    pub meal: u32,
    /// Acquisition attempt for the current meal (1-based)
    pub attempt: u32,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Receives lifecycle events.
pub trait EventSink: Send + Sync {
    /// Record one event. Must be linearizable across diners.
    fn record(&self, diner: DinerId, meal: u32, attempt: u32, kind: EventKind);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _diner: DinerId, _meal: u32, _attempt: u32, _kind: EventKind) {}
}

/// In-memory, sequence-numbered event log.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<DinerEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<DinerEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Take the log, leaving it empty.
    pub fn drain(&self) -> Vec<DinerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for EventLog {
    fn record(&self, diner: DinerId, meal: u32, attempt: u32, kind: EventKind) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = events.len() as u64;
        events.push(DinerEvent {
            seq,
            diner,
            meal,
            attempt,
            kind,
        });
    }
}
