//! Timeline replay and invariant checks.
//!
//! Replays a recorded event log against the ring and rejects any history
//! in which:
//!
//! - a fork had two holders at once,
//! - a diner touched a fork other than its own or its neighbor's,
//! - a diner ate without both forks in hand, or held more than two,
//! - a diner's events break the Thinking → Hungry → AcquiredOwn →
//!   (AcquiredNeighbor → Eating → Released ×2 | AcquireTimeout → Released)
//!   cycle,
//! - a diner reported done more than once, did anything afterwards, or
//!   (for a complete run) never reported done.

use std::collections::BTreeMap;

use dining_protocol::{DinerEvent, EventKind};
use dining_topology::{DinerId, ForkId, RingSize};
use serde::{Deserialize, Serialize};

/// Where the replay believes a diner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Between cycles (or not started)
    Idle,
    Thinking,
    Hungry,
    HoldingOwn,
    /// Neighbor's fork taken, not yet eating
    HoldingBoth,
    Eating,
    /// Put one fork back after eating, the other still in hand
    Releasing,
    /// Timed out, own fork not yet put back
    BackingOff,
    Done,
}

/// A history that cannot happen under a correct protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineViolation {
    /// An event named a seat outside the ring
    UnknownDiner { seq: u64, diner: DinerId },
    /// Fork taken while someone else held it
    DoubleHolder {
        seq: u64,
        fork: ForkId,
        holder: DinerId,
        taker: DinerId,
    },
    /// Fork put back by a diner that did not hold it
    ReleaseWithoutHold {
        seq: u64,
        fork: ForkId,
        diner: DinerId,
    },
    /// Diner touched a fork outside its pair
    NotAdjacent {
        seq: u64,
        fork: ForkId,
        diner: DinerId,
    },
    /// Diner started eating without both forks
    EatingWithoutForks { seq: u64, diner: DinerId },
    /// Diner held more than two forks
    TooManyForks { seq: u64, diner: DinerId },
    /// Event arrived in a phase that cannot produce it
    OutOfOrder {
        seq: u64,
        diner: DinerId,
        phase: Phase,
        event: EventKind,
    },
    /// Diner never reported done
    Unfinished { diner: DinerId, phase: Phase },
}

/// Counters gathered while replaying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub events: usize,
    /// Times any diner entered the eating state
    pub eating_entries: usize,
    pub timeouts: usize,
    /// Most diners eating at the same moment
    pub max_concurrent_eaters: usize,
    pub meals_per_diner: BTreeMap<DinerId, u32>,
}

#[derive(Debug, Clone)]
struct Seat {
    phase: Phase,
    held: Vec<ForkId>,
}

/// Incremental replay of a dining run.
#[derive(Debug, Clone)]
pub struct Timeline {
    ring: RingSize,
    holders: Vec<Option<DinerId>>,
    seats: Vec<Seat>,
    eating_now: usize,
    summary: TimelineSummary,
}

impl Timeline {
    /// Start a replay for a ring.
    pub fn new(ring: RingSize) -> Self {
        Self {
            ring,
            holders: vec![None; ring.get()],
            seats: vec![
                Seat {
                    phase: Phase::Idle,
                    held: Vec::with_capacity(2),
                };
                ring.get()
            ],
            eating_now: 0,
            summary: TimelineSummary::default(),
        }
    }

    /// Replay a complete run: every diner must end in [`Phase::Done`].
    pub fn verify(ring: RingSize, events: &[DinerEvent]) -> Result<TimelineSummary, TimelineViolation> {
        let mut timeline = Self::new(ring);
        for event in events {
            timeline.apply(event)?;
        }
        timeline.finish()
    }

    /// Current phase of a diner.
    pub fn phase(&self, diner: DinerId) -> Option<Phase> {
        self.seats.get(diner.0).map(|s| s.phase)
    }

    /// Current holder of a fork.
    pub fn holder(&self, fork: ForkId) -> Option<DinerId> {
        self.holders.get(fork.0).copied().flatten()
    }

    /// Counters so far.
    pub fn summary(&self) -> &TimelineSummary {
        &self.summary
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &DinerEvent) -> Result<(), TimelineViolation> {
        let DinerEvent { seq, diner, kind, .. } = *event;
        if !self.ring.contains(diner) {
            return Err(TimelineViolation::UnknownDiner { seq, diner });
        }
        self.summary.events += 1;

        let phase = self.seats[diner.0].phase;
        let out_of_order = || TimelineViolation::OutOfOrder {
            seq,
            diner,
            phase,
            event: kind,
        };

        let next = match (phase, kind) {
            (Phase::Idle, EventKind::Thinking) => Phase::Thinking,
            (Phase::Thinking, EventKind::Hungry) => Phase::Hungry,
            (Phase::Hungry, EventKind::AcquiredOwn { fork }) if fork == diner.own_fork() => {
                self.take(seq, diner, fork)?;
                Phase::HoldingOwn
            }
            (Phase::HoldingOwn, EventKind::AcquiredNeighbor { fork })
                if fork == self.ring.neighbor_fork(diner) =>
            {
                self.take(seq, diner, fork)?;
                Phase::HoldingBoth
            }
            (Phase::HoldingOwn, EventKind::AcquireTimeout { fork })
                if fork == self.ring.neighbor_fork(diner) =>
            {
                self.summary.timeouts += 1;
                Phase::BackingOff
            }
            (Phase::HoldingBoth, EventKind::Eating) => {
                let [own, theirs] = self.ring.forks_of(diner);
                if self.holder(own) != Some(diner) || self.holder(theirs) != Some(diner) {
                    return Err(TimelineViolation::EatingWithoutForks { seq, diner });
                }
                self.summary.eating_entries += 1;
                self.eating_now += 1;
                self.summary.max_concurrent_eaters =
                    self.summary.max_concurrent_eaters.max(self.eating_now);
                Phase::Eating
            }
            (Phase::Eating, EventKind::Released { fork }) => {
                self.put_back(seq, diner, fork)?;
                self.eating_now -= 1;
                Phase::Releasing
            }
            (Phase::Releasing, EventKind::Released { fork }) => {
                self.put_back(seq, diner, fork)?;
                *self.summary.meals_per_diner.entry(diner).or_default() += 1;
                Phase::Idle
            }
            (Phase::BackingOff, EventKind::Released { fork }) if fork == diner.own_fork() => {
                self.put_back(seq, diner, fork)?;
                Phase::Idle
            }
            (Phase::Idle, EventKind::Done) => {
                if !self.seats[diner.0].held.is_empty() {
                    return Err(out_of_order());
                }
                Phase::Done
            }
            // Forks outside the pair are reported as such, not as ordering bugs
            (
                _,
                EventKind::AcquiredOwn { fork }
                | EventKind::AcquiredNeighbor { fork }
                | EventKind::AcquireTimeout { fork }
                | EventKind::Released { fork },
            ) if !self.ring.may_touch(diner, fork) => {
                return Err(TimelineViolation::NotAdjacent { seq, fork, diner });
            }
            _ => return Err(out_of_order()),
        };

        self.seats[diner.0].phase = next;
        Ok(())
    }

    /// End of log: every diner must be done.
    pub fn finish(self) -> Result<TimelineSummary, TimelineViolation> {
        for (i, seat) in self.seats.iter().enumerate() {
            if seat.phase != Phase::Done {
                return Err(TimelineViolation::Unfinished {
                    diner: DinerId(i),
                    phase: seat.phase,
                });
            }
        }
        Ok(self.summary)
    }

    fn take(&mut self, seq: u64, diner: DinerId, fork: ForkId) -> Result<(), TimelineViolation> {
        if !self.ring.may_touch(diner, fork) {
            return Err(TimelineViolation::NotAdjacent { seq, fork, diner });
        }
        if let Some(holder) = self.holders[fork.0] {
            return Err(TimelineViolation::DoubleHolder {
                seq,
                fork,
                holder,
                taker: diner,
            });
        }
        let seat = &mut self.seats[diner.0];
        if seat.held.len() >= 2 {
            return Err(TimelineViolation::TooManyForks { seq, diner });
        }
        seat.held.push(fork);
        self.holders[fork.0] = Some(diner);
        Ok(())
    }

    fn put_back(&mut self, seq: u64, diner: DinerId, fork: ForkId) -> Result<(), TimelineViolation> {
        if !self.ring.may_touch(diner, fork) {
            return Err(TimelineViolation::NotAdjacent { seq, fork, diner });
        }
        if self.holders[fork.0] != Some(diner) {
            return Err(TimelineViolation::ReleaseWithoutHold { seq, fork, diner });
        }
        self.holders[fork.0] = None;
        self.seats[diner.0].held.retain(|&f| f != fork);
        Ok(())
    }
}
