//! Ring arithmetic.
//!
//! A ring of size N closes on itself: following the neighbor relation N
//! times from any seat returns to that seat, and no shorter walk does.
//! All lookups are modular arithmetic over seat indices.

use thiserror::Error;

use crate::{DinerId, ForkId, MIN_RING_SIZE};

/// Errors from constructing a ring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A ring needs at least two seats to model contention.
    #[error("ring of {size} cannot model contention (need at least {MIN_RING_SIZE})")]
    RingTooSmall { size: usize },
}

/// Size of a closed ring, validated to be at least [`MIN_RING_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingSize(usize);

impl RingSize {
    /// Validate a ring size.
    pub const fn new(size: usize) -> Result<Self, TopologyError> {
        if size < MIN_RING_SIZE {
            return Err(TopologyError::RingTooSmall { size });
        }
        Ok(Self(size))
    }

    /// Number of seats (and forks).
    #[inline]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Whether a seat index belongs to this ring.
    #[inline]
    pub const fn contains(&self, diner: DinerId) -> bool {
        diner.0 < self.0
    }

    /// All seats in index order.
    pub fn diners(&self) -> impl Iterator<Item = DinerId> {
        (0..self.0).map(DinerId)
    }

    /// All forks in index order.
    pub fn forks(&self) -> impl Iterator<Item = ForkId> {
        (0..self.0).map(ForkId)
    }

    /// The diner whose fork `diner` reaches for: `(i + 1) mod N`.
    #[inline]
    pub const fn neighbor(&self, diner: DinerId) -> DinerId {
        DinerId((diner.0 + 1) % self.0)
    }

    /// The diner that reaches for `diner`'s fork: `(i - 1) mod N`.
    #[inline]
    pub const fn predecessor(&self, diner: DinerId) -> DinerId {
        DinerId((diner.0 + self.0 - 1) % self.0)
    }

    /// Follow the neighbor relation `steps` times.
    #[inline]
    pub const fn walk(&self, from: DinerId, steps: usize) -> DinerId {
        DinerId((from.0 % self.0 + steps % self.0) % self.0)
    }

    /// Number of neighbor hops until the walk from `from` first returns.
    ///
    /// Always equals the ring size for a closed ring.
    pub fn cycle_length(&self, from: DinerId) -> usize {
        let mut at = self.neighbor(from);
        let mut hops = 1;
        while at != from {
            at = self.neighbor(at);
            hops += 1;
        }
        hops
    }

    /// The fork `diner` reaches across for.
    #[inline]
    pub const fn neighbor_fork(&self, diner: DinerId) -> ForkId {
        self.neighbor(diner).own_fork()
    }

    /// Both forks a diner needs to eat: `[own, neighbor's]`.
    pub const fn forks_of(&self, diner: DinerId) -> [ForkId; 2] {
        [diner.own_fork(), self.neighbor_fork(diner)]
    }

    /// The two diners that share a fork: `[owner, predecessor]`.
    pub const fn users_of(&self, fork: ForkId) -> [DinerId; 2] {
        let owner = fork.owner();
        [owner, self.predecessor(owner)]
    }

    /// Whether `diner` is one of the two diners allowed to touch `fork`.
    pub const fn may_touch(&self, diner: DinerId, fork: ForkId) -> bool {
        let [owner, predecessor] = self.users_of(fork);
        diner.0 == owner.0 || diner.0 == predecessor.0
    }

    /// Whether two seats are next to each other in either direction.
    pub const fn are_adjacent(&self, a: DinerId, b: DinerId) -> bool {
        a.0 != b.0 && (self.neighbor(a).0 == b.0 || self.neighbor(b).0 == a.0)
    }
}
