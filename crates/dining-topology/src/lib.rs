//! Dining Table Topology
//!
//! Closed ring of N diners with one fork between every pair of neighbors.
//!
//! # Layout
//!
//! Diners sit at indices `0..N`. Diner `i` owns fork `i` and reaches
//! across to its neighbor `(i + 1) mod N` for a second fork. Every fork is
//! therefore touched by exactly two diners: its owner and the owner's
//! predecessor `(i - 1) mod N`.
//!
//! ```text
//!        fork 0          fork 1          fork 2
//!   D0 ---------- D1 ---------- D2 ---------- D0
//!   owns 0        owns 1        owns 2
//!   reaches 1     reaches 2     reaches 0
//! ```
//!
//! The ring is represented by index arithmetic only. Nothing here owns a
//! diner or a fork, so the cyclic neighbor relation never becomes a cyclic
//! ownership graph.

mod id;
mod ring;

pub use id::{DinerId, ForkId};
pub use ring::{RingSize, TopologyError};

/// Smallest ring that can model contention.
pub const MIN_RING_SIZE: usize = 2;

/// Forks a diner needs in hand to eat.
pub const FORKS_PER_MEAL: usize = 2;

/// Diners that share any given fork.
pub const DINERS_PER_FORK: usize = 2;

// A fork is shared by exactly as many diners as a meal needs forks
const _: () = assert!(FORKS_PER_MEAL == DINERS_PER_FORK);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_ring_has_contention() {
        let ring = RingSize::new(MIN_RING_SIZE).unwrap();

        // In a ring of two both diners touch both forks
        for fork in ring.forks() {
            assert_eq!(ring.users_of(fork), [DinerId(fork.0), DinerId(1 - fork.0)]);
        }
    }
}
