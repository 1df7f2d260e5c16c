//! Error types for dining-protocol.

use dining_topology::{DinerId, ForkId};
use thiserror::Error;

/// Result type for dining-protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the dining protocol.
///
/// An acquisition timeout is not an error. Every variant here is a broken
/// protocol invariant and is fatal to the run.
#[derive(Debug, Error)]
pub enum Error {
    /// The fork's underlying semaphore was closed.
    #[error("{0} was closed while diners were still using it")]
    ForkClosed(ForkId),

    /// A diner released a fork it does not hold.
    #[error("{diner} released {fork} but the holder is {holder:?}")]
    NotHolder {
        fork: ForkId,
        diner: DinerId,
        holder: Option<DinerId>,
    },

    /// A diner took a fork that was already marked as held.
    #[error("{diner} acquired {fork} while it was still held by {holder:?}")]
    AlreadyHeld {
        fork: ForkId,
        diner: DinerId,
        holder: Option<DinerId>,
    },

    /// A diner tried to eat without holding both of its forks.
    #[error("{diner} started eating without holding both forks")]
    EatingWithoutForks { diner: DinerId },

    /// A diner ended up with more than two forks in hand.
    #[error("{diner} holds more than two forks")]
    TooManyForks { diner: DinerId },
}
