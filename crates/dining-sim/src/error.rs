//! Error types for dining-sim.

use dining_topology::{DinerId, TopologyError};
use thiserror::Error;

use crate::timeline::TimelineViolation;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// A diner broke the protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] dining_protocol::Error),

    /// The requested ring is invalid.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// A diner was given an empty name.
    #[error("diner names must not be empty")]
    EmptyName,

    /// Two diners share a name.
    #[error("duplicate diner name: {0}")]
    DuplicateName(String),

    /// The same diner reported completion twice.
    #[error("{0} reported completion twice")]
    DuplicateCompletion(DinerId),

    /// Every completion sender went away before all diners finished.
    #[error("completion intake closed after {received} of {expected} signals")]
    AggregatorClosed { received: usize, expected: usize },

    /// A diner finished but nobody is listening any more.
    #[error("{0} could not report completion: aggregator is gone")]
    IntakeClosed(DinerId),

    /// Configuration rejected before the run started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The recorded history broke a table invariant.
    #[error("timeline violation: {0:?}")]
    Timeline(TimelineViolation),

    /// A diner task panicked or was cancelled.
    #[error("diner task failed: {0}")]
    TaskFailed(String),
}
