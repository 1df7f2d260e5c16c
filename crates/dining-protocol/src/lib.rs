//! Dining Protocol - Timeout-raced Two-Fork Acquisition
//!
//! This crate provides the pieces each diner needs to eat without the table
//! deadlocking: a capacity-1 [`Fork`], the [`Diner`] think/acquire/eat/release
//! cycle, injectable think/eat delays, and the lifecycle event vocabulary.
//!
//! # Overview
//!
//! ## Acquisition
//!
//! A hungry diner takes its own fork (unbounded wait), then races its
//! neighbor's fork against a fixed timeout:
//!
//! - **Success**: two forks in hand, the diner eats and puts both back
//! - **Timeout**: the diner puts its own fork back and goes back to thinking
//!
//! Because no diner ever sits on one fork indefinitely while waiting for a
//! second, the "everyone holds their left fork" circular wait cannot persist.
//! The protocol makes no promise of fairness; livelock is possible in
//! principle when random delays line up.
//!
//! ## Events
//!
//! Every transition is reported to an [`EventSink`] so runs can be traced on
//! the console or replayed and checked afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use dining_protocol::{Diner, DiningPolicy, EventLog, FixedDelays};
//! use dining_topology::DinerId;
//!
//! let a = Diner::new(DinerId(0), "A");
//! let b = Diner::new(DinerId(1), "B");
//! let log = EventLog::new();
//!
//! let summary = a
//!     .dine(&b, &DiningPolicy::default(), &mut FixedDelays::instant(), &log)
//!     .await?;
//! assert_eq!(summary.meals, 3);
//! ```

pub mod delay;
pub mod diner;
pub mod error;
pub mod event;
pub mod fork;

pub use delay::{DelayProfile, DelaySource, FixedDelays, UniformDelays};
pub use diner::{Diner, DinerSummary, DiningPolicy};
pub use error::{Error, Result};
pub use event::{DinerEvent, EventKind, EventLog, EventSink, NullSink};
pub use fork::Fork;

// Re-export topology types for convenience
pub use dining_topology::{DinerId, ForkId, RingSize};
