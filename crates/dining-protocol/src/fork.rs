//! Fork - the capacity-1 resource token between two neighbors.
//!
//! A fork is a binary semaphore. Its single permit is either in the slot
//! (available) or out of it (held). Acquiring takes the permit out and
//! forgets it; releasing puts it back. The holder is tracked beside the
//! permit so that a release by anyone but the current holder is caught
//! instead of silently minting a second permit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dining_topology::{DinerId, ForkId};
use tokio::sync::Semaphore;
use tracing::trace;

use crate::error::{Error, Result};

const NO_HOLDER: usize = usize::MAX;

/// One shared utensil.
#[derive(Debug)]
pub struct Fork {
    id: ForkId,
    slot: Semaphore,
    holder: AtomicUsize,
}

impl Fork {
    /// Create a fork, initially available.
    pub fn new(id: ForkId) -> Self {
        Self {
            id,
            slot: Semaphore::new(1),
            holder: AtomicUsize::new(NO_HOLDER),
        }
    }

    /// This fork's id.
    pub const fn id(&self) -> ForkId {
        self.id
    }

    /// The diner currently holding this fork, if any.
    pub fn holder(&self) -> Option<DinerId> {
        match self.holder.load(Ordering::Acquire) {
            NO_HOLDER => None,
            index => Some(DinerId(index)),
        }
    }

    /// Whether the permit is in the slot.
    pub fn is_available(&self) -> bool {
        self.slot.available_permits() == 1
    }

    /// Whether `diner` currently holds this fork.
    pub fn is_held_by(&self, diner: DinerId) -> bool {
        self.holder() == Some(diner)
    }

    /// Wait as long as it takes to pick up the fork.
    pub async fn acquire(&self, by: DinerId) -> Result<()> {
        let permit = self.slot.acquire().await.map_err(|_| Error::ForkClosed(self.id))?;
        permit.forget();
        self.mark_held(by)
    }

    /// Try to pick up the fork, waiting at most `timeout`.
    ///
    /// Returns `Ok(false)` when the timeout elapses first. That is the
    /// normal back-off signal, not an error.
    pub async fn try_acquire(&self, by: DinerId, timeout: Duration) -> Result<bool> {
        if let Ok(permit) = self.slot.try_acquire() {
            permit.forget();
            self.mark_held(by)?;
            return Ok(true);
        }

        match tokio::time::timeout(timeout, self.slot.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                self.mark_held(by)?;
                Ok(true)
            }
            Ok(Err(_)) => Err(Error::ForkClosed(self.id)),
            Err(_elapsed) => {
                trace!(fork = %self.id, diner = %by, ?timeout, "fork wait timed out");
                Ok(false)
            }
        }
    }

    /// Put the fork back so the other neighbor can take it.
    ///
    /// Only the current holder may release. A second release, or a release
    /// by the wrong diner, is a protocol violation.
    pub fn release(&self, by: DinerId) -> Result<()> {
        self.holder
            .compare_exchange(by.0, NO_HOLDER, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|actual| Error::NotHolder {
                fork: self.id,
                diner: by,
                holder: (actual != NO_HOLDER).then_some(DinerId(actual)),
            })?;
        self.slot.add_permits(1);
        trace!(fork = %self.id, diner = %by, "fork released");
        Ok(())
    }

    fn mark_held(&self, by: DinerId) -> Result<()> {
        self.holder
            .compare_exchange(NO_HOLDER, by.0, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|actual| Error::AlreadyHeld {
                fork: self.id,
                diner: by,
                holder: Some(DinerId(actual)),
            })?;
        trace!(fork = %self.id, diner = %by, "fork acquired");
        Ok(())
    }
}
