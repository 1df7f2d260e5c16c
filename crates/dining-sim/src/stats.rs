//! Per-run statistics.

use std::time::Duration;

use dining_protocol::DinerSummary;
use dining_topology::DinerId;

/// Aggregate numbers for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// One entry per diner, in seat order
    pub diners: Vec<DinerSummary>,
    /// Order in which diners reported done
    pub finish_order: Vec<DinerId>,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn new(mut diners: Vec<DinerSummary>, finish_order: Vec<DinerId>, elapsed: Duration) -> Self {
        diners.sort_by_key(|s| s.diner);
        Self {
            diners,
            finish_order,
            elapsed,
        }
    }

    /// Meals eaten across the table.
    pub fn total_meals(&self) -> u64 {
        self.diners.iter().map(|s| u64::from(s.meals)).sum()
    }

    /// Timeouts on a neighbor's fork across the table.
    pub fn total_backoffs(&self) -> u64 {
        self.diners.iter().map(|s| u64::from(s.backoffs)).sum()
    }

    /// Worst run of consecutive back-offs any diner suffered.
    pub fn longest_streak(&self) -> u32 {
        self.diners.iter().map(|s| s.longest_streak).max().unwrap_or(0)
    }

    /// Most attempts any single meal needed.
    pub fn max_attempts(&self) -> u32 {
        self.diners.iter().map(|s| s.max_attempts).max().unwrap_or(0)
    }

    /// Summary for one diner.
    pub fn diner(&self, id: DinerId) -> Option<&DinerSummary> {
        self.diners.iter().find(|s| s.diner == id)
    }

    /// Diner that backed off the most (ties go to the lower seat).
    pub fn hungriest(&self) -> Option<&DinerSummary> {
        self.diners
            .iter()
            .rev()
            .max_by_key(|s| s.backoffs)
    }
}
