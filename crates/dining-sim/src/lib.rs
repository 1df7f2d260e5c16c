//! Dining Table Simulation
//!
//! Seats N diners around a ring, runs each one as its own task and waits
//! for every diner to report done.
//!
//! # Architecture
//!
//! - **Table**: Builds the ring of diners and their forks from a name list
//! - **Aggregator**: Counts completion signals until all N diners are done
//! - **Timeline**: Replays the event log and rejects impossible histories
//! - **Stats**: Meals, back-offs and finish order for one run
//!
//! # Usage
//!
//! ```ignore
//! let config = SimulationConfig::default()
//!     .with_names(["A", "B", "C"])
//!     .with_meals(1);
//!
//! let report = Simulation::new(config)?.run().await?;
//! println!("finish order: {:?}", report.finish_names());
//! ```

mod aggregator;
mod error;
mod simulation;
mod stats;
mod table;
mod timeline;

pub use aggregator::{Completion, CompletionAggregator, CompletionIntake};
pub use error::{Error, Result};
pub use simulation::{Simulation, SimulationConfig, SimulationReport, DEFAULT_NAMES};
pub use stats::RunStats;
pub use table::Table;
pub use timeline::{Phase, Timeline, TimelineSummary, TimelineViolation};

pub use dining_protocol::{DelayProfile, DinerEvent, EventKind};
pub use dining_topology::{DinerId, ForkId, RingSize, TopologyError};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn two_seat_table_runs() {
        let config = SimulationConfig::default()
            .with_names(["Left", "Right"])
            .with_meals(2)
            .with_delays(DelayProfile::instant());

        let report = Simulation::new(config).unwrap().run().await.unwrap();

        assert_eq!(report.stats.total_meals(), 4);
        let timeline = report.timeline.unwrap();
        // Two diners share both forks, so only one can eat at a time
        assert_eq!(timeline.max_concurrent_eaters, 1);
    }

    #[test]
    fn table_accessible_before_run() {
        let sim = Simulation::new(
            SimulationConfig::default().with_acquire_timeout(Duration::from_millis(5)),
        )
        .unwrap();

        assert_eq!(sim.table().len(), DEFAULT_NAMES.len());
        assert!(sim.table().all_forks_available());
        assert_eq!(sim.config().acquire_timeout, Duration::from_millis(5));
    }
}
