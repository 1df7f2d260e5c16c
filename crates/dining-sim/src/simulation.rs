//! Simulation driver: one task per diner, a rendezvous at the end.

use std::sync::Arc;
use std::time::Duration;

use dining_protocol::{DelayProfile, DinerEvent, DinerSummary, DiningPolicy, EventLog};
use dining_topology::DinerId;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::aggregator::CompletionAggregator;
use crate::error::{Error, Result};
use crate::stats::RunStats;
use crate::table::Table;
use crate::timeline::{Timeline, TimelineSummary};

/// Names used when none are given.
pub const DEFAULT_NAMES: [&str; 5] = ["Aristotle", "Kant", "Spinoza", "Marx", "Russell"];

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Diner names in seating order
    pub names: Vec<String>,
    /// Meals each diner eats before reporting done
    pub meals: u32,
    /// Longest wait for a neighbor's fork
    pub acquire_timeout: Duration,
    /// Think/eat duration model
    pub delays: DelayProfile,
    /// Consecutive back-offs before a warning is logged
    pub backoff_warn_after: u32,
    /// Replay the event log after the run and reject broken histories
    pub verify_timeline: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_NAMES.iter().map(|s| s.to_string()).collect(),
            meals: 3,
            acquire_timeout: Duration::from_millis(100),
            delays: DelayProfile::default(),
            backoff_warn_after: 10,
            verify_timeline: true,
        }
    }
}

impl SimulationConfig {
    /// Set diner names.
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set meals per diner.
    #[must_use]
    pub fn with_meals(mut self, meals: u32) -> Self {
        self.meals = meals;
        self
    }

    /// Set the neighbor-fork timeout.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the delay model.
    #[must_use]
    pub fn with_delays(mut self, delays: DelayProfile) -> Self {
        self.delays = delays;
        self
    }

    /// Seed the delay model.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.delays = self.delays.with_seed(seed);
        self
    }

    /// Set the back-off warning threshold.
    #[must_use]
    pub fn with_backoff_warn_after(mut self, streak: u32) -> Self {
        self.backoff_warn_after = streak;
        self
    }

    /// Skip the post-run timeline replay.
    #[must_use]
    pub fn without_timeline_check(mut self) -> Self {
        self.verify_timeline = false;
        self
    }

    /// Reject settings the protocol cannot run with.
    ///
    /// Names are checked when the table is built.
    pub fn validate(&self) -> Result<()> {
        if self.meals == 0 {
            return Err(Error::InvalidConfig("meals must be at least 1".into()));
        }
        if self.acquire_timeout.is_zero() {
            return Err(Error::InvalidConfig("acquire timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// Protocol parameters shared by every diner.
    pub fn policy(&self) -> DiningPolicy {
        DiningPolicy {
            meals: self.meals,
            acquire_timeout: self.acquire_timeout,
            backoff_warn_after: self.backoff_warn_after,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Diner names in seating order
    pub names: Vec<String>,
    pub finish_order: Vec<DinerId>,
    pub stats: RunStats,
    /// Replay result, when the timeline check ran
    pub timeline: Option<TimelineSummary>,
    pub events: Vec<DinerEvent>,
}

impl SimulationReport {
    /// Name of a seat.
    pub fn name_of(&self, id: DinerId) -> &str {
        self.names.get(id.0).map(String::as_str).unwrap_or("?")
    }

    /// Finish order as names.
    pub fn finish_names(&self) -> Vec<&str> {
        self.finish_order.iter().map(|&id| self.name_of(id)).collect()
    }
}

/// A table ready to run.
///
/// Each simulation owns its table and event log, so any number can run
/// side by side in one process.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    table: Table,
}

impl Simulation {
    /// Validate the configuration and seat the table.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let table = Table::seat(config.names.iter().cloned())?;
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Run every diner to completion.
    ///
    /// Returns once all diners have reported done. The first protocol
    /// violation aborts the remaining diners and is returned as the error.
    pub async fn run(self) -> Result<SimulationReport> {
        let Self { config, table } = self;
        let policy = config.policy();
        let expected = table.len();
        let names: Vec<String> = table.diners().iter().map(|d| d.name().to_owned()).collect();
        let table = Arc::new(table);
        let log = Arc::new(EventLog::new());

        info!(
            diners = expected,
            meals = policy.meals,
            timeout = ?policy.acquire_timeout,
            "simulation starting"
        );
        let started = Instant::now();

        let (intake, aggregator) = CompletionAggregator::channel();
        let mut tasks = JoinSet::new();

        for diner in table.diners() {
            let id = diner.id();
            let table = Arc::clone(&table);
            let log = Arc::clone(&log);
            let intake = intake.clone();
            let policy = policy.clone();
            let mut delays = config.delays.source_for(id);

            tasks.spawn(async move {
                let (me, neighbor) = table
                    .seat_pair(id)
                    .ok_or_else(|| Error::InvalidConfig(format!("no seat for {id}")))?;
                let summary = me
                    .dine(neighbor, &policy, delays.as_mut(), &*log)
                    .await?;
                intake.complete(id)?;
                Ok::<_, Error>(summary)
            });
        }
        // Only the diners hold intakes now
        drop(intake);

        let (finish_order, summaries) = rendezvous(aggregator, tasks, expected).await?;

        let elapsed = started.elapsed();
        let events = log.drain();
        debug!(events = events.len(), ?elapsed, "all diner tasks joined");

        let timeline = if config.verify_timeline {
            Some(Timeline::verify(table.ring(), &events).map_err(Error::Timeline)?)
        } else {
            None
        };

        let stats = RunStats::new(summaries, finish_order.clone(), elapsed);
        info!(
            meals = stats.total_meals(),
            backoffs = stats.total_backoffs(),
            ?elapsed,
            "simulation finished"
        );

        Ok(SimulationReport {
            names,
            finish_order,
            stats,
            timeline,
            events,
        })
    }
}

/// Wait for every completion signal and every diner task.
///
/// The first diner error wins. Returning early drops `tasks`, which aborts
/// the diners still running.
async fn rendezvous(
    mut aggregator: CompletionAggregator,
    mut tasks: JoinSet<Result<DinerSummary>>,
    expected: usize,
) -> Result<(Vec<DinerId>, Vec<DinerSummary>)> {
    let mut summaries = Vec::with_capacity(expected);
    let finished = loop {
        tokio::select! {
            biased;
            order = aggregator.await_all(expected) => break order,
            Some(joined) = tasks.join_next() => {
                collect(joined, &mut summaries)?;
            }
        }
    };

    let finish_order = match finished {
        Ok(order) => order,
        Err(err @ Error::AggregatorClosed { .. }) => {
            // Every diner has exited; surface the reason one of them failed
            while let Some(joined) = tasks.join_next().await {
                collect(joined, &mut summaries)?;
            }
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    while let Some(joined) = tasks.join_next().await {
        collect(joined, &mut summaries)?;
    }
    Ok((finish_order, summaries))
}

fn collect(
    joined: std::result::Result<Result<DinerSummary>, JoinError>,
    summaries: &mut Vec<DinerSummary>,
) -> Result<()> {
    match joined {
        Ok(Ok(summary)) => {
            summaries.push(summary);
            Ok(())
        }
        Ok(Err(err)) => Err(err),
        Err(err) => Err(Error::TaskFailed(err.to_string())),
    }
}
