//! Diner - one seat at the table and its think/acquire/eat/release cycle.
//!
//! # State machine
//!
//! ```text
//!            think            own fork           neighbor fork
//! Thinking ---------> Hungry ----------> HoldingOwn -----------> Eating
//!    ^                                      |                      |
//!    |          timeout: put own fork back  |                      |
//!    +--------------------------------------+                      |
//!    |                put both forks back                          |
//!    +-------------------------------------------------------------+
//! ```
//!
//! The own fork is taken with an unbounded wait. Only the predecessor can
//! be holding it, and the predecessor only holds it while holding both of
//! its forks, i.e. while eating, which always finishes. The neighbor's fork
//! is taken with a bounded wait; on timeout the diner lets go of its own
//! fork, which breaks any circular wait around the table.
//!
//! Nothing here makes the protocol fair. A diner can lose the race for its
//! neighbor's fork any number of times in a row.

use std::time::Duration;

use dining_topology::{DinerId, ForkId};
use tracing::{debug, info, warn};

use crate::delay::DelaySource;
use crate::error::{Error, Result};
use crate::event::{EventKind, EventSink};
use crate::fork::Fork;

/// Where a diner is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DinerState {
    Thinking,
    Hungry,
    /// Holding its own fork, reaching for the neighbor's
    HoldingOwn,
    /// Holding both forks
    Eating,
    /// Every scheduled meal eaten
    Done,
}

/// Parameters shared by every diner at a table.
#[derive(Debug, Clone)]
pub struct DiningPolicy {
    /// Meals each diner eats before reporting done.
    pub meals: u32,

    /// Longest wait for the neighbor's fork before backing off.
    pub acquire_timeout: Duration,

    /// Consecutive back-offs after which a warning is logged.
    pub backoff_warn_after: u32,
}

impl Default for DiningPolicy {
    fn default() -> Self {
        Self {
            meals: 3,
            acquire_timeout: Duration::from_millis(100),
            backoff_warn_after: 10,
        }
    }
}

impl DiningPolicy {
    /// Set the number of meals per diner.
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

    /// Set the back-off warning threshold.
    #[must_use]
    pub fn with_backoff_warn_after(mut self, streak: u32) -> Self {
        self.backoff_warn_after = streak;
        self
    }
}

/// What one diner went through on its way to done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DinerSummary {
    pub diner: DinerId,
    pub meals: u32,
    /// Total timeouts on the neighbor's fork
    pub backoffs: u32,
    /// Most consecutive timeouts before a meal
    pub longest_streak: u32,
    /// Most attempts any single meal needed
    pub max_attempts: u32,
}

/// One seat: a name and the fork it owns.
#[derive(Debug)]
pub struct Diner {
    id: DinerId,
    name: String,
    fork: Fork,
}

impl Diner {
    /// Seat a diner with a fresh, available fork.
    pub fn new(id: DinerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fork: Fork::new(id.own_fork()),
        }
    }

    pub const fn id(&self) -> DinerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fork this diner owns.
    pub const fn fork(&self) -> &Fork {
        &self.fork
    }

    /// Run the full cycle until `policy.meals` meals have been eaten.
    ///
    /// `neighbor` is borrowed only to reach its fork.
    pub async fn dine(
        &self,
        neighbor: &Diner,
        policy: &DiningPolicy,
        delays: &mut dyn DelaySource,
        sink: &dyn EventSink,
    ) -> Result<DinerSummary> {
        let mut cycle = Cycle::new(self, neighbor, sink);

        while cycle.meals < policy.meals {
            cycle.think(delays.think()).await;
            cycle.get_hungry();
            cycle.take_own().await?;

            if cycle.take_neighbor(policy.acquire_timeout).await? {
                cycle.eat(delays.eat()).await?;
                cycle.finish_meal()?;
            } else {
                cycle.back_off(policy.backoff_warn_after)?;
            }
        }

        cycle.done();
        Ok(cycle.summary)
    }
}

/// Per-run bookkeeping for one diner.
struct Cycle<'a> {
    me: &'a Diner,
    neighbor: &'a Diner,
    sink: &'a dyn EventSink,
    state: DinerState,
    held: u8,
    meals: u32,
    attempt: u32,
    streak: u32,
    summary: DinerSummary,
}

impl<'a> Cycle<'a> {
    fn new(me: &'a Diner, neighbor: &'a Diner, sink: &'a dyn EventSink) -> Self {
        Self {
            me,
            neighbor,
            sink,
            state: DinerState::Thinking,
            held: 0,
            meals: 0,
            attempt: 1,
            streak: 0,
            summary: DinerSummary {
                diner: me.id,
                ..Default::default()
            },
        }
    }

    fn emit(&self, kind: EventKind) {
        debug!(
            diner = %self.me.name,
            meal = self.meals,
            attempt = self.attempt,
            "{} is {}",
            self.me.name,
            kind.label()
        );
        self.sink.record(self.me.id, self.meals, self.attempt, kind);
    }

    fn enter(&mut self, state: DinerState) {
        self.state = state;
    }

    async fn think(&mut self, duration: Duration) {
        debug_assert_eq!(self.held, 0);
        self.enter(DinerState::Thinking);
        self.emit(EventKind::Thinking);
        pause(duration).await;
    }

    fn get_hungry(&mut self) {
        debug_assert_eq!(self.state, DinerState::Thinking);
        self.enter(DinerState::Hungry);
        self.emit(EventKind::Hungry);
    }

    async fn take_own(&mut self) -> Result<()> {
        let fork = self.me.fork();
        fork.acquire(self.me.id).await?;
        self.picked_up()?;
        self.enter(DinerState::HoldingOwn);
        self.emit(EventKind::AcquiredOwn { fork: fork.id() });
        Ok(())
    }

    async fn take_neighbor(&mut self, timeout: Duration) -> Result<bool> {
        debug_assert_eq!(self.state, DinerState::HoldingOwn);
        let fork = self.neighbor.fork();
        if !fork.try_acquire(self.me.id, timeout).await? {
            self.emit(EventKind::AcquireTimeout { fork: fork.id() });
            return Ok(false);
        }
        self.picked_up()?;
        self.emit(EventKind::AcquiredNeighbor { fork: fork.id() });
        Ok(true)
    }

    async fn eat(&mut self, duration: Duration) -> Result<()> {
        let own = self.me.fork();
        let theirs = self.neighbor.fork();
        if self.held != 2 || !own.is_held_by(self.me.id) || !theirs.is_held_by(self.me.id) {
            return Err(Error::EatingWithoutForks { diner: self.me.id });
        }

        self.enter(DinerState::Eating);
        self.emit(EventKind::Eating);
        pause(duration).await;
        Ok(())
    }

    fn finish_meal(&mut self) -> Result<()> {
        self.put_down(self.neighbor.fork())?;
        self.put_down(self.me.fork())?;

        self.meals += 1;
        self.summary.meals = self.meals;
        self.summary.max_attempts = self.summary.max_attempts.max(self.attempt);
        self.summary.longest_streak = self.summary.longest_streak.max(self.streak);
        self.attempt = 1;
        self.streak = 0;
        self.enter(DinerState::Thinking);
        Ok(())
    }

    fn back_off(&mut self, warn_after: u32) -> Result<()> {
        self.put_down(self.me.fork())?;

        self.summary.backoffs += 1;
        self.streak += 1;
        if warn_after > 0 && self.streak % warn_after == 0 {
            warn!(
                diner = %self.me.name,
                streak = self.streak,
                meal = self.meals,
                "{} keeps losing the race for {}'s fork",
                self.me.name,
                self.neighbor.name
            );
        }
        self.attempt += 1;
        self.enter(DinerState::Thinking);
        Ok(())
    }

    fn done(&mut self) {
        debug_assert_eq!(self.held, 0);
        self.enter(DinerState::Done);
        self.emit(EventKind::Done);
        info!(
            diner = %self.me.name,
            meals = self.summary.meals,
            backoffs = self.summary.backoffs,
            "{} is done",
            self.me.name
        );
    }

    fn picked_up(&mut self) -> Result<()> {
        if self.held >= 2 {
            return Err(Error::TooManyForks { diner: self.me.id });
        }
        self.held += 1;
        Ok(())
    }

    fn put_down(&mut self, fork: &Fork) -> Result<()> {
        let id: ForkId = fork.id();
        self.emit(EventKind::Released { fork: id });
        fork.release(self.me.id)?;
        self.held = self.held.saturating_sub(1);
        Ok(())
    }
}

/// Sleep, or just let the other diners run when there is nothing to wait for.
async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::FixedDelays;
    use crate::event::EventLog;

    fn pair() -> (Diner, Diner) {
        (Diner::new(DinerId(0), "A"), Diner::new(DinerId(1), "B"))
    }

    fn kinds(log: &EventLog, diner: DinerId) -> Vec<EventKind> {
        log.snapshot()
            .into_iter()
            .filter(|e| e.diner == diner)
            .map(|e| e.kind)
            .collect()
    }

    #[tokio::test]
    async fn uncontended_meal_sequence() {
        let (a, b) = pair();
        let log = EventLog::new();
        let policy = DiningPolicy::default().with_meals(1);

        let summary = a
            .dine(&b, &policy, &mut FixedDelays::instant(), &log)
            .await
            .unwrap();

        assert_eq!(summary.meals, 1);
        assert_eq!(summary.backoffs, 0);
        assert_eq!(
            kinds(&log, a.id()),
            vec![
                EventKind::Thinking,
                EventKind::Hungry,
                EventKind::AcquiredOwn { fork: ForkId(0) },
                EventKind::AcquiredNeighbor { fork: ForkId(1) },
                EventKind::Eating,
                EventKind::Released { fork: ForkId(1) },
                EventKind::Released { fork: ForkId(0) },
                EventKind::Done,
            ]
        );
        // Both forks are back on the table
        assert!(a.fork().is_available());
        assert!(b.fork().is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_while_neighbor_fork_is_held() {
        let (a, b) = pair();
        let log = EventLog::new();
        let policy = DiningPolicy::default()
            .with_meals(1)
            .with_acquire_timeout(Duration::from_millis(10));

        // Someone else sits on B's fork for a while
        b.fork().acquire(b.id()).await.unwrap();
        let mut delays = FixedDelays {
            think: Duration::from_millis(5),
            eat: Duration::ZERO,
        };

        let dining = a.dine(&b, &policy, &mut delays, &log);
        let releasing = async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            b.fork().release(b.id()).unwrap();
        };
        let (summary, ()) = tokio::join!(dining, releasing);
        let summary = summary.unwrap();

        assert_eq!(summary.meals, 1);
        assert!(summary.backoffs >= 1);
        assert_eq!(summary.max_attempts, summary.backoffs + 1);

        let events = kinds(&log, a.id());
        let timeout_at = events
            .iter()
            .position(|k| matches!(k, EventKind::AcquireTimeout { .. }))
            .unwrap();
        // After a timeout the own fork goes straight back
        assert_eq!(events[timeout_at + 1], EventKind::Released { fork: ForkId(0) });
        assert_eq!(events[timeout_at + 2], EventKind::Thinking);
    }

    #[tokio::test]
    async fn counts_every_meal() {
        let (a, b) = pair();
        let policy = DiningPolicy::default().with_meals(4);

        let summary = a
            .dine(&b, &policy, &mut FixedDelays::instant(), &crate::NullSink)
            .await
            .unwrap();

        assert_eq!(summary.meals, 4);
        assert_eq!(summary.max_attempts, 1);
    }

    #[tokio::test]
    async fn forks_cannot_be_released_twice_after_a_meal() {
        let (a, b) = pair();
        let log = EventLog::new();
        let policy = DiningPolicy::default().with_meals(1);

        a.dine(&b, &policy, &mut FixedDelays::instant(), &log)
            .await
            .unwrap();
        assert!(matches!(
            a.fork().release(a.id()),
            Err(Error::NotHolder { holder: None, .. })
        ));
    }

    #[tokio::test]
    async fn eating_with_one_fork_is_rejected() {
        let (a, b) = pair();
        let mut cycle = Cycle::new(&a, &b, &crate::NullSink);

        cycle.take_own().await.unwrap();
        assert!(matches!(
            cycle.eat(Duration::ZERO).await,
            Err(Error::EatingWithoutForks { diner: DinerId(0) })
        ));

        // A miscounted hand does not fool the check either
        cycle.held = 2;
        assert!(matches!(
            cycle.eat(Duration::ZERO).await,
            Err(Error::EatingWithoutForks { diner: DinerId(0) })
        ));
        assert_eq!(cycle.state, DinerState::HoldingOwn);
    }

    #[test]
    fn third_fork_is_rejected() {
        let (a, b) = pair();
        let mut cycle = Cycle::new(&a, &b, &crate::NullSink);

        cycle.picked_up().unwrap();
        cycle.picked_up().unwrap();
        assert!(matches!(
            cycle.picked_up(),
            Err(Error::TooManyForks { diner: DinerId(0) })
        ));
        assert_eq!(cycle.held, 2);
    }
}
