//! Completion aggregator - the rendezvous that ends a run.
//!
//! Diners report through cloneable [`CompletionIntake`] handles that feed a
//! single channel, so concurrent reports are serialized without any extra
//! lock. [`CompletionAggregator::await_all`] keeps its progress in `self`,
//! which makes it safe to cancel (e.g. from a `select!` arm) and call again.

use std::collections::HashSet;

use dining_topology::DinerId;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A diner's one-shot "I ate every meal" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub diner: DinerId,
}

/// Sending side handed to each diner task.
#[derive(Debug, Clone)]
pub struct CompletionIntake {
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionIntake {
    /// Report that `diner` is done.
    pub fn complete(&self, diner: DinerId) -> Result<()> {
        self.tx
            .send(Completion { diner })
            .map_err(|_| Error::IntakeClosed(diner))
    }
}

/// Collects completion signals until every diner has reported.
#[derive(Debug)]
pub struct CompletionAggregator {
    rx: mpsc::UnboundedReceiver<Completion>,
    seen: HashSet<DinerId>,
    finish_order: Vec<DinerId>,
}

impl CompletionAggregator {
    /// Create an aggregator and the first intake handle.
    pub fn channel() -> (CompletionIntake, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            CompletionIntake { tx },
            Self {
                rx,
                seen: HashSet::new(),
                finish_order: Vec::new(),
            },
        )
    }

    /// Signals received so far.
    pub fn received(&self) -> usize {
        self.finish_order.len()
    }

    /// Wait until `expected` distinct diners have reported.
    ///
    /// Returns the finish order. It differs from run to run; that is the
    /// point of the simulation, not a bug.
    pub async fn await_all(&mut self, expected: usize) -> Result<Vec<DinerId>> {
        while self.finish_order.len() < expected {
            let Some(Completion { diner }) = self.rx.recv().await else {
                return Err(Error::AggregatorClosed {
                    received: self.finish_order.len(),
                    expected,
                });
            };

            if !self.seen.insert(diner) {
                return Err(Error::DuplicateCompletion(diner));
            }
            self.finish_order.push(diner);
            debug!(%diner, received = self.finish_order.len(), expected, "completion received");
        }

        info!(expected, "all diners finished");
        Ok(self.finish_order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_ok, task};

    #[tokio::test]
    async fn returns_after_exactly_n() {
        let (intake, mut aggregator) = CompletionAggregator::channel();
        for i in [2, 0, 1] {
            intake.complete(DinerId(i)).unwrap();
        }

        let order = aggregator.await_all(3).await.unwrap();
        assert_eq!(order, vec![DinerId(2), DinerId(0), DinerId(1)]);
    }

    #[test]
    fn stays_blocked_on_n_minus_one() {
        let (intake, mut aggregator) = CompletionAggregator::channel();
        intake.complete(DinerId(0)).unwrap();
        intake.complete(DinerId(1)).unwrap();

        {
            let mut waiting = task::spawn(aggregator.await_all(3));
            assert_pending!(waiting.poll());

            intake.complete(DinerId(2)).unwrap();
            assert!(waiting.is_woken());
            let order = assert_ready_ok!(waiting.poll());
            assert_eq!(order.len(), 3);
        }
        assert_eq!(aggregator.received(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_survives_cancellation() {
        let (intake, mut aggregator) = CompletionAggregator::channel();
        intake.complete(DinerId(0)).unwrap();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            aggregator.await_all(2),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(aggregator.received(), 1);

        intake.complete(DinerId(1)).unwrap();
        let order = aggregator.await_all(2).await.unwrap();
        assert_eq!(order, vec![DinerId(0), DinerId(1)]);
    }

    #[tokio::test]
    async fn duplicate_signal_is_rejected() {
        let (intake, mut aggregator) = CompletionAggregator::channel();
        intake.complete(DinerId(1)).unwrap();
        intake.complete(DinerId(1)).unwrap();

        assert!(matches!(
            aggregator.await_all(2).await,
            Err(Error::DuplicateCompletion(DinerId(1)))
        ));
    }

    #[tokio::test]
    async fn closed_intake_reports_shortfall() {
        let (intake, mut aggregator) = CompletionAggregator::channel();
        intake.complete(DinerId(0)).unwrap();
        drop(intake);

        assert!(matches!(
            aggregator.await_all(3).await,
            Err(Error::AggregatorClosed { received: 1, expected: 3 })
        ));
    }

    #[test]
    fn reporting_after_aggregator_dropped_fails() {
        let (intake, aggregator) = CompletionAggregator::channel();
        drop(aggregator);

        assert!(matches!(
            intake.complete(DinerId(4)),
            Err(Error::IntakeClosed(DinerId(4)))
        ));
    }

    #[tokio::test]
    async fn concurrent_reports_are_all_counted() {
        let (intake, mut aggregator) = CompletionAggregator::channel();

        let mut tasks = Vec::new();
        for i in 0..32 {
            let intake = intake.clone();
            tasks.push(tokio::spawn(async move { intake.complete(DinerId(i)) }));
        }
        drop(intake);

        let mut order = aggregator.await_all(32).await.unwrap();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        order.sort();
        assert_eq!(order, (0..32).map(DinerId).collect::<Vec<_>>());
    }
}
