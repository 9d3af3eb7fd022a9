//! # Event Ingestor
//!
//! Per message: `RECEIVED -> PARSED -> DISPATCHED -> {ACKED | RETRY | DISCARDED}`.
//!
//! - Malformed envelopes and unknown event types are discarded with a warning.
//! - `NotFound`, `Inactive` and `InvalidInput` from the reconciler are discarded:
//!   repeating the call cannot change the answer.
//! - `StoreUnavailable` and `Unexpected` are retried per [`RetryPolicy`]; only the
//!   worker handling that message sleeps. After the last attempt the message is
//!   reported as [`Disposition::Failed`] and the source dead-letters it.
//!
//! ## Ordering
//!
//! [`EventIngestor::run`] spreads messages over a fixed number of lanes keyed by
//! `customer_id % partitions`. Each lane has one worker, so messages for one
//! customer are applied in the order this consumer received them, while different
//! customers proceed concurrently.

use super::envelope::{DiscardReason, EventKind, OrderActivityEvent};
use super::retry::{BackoffStrategy, RetryPolicy};
use super::source::{DeliveryTag, EventSource};
use crate::customer_actor::CustomerError;
use crate::model::Customer;
use crate::reconciler::TierReconciler;
use backon::{BackoffBuilder, Retryable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How one message ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Reconciled; the message is consumed.
    Acked { attempts: u32 },
    /// Dropped without retrying.
    Discarded(DiscardReason),
    /// Every attempt failed with a retryable error.
    Failed { attempts: u32, error: CustomerError },
}

/// Totals for one [`EventIngestor::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub acked: u64,
    pub discarded: u64,
    pub failed: u64,
}

impl IngestStats {
    fn record(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Acked { .. } => self.acked += 1,
            Disposition::Discarded(_) => self.discarded += 1,
            Disposition::Failed { .. } => self.failed += 1,
        }
    }
}

#[derive(Clone)]
pub struct EventIngestor {
    reconciler: TierReconciler,
    retry: RetryPolicy,
    partitions: usize,
    lane_capacity: usize,
}

impl EventIngestor {
    pub fn new(reconciler: TierReconciler, retry: RetryPolicy) -> Self {
        Self {
            reconciler,
            retry,
            partitions: 4,
            lane_capacity: 64,
        }
    }

    pub fn with_partitions(mut self, partitions: usize, lane_capacity: usize) -> Self {
        self.partitions = partitions.max(1);
        self.lane_capacity = lane_capacity.max(1);
        self
    }

    /// Parses and dispatches one payload.
    pub async fn handle(&self, payload: &str) -> Disposition {
        match OrderActivityEvent::parse(payload) {
            Ok(event) => self.dispatch(&event).await,
            Err(reason) => discard(reason),
        }
    }

    /// Routes a parsed event to the reconciler, retrying transient failures.
    pub async fn dispatch(&self, event: &OrderActivityEvent) -> Disposition {
        let customer_id = event.customer_id;
        let event_type = event.event_type();
        let attempts = AtomicU32::new(0);
        let result = match self.retry.strategy {
            BackoffStrategy::Fixed => {
                self.apply_with(event, self.retry.constant(), &attempts).await
            }
            BackoffStrategy::Exponential => {
                self.apply_with(event, self.retry.exponential(), &attempts).await
            }
        };
        let attempts = attempts.into_inner();

        match result {
            Ok(customer) => {
                info!(
                    %customer_id,
                    event_type,
                    attempts,
                    order_count = customer.order_count,
                    tier = %customer.tier,
                    "Event applied"
                );
                Disposition::Acked { attempts }
            }
            Err(CustomerError::NotFound(id)) => discard(DiscardReason::CustomerNotFound(id)),
            Err(CustomerError::Inactive(id)) => discard(DiscardReason::CustomerInactive(id)),
            Err(CustomerError::InvalidInput(msg)) => discard(DiscardReason::InvalidInput(msg)),
            Err(error) => {
                error!(%customer_id, event_type, attempts, error = %error, "Giving up on event");
                Disposition::Failed { attempts, error }
            }
        }
    }

    async fn apply_with<B: BackoffBuilder>(
        &self,
        event: &OrderActivityEvent,
        backoff: B,
        attempts: &AtomicU32,
    ) -> Result<Customer, CustomerError> {
        let customer_id = event.customer_id;
        let event_type = event.event_type();
        (|| async move {
            attempts.fetch_add(1, Ordering::Relaxed);
            match event.kind {
                EventKind::OrderCreated => self.reconciler.add_orders(customer_id, 1).await,
                EventKind::TierUpdated { order_count } => {
                    self.reconciler
                        .set_order_count(customer_id, order_count)
                        .await
                }
            }
        })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(CustomerError::is_retryable)
        .notify(|err: &CustomerError, delay: Duration| {
            warn!(
                %customer_id,
                event_type,
                attempt = attempts.load(Ordering::Relaxed),
                ?delay,
                error = %err,
                "Retrying event"
            );
        })
        .await
    }

    /// Consumes `source` until it is exhausted. When `shutdown` turns `true` the
    /// source is closed, so deliveries it already buffered are still handed to
    /// workers before `recv` yields `None`. Every received delivery is settled
    /// before this returns.
    pub async fn run<S: EventSource>(
        self,
        mut source: S,
        mut shutdown: watch::Receiver<bool>,
    ) -> IngestStats {
        let mut stats = IngestStats::default();
        let (outcome_tx, mut outcome_rx) =
            mpsc::unbounded_channel::<(DeliveryTag, Disposition)>();

        let mut lanes = Vec::with_capacity(self.partitions);
        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(self.partitions);
        for lane in 0..self.partitions {
            let (lane_tx, mut lane_rx) =
                mpsc::channel::<(DeliveryTag, OrderActivityEvent)>(self.lane_capacity);
            let ingestor = self.clone();
            let outcomes = outcome_tx.clone();
            workers.push(tokio::spawn(async move {
                while let Some((tag, event)) = lane_rx.recv().await {
                    let disposition = ingestor.dispatch(&event).await;
                    if outcomes.send((tag, disposition)).is_err() {
                        break;
                    }
                }
                debug!(lane, "Lane drained");
            }));
            lanes.push(lane_tx);
        }
        info!(partitions = self.partitions, "Ingestor started");

        let mut closing = *shutdown.borrow();
        if closing {
            source.close();
        }

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed(), if !closing => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, draining buffered events");
                        closing = true;
                        source.close();
                    }
                }
                Some((tag, disposition)) = outcome_rx.recv() => {
                    stats.record(&disposition);
                    source.settle(tag, &disposition);
                }
                delivery = source.recv() => {
                    let Some(delivery) = delivery else { break };
                    stats.received += 1;
                    match OrderActivityEvent::parse(&delivery.payload) {
                        Ok(event) => {
                            let lane = (event.customer_id.0 % self.partitions as u64) as usize;
                            if let Err(e) = lanes[lane].send((delivery.tag, event)).await {
                                let (tag, event) = e.0;
                                warn!(lane, customer_id = %event.customer_id, "Lane closed");
                                let disposition = Disposition::Failed {
                                    attempts: 0,
                                    error: CustomerError::Unexpected(format!("lane {lane} closed")),
                                };
                                stats.record(&disposition);
                                source.settle(tag, &disposition);
                            }
                        }
                        Err(reason) => {
                            let disposition = discard(reason);
                            stats.record(&disposition);
                            source.settle(delivery.tag, &disposition);
                        }
                    }
                }
            }
        }

        info!("Ingestor draining");
        drop(lanes);
        drop(outcome_tx);
        while let Some((tag, disposition)) = outcome_rx.recv().await {
            stats.record(&disposition);
            source.settle(tag, &disposition);
        }
        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Ingestor worker panicked");
            }
        }
        info!(
            received = stats.received,
            acked = stats.acked,
            discarded = stats.discarded,
            failed = stats.failed,
            "Ingestor stopped"
        );
        stats
    }
}

fn discard(reason: DiscardReason) -> Disposition {
    warn!(reason = %reason, "Discarding event");
    Disposition::Discarded(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CustomerClient;
    use crate::framework::mock::MockClient;
    use crate::model::{Customer, CustomerId};
    use crate::notify::LogNotifier;
    use std::sync::Arc;

    fn ingestor(mock: &MockClient<Customer>) -> EventIngestor {
        let store = Arc::new(CustomerClient::new(mock.client()));
        let reconciler = TierReconciler::new(store, Arc::new(LogNotifier));
        EventIngestor::new(reconciler, RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_unknown_type_never_touches_the_store() {
        let mock = MockClient::<Customer>::new();
        let ingestor = ingestor(&mock);

        let disposition = ingestor
            .handle(r#"{"eventType":"SOMETHING_ELSE","customerId":1,"orderCount":4}"#)
            .await;
        assert_eq!(
            disposition,
            Disposition::Discarded(DiscardReason::UnrecognizedType("SOMETHING_ELSE".into()))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_customer_is_discarded_without_retry() {
        let mut mock = MockClient::<Customer>::new();
        mock.expect_get(CustomerId(8)).return_ok(None);
        let ingestor = ingestor(&mock);

        let disposition = ingestor
            .handle(r#"{"eventType":"CUSTOMER_ORDER_CREATED_EVENT","customerId":8}"#)
            .await;
        assert_eq!(
            disposition,
            Disposition::Discarded(DiscardReason::CustomerNotFound(CustomerId(8)))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_lane_routing_keeps_per_customer_order() {
        let mut mock = MockClient::<Customer>::new();
        let base = Customer::new(CustomerId(2), "Bo", "bo@example.com");
        mock.expect_get(CustomerId(2)).return_ok(Some(base.clone()));
        mock.expect_update(CustomerId(2)).return_ok(base.clone().with_order_count(5));
        mock.expect_get(CustomerId(2)).return_ok(Some(base.clone().with_order_count(5)));
        mock.expect_update(CustomerId(2)).return_ok(base.with_order_count(6));
        let ingestor = ingestor(&mock).with_partitions(3, 4);

        let (mut source, publisher, _dead) =
            crate::ingest::ChannelEventSource::new("customer.events", "g", 8);
        publisher
            .publish(r#"{"eventType":"CUSTOMER_TIER_UPDATED_EVENT","customerId":2,"orderCount":5}"#)
            .await
            .unwrap();
        publisher
            .publish(r#"{"eventType":"CUSTOMER_ORDER_CREATED_EVENT","customerId":2}"#)
            .await
            .unwrap();
        publisher.publish("{").await.unwrap();
        drop(publisher);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = ingestor.run(&mut source, shutdown_rx).await;
        assert_eq!(
            stats,
            IngestStats {
                received: 3,
                acked: 2,
                discarded: 1,
                failed: 0
            }
        );
        assert_eq!(source.in_flight(), 0);
        mock.verify();
    }
}
