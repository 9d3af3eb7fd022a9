//! # Milestone Scanner
//!
//! Periodically walks every customer, page by page, and nudges active customers
//! that are exactly one order short of a promotion (9 or 19 orders). It never
//! writes to the store. One customer's notification failure is logged and the
//! scan moves on; a failed page read ends that cycle early and the next tick
//! starts over.

use crate::clients::CustomerEnumerator;
use crate::customer_actor::CustomerError;
use crate::model::{milestone, CustomerId};
use crate::notify::{Notification, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Outcome of one pass over the customer population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub scanned: usize,
    pub notified: usize,
    pub failed: usize,
    /// Stopped early because shutdown was requested.
    pub cancelled: bool,
    /// Stopped early because a page could not be read.
    pub page_error: Option<CustomerError>,
}

pub struct MilestoneScanner {
    enumerator: Arc<dyn CustomerEnumerator>,
    notifier: Arc<dyn Notifier>,
    page_size: usize,
    interval: Duration,
}

impl MilestoneScanner {
    pub fn new(
        enumerator: Arc<dyn CustomerEnumerator>,
        notifier: Arc<dyn Notifier>,
        page_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            enumerator,
            notifier,
            page_size: page_size.max(1),
            interval,
        }
    }

    /// One full pass, not cancellable.
    pub async fn scan_once(&self) -> ScanReport {
        self.scan(None).await
    }

    async fn scan(&self, shutdown: Option<&watch::Receiver<bool>>) -> ScanReport {
        let mut report = ScanReport::default();
        let mut cursor: Option<CustomerId> = None;

        loop {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                report.cancelled = true;
                break;
            }

            let page = match self.enumerator.page(cursor, self.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    error!(?cursor, error = %e, "Scan page failed");
                    report.page_error = Some(e);
                    break;
                }
            };
            let Some(last) = page.last() else { break };
            cursor = Some(last.id);
            debug!(size = page.len(), "Scanning page");

            for customer in page {
                report.scanned += 1;
                if !customer.active {
                    continue;
                }
                let Some(next_tier) = milestone(customer.order_count) else {
                    continue;
                };
                let nudge = Notification::PromotionNudge {
                    customer_id: customer.id,
                    order_count: customer.order_count,
                    next_tier,
                };
                match self.notifier.notify(nudge).await {
                    Ok(()) => report.notified += 1,
                    Err(e) => {
                        warn!(customer_id = %customer.id, error = %e, "Promotion nudge failed");
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            scanned = report.scanned,
            notified = report.notified,
            failed = report.failed,
            cancelled = report.cancelled,
            "Milestone scan finished"
        );
        report
    }

    /// Scans on every tick until `shutdown` turns `true`. The first scan runs
    /// immediately. Returns the number of completed passes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> usize {
        info!(interval = ?self.interval, page_size = self.page_size, "Starting milestone scanner");
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut passes = 0;

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = self.scan(Some(&shutdown)).await;
                    if report.cancelled {
                        break;
                    }
                    passes += 1;
                }
            }
        }

        info!(passes, "Milestone scanner stopped");
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Customer;
    use crate::notify::{ChannelNotifier, NotifyError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a fixed population and remembers the cursors it was asked for.
    struct FixedPopulation {
        customers: Vec<Customer>,
        cursors: Mutex<Vec<Option<CustomerId>>>,
    }

    impl FixedPopulation {
        fn with_counts(counts: &[u32]) -> Self {
            let customers = counts
                .iter()
                .enumerate()
                .map(|(i, count)| {
                    Customer::new(CustomerId(i as u64 + 1), format!("c{i}"), "c@example.com")
                        .with_order_count(*count)
                })
                .collect();
            Self {
                customers,
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CustomerEnumerator for FixedPopulation {
        async fn page(
            &self,
            after: Option<CustomerId>,
            limit: usize,
        ) -> Result<Vec<Customer>, CustomerError> {
            self.cursors.lock().unwrap().push(after);
            Ok(self
                .customers
                .iter()
                .filter(|c| after.map_or(true, |a| c.id > a))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    /// Fails for one customer, succeeds for everyone else.
    struct FlakyNotifier {
        fail_for: CustomerId,
        delivered: Mutex<Vec<CustomerId>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
            if notification.customer_id() == self.fail_for {
                return Err(NotifyError::Delivery("smtp down".into()));
            }
            self.delivered.lock().unwrap().push(notification.customer_id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_only_one_short_customers_are_nudged() {
        let population = Arc::new(FixedPopulation::with_counts(&[8, 9, 10, 19, 20]));
        let (notifier, mut nudges) = ChannelNotifier::new();
        let scanner = MilestoneScanner::new(
            population.clone(),
            Arc::new(notifier),
            2,
            Duration::from_secs(300),
        );

        let report = scanner.scan_once().await;
        assert_eq!(report.scanned, 5);
        assert_eq!(report.notified, 2);

        let mut counts = Vec::new();
        while let Ok(Notification::PromotionNudge { order_count, .. }) = nudges.try_recv() {
            counts.push(order_count);
        }
        assert_eq!(counts, vec![9, 19]);
        // Three pages of two and the empty page that ends the walk.
        assert_eq!(
            *population.cursors.lock().unwrap(),
            vec![None, Some(CustomerId(2)), Some(CustomerId(4)), Some(CustomerId(5))]
        );
    }

    #[tokio::test]
    async fn test_inactive_customers_are_skipped() {
        let mut population = FixedPopulation::with_counts(&[9, 19]);
        population.customers[0].active = false;
        let (notifier, mut nudges) = ChannelNotifier::new();
        let scanner = MilestoneScanner::new(
            Arc::new(population),
            Arc::new(notifier),
            10,
            Duration::from_secs(1),
        );

        let report = scanner.scan_once().await;
        assert_eq!(report.notified, 1);
        assert_eq!(nudges.try_recv().unwrap().customer_id(), CustomerId(2));
    }

    #[tokio::test]
    async fn test_one_failed_nudge_does_not_stop_the_scan() {
        let population = Arc::new(FixedPopulation::with_counts(&[9, 19, 9]));
        let notifier = Arc::new(FlakyNotifier {
            fail_for: CustomerId(2),
            delivered: Mutex::new(Vec::new()),
        });
        let scanner =
            MilestoneScanner::new(population, notifier.clone(), 1, Duration::from_secs(1));

        let report = scanner.scan_once().await;
        assert_eq!(report.notified, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            *notifier.delivered.lock().unwrap(),
            vec![CustomerId(1), CustomerId(3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_scans_each_interval_until_shutdown() {
        let population = Arc::new(FixedPopulation::with_counts(&[9]));
        let (notifier, mut nudges) = ChannelNotifier::new();
        let scanner =
            MilestoneScanner::new(population, Arc::new(notifier), 10, Duration::from_secs(300));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scanner.run(shutdown_rx));

        // Immediate pass, then one per five minutes.
        tokio::time::sleep(Duration::from_secs(601)).await;
        shutdown_tx.send(true).unwrap();
        let passes = handle.await.unwrap();

        assert_eq!(passes, 3);
        let mut received = 0;
        while nudges.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }
}
