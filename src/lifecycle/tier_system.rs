use crate::admin::TierAdmin;
use crate::clients::CustomerClient;
use crate::config::Config;
use crate::ingest::{ChannelEventSource, DeadLetter, EventIngestor, EventPublisher, IngestStats};
use crate::notify::Notifier;
use crate::reconciler::TierReconciler;
use crate::scanner::MilestoneScanner;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The runtime orchestrator for the loyalty tier service.
///
/// `TierSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the store actor, the event
///   ingestor and the milestone scanner
/// - **Dependency Wiring**: The reconciler, the admin surface and the scanner all
///   share one [`CustomerClient`]
///
/// # Example
///
/// ```ignore
/// let system = TierSystem::start(&Config::load()?, Arc::new(LogNotifier));
///
/// let customer = system.admin.register_customer("Ada", "ada@example.com").await?;
/// system.publisher.publish(order_created_json(customer.id)).await?;
///
/// let stats = system.shutdown().await?;
/// ```
pub struct TierSystem {
    pub customers: CustomerClient,
    pub admin: TierAdmin,
    pub reconciler: TierReconciler,
    /// Producer side of the inbound event channel.
    pub publisher: EventPublisher,
    /// Messages that failed after every retry.
    pub dead_letters: mpsc::UnboundedReceiver<DeadLetter>,
    shutdown: watch::Sender<bool>,
    store_handle: JoinHandle<()>,
    ingestor_handle: JoinHandle<IngestStats>,
    scanner_handle: JoinHandle<usize>,
}

impl TierSystem {
    /// Spawns the store actor, the ingestor and the scanner.
    pub fn start(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        // 1. The store has no dependencies
        let (store_actor, customers) = crate::customer_actor::new(config.store.buffer_size);
        let store_handle = tokio::spawn(store_actor.run(()));

        // 2. Everything else talks to the store through clones of one client
        let store = Arc::new(customers.clone());
        let reconciler = TierReconciler::new(store.clone(), notifier.clone());
        let admin = TierAdmin::new(customers.clone(), reconciler.clone());

        let (shutdown, shutdown_rx) = watch::channel(false);

        let (source, publisher, dead_letters) = ChannelEventSource::new(
            config.ingest.channel.clone(),
            config.ingest.consumer_group.clone(),
            config.ingest.lane_capacity,
        );
        let ingestor = EventIngestor::new(reconciler.clone(), config.ingest.retry_policy())
            .with_partitions(config.ingest.partitions, config.ingest.lane_capacity);
        let ingestor_handle = tokio::spawn(ingestor.run(source, shutdown_rx.clone()));

        let scanner = MilestoneScanner::new(
            store,
            notifier,
            config.scanner.page_size,
            config.scanner.interval(),
        );
        let scanner_handle = tokio::spawn(scanner.run(shutdown_rx));

        info!(
            channel = %config.ingest.channel,
            group = %config.ingest.consumer_group,
            "Tier system started"
        );

        Self {
            customers,
            admin,
            reconciler,
            publisher,
            dead_letters,
            shutdown,
            store_handle,
            ingestor_handle,
            scanner_handle,
        }
    }

    /// Gracefully shuts down the entire system.
    ///
    /// 1. Signals cancellation; the ingestor closes its source, processes the
    ///    events still buffered there and settles them, and the scanner stops
    ///    between pages
    /// 2. Drops every client so the store actor's loop ends
    /// 3. Waits for the store actor
    ///
    /// Returns the ingestor's totals, or an error if any task panicked.
    pub async fn shutdown(self) -> Result<IngestStats, String> {
        info!("Shutting down system...");
        let _ = self.shutdown.send(true);
        drop(self.publisher);

        let stats = self.ingestor_handle.await.map_err(|e| {
            error!("Ingestor task failed: {:?}", e);
            format!("Ingestor task failed: {:?}", e)
        })?;
        self.scanner_handle.await.map_err(|e| {
            error!("Scanner task failed: {:?}", e);
            format!("Scanner task failed: {:?}", e)
        })?;

        drop(self.admin);
        drop(self.reconciler);
        drop(self.customers);
        self.store_handle.await.map_err(|e| {
            error!("Store actor failed: {:?}", e);
            format!("Store actor failed: {:?}", e)
        })?;

        info!("System shutdown complete.");
        Ok(stats)
    }
}
