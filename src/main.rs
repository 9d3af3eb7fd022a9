//! Demo of the loyalty tier service.
//!
//! 1. Starts a [`TierSystem`] with notifications written to the log.
//! 2. Registers a customer through the admin surface.
//! 3. Publishes order activity and waits for the ingestor to apply it.
//! 4. Shuts down.

use loyalty_tier::config::Config;
use loyalty_tier::ingest::{ORDER_CREATED, TIER_UPDATED};
use loyalty_tier::lifecycle::{setup_tracing, TierSystem};
use loyalty_tier::model::{CustomerId, Tier};
use loyalty_tier::notify::LogNotifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::load().map_err(|e| e.to_string())?;
    info!(?config, "Starting loyalty tier service");
    let system = TierSystem::start(&config, Arc::new(LogNotifier));

    let customer = async {
        info!("Registering demo customer");
        system
            .admin
            .register_customer("Alice", "alice@example.com")
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("registration"))
    .await?;
    info!(customer_id = %customer.id, tier = %customer.tier, "Customer registered");

    // Nine orders puts Alice one short of GOLD; the tenth promotes her.
    let span = tracing::info_span!("order_activity");
    async {
        publish(&system, tier_updated(customer.id, 9)).await?;
        wait_for_count(&system, customer.id, 9).await?;
        publish(&system, order_created(customer.id)).await?;
        wait_for_count(&system, customer.id, 10).await
    }
    .instrument(span)
    .await?;

    let promoted = system
        .admin
        .reconcile_by_increment(customer.id, 10)
        .await
        .map_err(|e| e.to_string())?;
    info!(order_count = promoted.order_count, tier = %promoted.tier, "Admin increment applied");
    if promoted.tier != Tier::Platinum {
        return Err(format!("expected PLATINUM, got {}", promoted.tier));
    }

    let stats = system.shutdown().await?;
    info!(?stats, "Demo finished");
    Ok(())
}

fn order_created(id: CustomerId) -> String {
    serde_json::json!({ "eventType": ORDER_CREATED, "customerId": id.0 }).to_string()
}

fn tier_updated(id: CustomerId, order_count: u32) -> String {
    serde_json::json!({
        "eventType": TIER_UPDATED,
        "customerId": id.0,
        "orderCount": order_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
    .to_string()
}

async fn publish(system: &TierSystem, payload: String) -> Result<(), String> {
    system
        .publisher
        .publish(payload)
        .await
        .map_err(|payload| format!("event source closed, dropped {payload}"))
}

async fn wait_for_count(system: &TierSystem, id: CustomerId, expected: u32) -> Result<(), String> {
    for _ in 0..100 {
        let customer = system.admin.customer(id).await.map_err(|e| e.to_string())?;
        if customer.order_count == expected {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Err(format!("{id} never reached {expected} orders"))
}
