use loyalty_tier::admin::{AdminError, ContactUpdate};
use loyalty_tier::config::Config;
use loyalty_tier::lifecycle::TierSystem;
use loyalty_tier::model::{CustomerId, Tier};
use loyalty_tier::notify::{ChannelNotifier, Notification};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn drain(notifications: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut seen = Vec::new();
    while let Ok(n) = notifications.try_recv() {
        seen.push(n);
    }
    seen
}

async fn wait_for_count(system: &TierSystem, id: CustomerId, expected: u32) {
    for _ in 0..200 {
        let customer = system.admin.customer(id).await.expect("Failed to get customer");
        if customer.order_count == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{id} never reached {expected} orders");
}

/// Full end-to-end test: admin path and event path against the real store.
#[tokio::test(start_paused = true)]
async fn test_full_tier_system_integration() {
    let (notifier, mut notifications) = ChannelNotifier::new();
    let system = TierSystem::start(&Config::default(), Arc::new(notifier));

    // Register through the admin path
    let alice = system
        .admin
        .register_customer("Alice", "alice@example.com")
        .await
        .expect("Failed to register customer");
    assert_eq!(alice.order_count, 0);
    assert_eq!(alice.tier, Tier::Regular);
    assert!(alice.active);

    // Absolute count from the ordering system
    system
        .publisher
        .publish(format!(
            r#"{{"eventType":"CUSTOMER_TIER_UPDATED_EVENT","customerId":{},"orderCount":9,"timestamp":"2024-05-01T10:15:00"}}"#,
            alice.id.0
        ))
        .await
        .unwrap();
    wait_for_count(&system, alice.id, 9).await;

    // One more order crosses into GOLD
    system
        .publisher
        .publish(format!(
            r#"{{"eventType":"CUSTOMER_ORDER_CREATED_EVENT","customerId":{}}}"#,
            alice.id.0
        ))
        .await
        .unwrap();
    wait_for_count(&system, alice.id, 10).await;
    assert_eq!(system.admin.customer(alice.id).await.unwrap().tier, Tier::Gold);

    // Admin increment into PLATINUM
    let alice_now = system
        .admin
        .reconcile_by_increment(alice.id, 10)
        .await
        .expect("Failed to increment");
    assert_eq!((alice_now.order_count, alice_now.tier), (20, Tier::Platinum));

    let changes: Vec<(Tier, Tier)> = drain(&mut notifications)
        .into_iter()
        .filter_map(|n| match n {
            Notification::TierChanged { from, to, .. } => Some((from, to)),
            Notification::PromotionNudge { .. } => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![(Tier::Regular, Tier::Gold), (Tier::Gold, Tier::Platinum)]
    );

    // Contact edits never touch the tier
    let edited = system
        .admin
        .update_contact(
            alice.id,
            ContactUpdate {
                name: Some("Alice Liddell".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.name, "Alice Liddell");
    assert_eq!(edited.tier, Tier::Platinum);

    // Events for unknown or deactivated customers are dropped, not retried
    let bob = system
        .admin
        .register_customer("Bob", "bob@example.com")
        .await
        .unwrap();
    system.admin.deactivate(bob.id).await.unwrap();
    for id in [bob.id.0, 9_999] {
        system
            .publisher
            .publish(format!(
                r#"{{"eventType":"CUSTOMER_ORDER_CREATED_EVENT","customerId":{id}}}"#
            ))
            .await
            .unwrap();
    }
    assert_eq!(
        system.admin.reconcile_by_replace(bob.id, 30).await.unwrap_err(),
        AdminError::Conflict(bob.id)
    );
    assert_eq!(
        system.admin.customer(CustomerId(9_999)).await.unwrap_err(),
        AdminError::NotFound(CustomerId(9_999))
    );

    let stats = system.shutdown().await.expect("Shutdown failed");
    assert!(stats.acked >= 2);
    assert_eq!(stats.failed, 0);
}

/// Events published right before shutdown are processed, not dropped.
#[tokio::test(start_paused = true)]
async fn test_shutdown_settles_every_published_event() {
    let (notifier, _notifications) = ChannelNotifier::new();
    let system = TierSystem::start(&Config::default(), Arc::new(notifier));

    let carol = system
        .admin
        .register_customer("Carol", "carol@example.com")
        .await
        .unwrap();
    for _ in 0..20 {
        system
            .publisher
            .publish(format!(
                r#"{{"eventType":"CUSTOMER_ORDER_CREATED_EVENT","customerId":{}}}"#,
                carol.id.0
            ))
            .await
            .unwrap();
    }

    let stats = system.shutdown().await.expect("Shutdown failed");
    assert_eq!(stats.received, 20);
    assert_eq!(stats.acked, 20);
    assert_eq!(stats.received, stats.acked + stats.discarded + stats.failed);
}

/// The periodic scan nudges exactly the customers one order short of a tier.
#[tokio::test(start_paused = true)]
async fn test_scheduled_scan_nudges_customers_at_nine_and_nineteen() {
    let (notifier, mut notifications) = ChannelNotifier::new();
    let system = TierSystem::start(&Config::default(), Arc::new(notifier));

    for count in [8, 9, 10, 19, 20] {
        let customer = system
            .admin
            .register_customer(&format!("c{count}"), "c@example.com")
            .await
            .unwrap();
        system
            .admin
            .reconcile_by_replace(customer.id, count)
            .await
            .unwrap();
    }
    let inactive = system
        .admin
        .register_customer("gone", "gone@example.com")
        .await
        .unwrap();
    system.admin.reconcile_by_replace(inactive.id, 9).await.unwrap();
    system.admin.deactivate(inactive.id).await.unwrap();

    // Let the startup scan finish, then forget everything seen so far.
    tokio::time::sleep(Duration::from_secs(1)).await;
    drain(&mut notifications);

    tokio::time::sleep(Duration::from_secs(300)).await;
    let mut nudged: Vec<(u32, Tier)> = drain(&mut notifications)
        .into_iter()
        .filter_map(|n| match n {
            Notification::PromotionNudge {
                order_count,
                next_tier,
                ..
            } => Some((order_count, next_tier)),
            Notification::TierChanged { .. } => None,
        })
        .collect();
    nudged.sort();
    assert_eq!(nudged, vec![(9, Tier::Gold), (19, Tier::Platinum)]);

    system.shutdown().await.expect("Shutdown failed");
}
