//! Outbound customer notifications.
//!
//! The reconciler announces persisted tier changes and the milestone scanner nudges
//! customers who are one order short of a promotion. Delivery is behind the
//! [`Notifier`] trait; [`LogNotifier`] writes to the log and [`ChannelNotifier`]
//! hands notifications to whoever holds the receiving end.

use crate::model::{CustomerId, Tier};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Something worth telling a customer about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A reconcile persisted a new tier.
    TierChanged {
        customer_id: CustomerId,
        from: Tier,
        to: Tier,
        order_count: u32,
    },
    /// The customer is exactly one order away from `next_tier`.
    PromotionNudge {
        customer_id: CustomerId,
        order_count: u32,
        next_tier: Tier,
    },
}

impl Notification {
    pub fn customer_id(&self) -> CustomerId {
        match self {
            Notification::TierChanged { customer_id, .. }
            | Notification::PromotionNudge { customer_id, .. } => *customer_id,
        }
    }

    /// Customer-facing text.
    pub fn message(&self) -> String {
        match self {
            Notification::TierChanged { to, order_count, .. } => format!(
                "Congratulations! With {order_count} orders you are now a {to} customer."
            ),
            Notification::PromotionNudge { order_count, .. } => format!(
                "You have placed {order_count} orders with us. Buy one more and you will be promoted!"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel closed")]
    ChannelClosed,
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery of [`Notification`]s. Failures are reported, never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Writes every notification to the log at info level.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            customer_id = %notification.customer_id(),
            message = %notification.message(),
            "Notification"
        );
        Ok(())
    }
}

/// Forwards notifications to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sender
            .send(notification)
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nudge_message() {
        let nudge = Notification::PromotionNudge {
            customer_id: CustomerId(7),
            order_count: 9,
            next_tier: Tier::Gold,
        };
        assert_eq!(
            nudge.message(),
            "You have placed 9 orders with us. Buy one more and you will be promoted!"
        );
        assert_eq!(nudge.customer_id(), CustomerId(7));
    }

    #[tokio::test]
    async fn test_channel_notifier_reports_closed_receiver() {
        let (notifier, mut receiver) = ChannelNotifier::new();
        let change = Notification::TierChanged {
            customer_id: CustomerId(1),
            from: Tier::Regular,
            to: Tier::Gold,
            order_count: 10,
        };
        notifier.notify(change.clone()).await.unwrap();
        assert_eq!(receiver.recv().await, Some(change.clone()));

        drop(receiver);
        let err = notifier.notify(change).await.unwrap_err();
        assert!(matches!(err, NotifyError::ChannelClosed));
    }
}
