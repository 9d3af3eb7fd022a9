//! # Tier Reconciler
//!
//! Applies a new order-count observation to one customer and restores
//! `tier == Tier::for_order_count(order_count)`.
//!
//! Two entry points with different semantics:
//!
//! - [`TierReconciler::set_order_count`] replaces the count (tier-update events,
//!   administrative replace). [`TierReconciler::reconcile`] is the same operation.
//! - [`TierReconciler::add_orders`] adds to the stored count (order-created events,
//!   administrative increment).
//!
//! When neither the count nor the tier would change, nothing is written. A
//! persisted tier change emits exactly one [`Notification::TierChanged`]; a failed
//! notification is logged and does not fail the reconcile.
//!
//! Writes are last-write-wins against the store. There is no version check, so a
//! concurrent administrative edit and an event-driven reconcile for the same
//! customer race; the ingestor only serializes the event path.

use crate::clients::CustomerStore;
use crate::customer_actor::CustomerError;
use crate::model::{Customer, CustomerId, Tier};
use crate::notify::{Notification, Notifier};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct TierReconciler {
    store: Arc<dyn CustomerStore>,
    notifier: Arc<dyn Notifier>,
}

impl TierReconciler {
    pub fn new(store: Arc<dyn CustomerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Replace the customer's order count with `new_order_count`.
    pub async fn reconcile(
        &self,
        id: CustomerId,
        new_order_count: u32,
    ) -> Result<Customer, CustomerError> {
        self.set_order_count(id, new_order_count).await
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn set_order_count(
        &self,
        id: CustomerId,
        order_count: u32,
    ) -> Result<Customer, CustomerError> {
        let customer = self.load(id).await?;
        self.apply(customer, order_count).await
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn add_orders(&self, id: CustomerId, delta: u32) -> Result<Customer, CustomerError> {
        let customer = self.load(id).await?;
        let order_count = customer.order_count.checked_add(delta).ok_or_else(|| {
            CustomerError::InvalidInput(format!(
                "adding {delta} orders to {} overflows the order count",
                customer.order_count
            ))
        })?;
        self.apply(customer, order_count).await
    }

    async fn load(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        let customer = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;
        if !customer.active {
            return Err(CustomerError::Inactive(id));
        }
        Ok(customer)
    }

    async fn apply(&self, customer: Customer, order_count: u32) -> Result<Customer, CustomerError> {
        let target = Tier::for_order_count(order_count);
        if customer.order_count == order_count && customer.tier == target {
            debug!(order_count, tier = %target, "Already reconciled");
            return Ok(customer);
        }

        let previous = customer.tier;
        let mut next = customer;
        next.order_count = order_count;
        next.tier = target;
        let saved = self.store.save(next).await?;

        if previous == saved.tier {
            debug!(order_count, tier = %saved.tier, "Order count updated");
            return Ok(saved);
        }

        info!(order_count, from = %previous, tier = %saved.tier, "Tier changed");
        let notification = Notification::TierChanged {
            customer_id: saved.id,
            from: previous,
            to: saved.tier,
            order_count: saved.order_count,
        };
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %e, "Tier change notification failed");
        }
        Ok(saved)
    }
}
