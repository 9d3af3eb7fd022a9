//! # Administrative Path
//!
//! The synchronous surface an HTTP layer would sit on. Every call maps store and
//! reconciler failures to [`AdminError`], which carries the HTTP status it
//! corresponds to. Unexpected failures are logged in full and reported as a bare
//! [`AdminError::Internal`].

use crate::clients::{ActorClient, CustomerClient};
use crate::customer_actor::CustomerError;
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate};
use crate::reconciler::TierReconciler;
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdminError {
    #[error("Customer not found: {0}")]
    NotFound(CustomerId),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Customer is inactive: {0}")]
    Conflict(CustomerId),
    #[error("Service unavailable")]
    Unavailable,
    #[error("Internal error")]
    Internal,
}

impl AdminError {
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::NotFound(_) => 404,
            AdminError::InvalidInput(_) => 400,
            AdminError::Conflict(_) => 409,
            AdminError::Unavailable => 503,
            AdminError::Internal => 500,
        }
    }
}

impl From<CustomerError> for AdminError {
    fn from(e: CustomerError) -> Self {
        match e {
            CustomerError::NotFound(id) => AdminError::NotFound(id),
            CustomerError::Inactive(id) => AdminError::Conflict(id),
            CustomerError::InvalidInput(msg) => AdminError::InvalidInput(msg),
            CustomerError::StoreUnavailable(msg) => {
                error!(detail = %msg, "Customer store unavailable");
                AdminError::Unavailable
            }
            CustomerError::Unexpected(msg) => {
                error!(detail = %msg, "Unexpected failure");
                AdminError::Internal
            }
        }
    }
}

/// Contact fields an administrator may edit. Tier and order count are not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct TierAdmin {
    customers: CustomerClient,
    reconciler: TierReconciler,
}

impl TierAdmin {
    pub fn new(customers: CustomerClient, reconciler: TierReconciler) -> Self {
        Self {
            customers,
            reconciler,
        }
    }

    /// New customers start with no orders, `REGULAR`, active.
    #[instrument(skip(self))]
    pub async fn register_customer(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Customer, AdminError> {
        let id = self
            .customers
            .create_customer(CustomerCreate {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
        info!(customer_id = %id, "Customer registered");
        self.customer(id).await
    }

    pub async fn customer(&self, id: CustomerId) -> Result<Customer, AdminError> {
        self.customers
            .get(id)
            .await?
            .ok_or(AdminError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn update_contact(
        &self,
        id: CustomerId,
        contact: ContactUpdate,
    ) -> Result<Customer, AdminError> {
        let update = CustomerUpdate {
            name: contact.name,
            email: contact.email,
            ..CustomerUpdate::default()
        };
        Ok(self.customers.update_customer(id, update).await?)
    }

    /// Soft delete. Deactivating an inactive customer is a no-op.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: CustomerId) -> Result<(), AdminError> {
        let changed = self.customers.set_active(id, false).await?;
        if changed {
            info!(customer_id = %id, "Customer deactivated");
        }
        Ok(())
    }

    /// Replace the order count. Negative counts are rejected.
    pub async fn reconcile_by_replace(
        &self,
        id: CustomerId,
        order_count: i64,
    ) -> Result<Customer, AdminError> {
        let order_count = u32::try_from(order_count).map_err(|_| {
            AdminError::InvalidInput(format!("order count out of range: {order_count}"))
        })?;
        Ok(self.reconciler.set_order_count(id, order_count).await?)
    }

    /// Add `delta` orders. Negative deltas are rejected.
    pub async fn reconcile_by_increment(
        &self,
        id: CustomerId,
        delta: i64,
    ) -> Result<Customer, AdminError> {
        let delta = u32::try_from(delta)
            .map_err(|_| AdminError::InvalidInput(format!("delta out of range: {delta}")))?;
        Ok(self.reconciler.add_orders(id, delta).await?)
    }
}
