//! Store seams the reconciler and the scanner depend on.
//!
//! Both are implemented by [`CustomerClient`](crate::clients::CustomerClient); tests
//! can substitute either with anything else that satisfies the contract.

use crate::customer_actor::CustomerError;
use crate::model::{Customer, CustomerId};
use async_trait::async_trait;

/// Point reads and writes of single customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// `Ok(None)` when no such customer exists.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, CustomerError>;

    /// Persists every mutable field of `customer` (last write wins) and returns
    /// the stored record.
    async fn save(&self, customer: Customer) -> Result<Customer, CustomerError>;

    /// Soft delete or reactivate. Returns whether the flag changed.
    async fn set_active(&self, id: CustomerId, active: bool) -> Result<bool, CustomerError>;
}

/// Cursor-based enumeration in ascending id order.
#[async_trait]
pub trait CustomerEnumerator: Send + Sync {
    /// Up to `limit` customers with ids strictly greater than `after`.
    /// An empty page means the enumeration is complete.
    async fn page(
        &self,
        after: Option<CustomerId>,
        limit: usize,
    ) -> Result<Vec<Customer>, CustomerError>;
}
