use crate::model::Tier;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl From<u32> for CustomerId {
    fn from(id: u32) -> Self {
        Self(u64::from(id))
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "customer_{}", self.0)
    }
}

/// Represents a customer record as held by the Customer Store.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](crate::framework::ActorEntity) trait,
/// allowing it to be managed by a [`ResourceActor`](crate::framework::ResourceActor).
///
/// See [`impl ActorEntity for Customer`](#impl-ActorEntity-for-Customer) for details on:
/// - Creation parameters ([`CustomerCreate`])
/// - Update parameters ([`CustomerUpdate`])
/// - Custom actions ([`CustomerAction`](crate::customer_actor::CustomerAction))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub order_count: u32,
    /// Always `Tier::for_order_count(order_count)` once a reconcile completes.
    pub tier: Tier,
    /// Soft-delete flag. Inactive customers stay readable.
    pub active: bool,
}

impl Customer {
    /// A freshly registered customer: no orders, `REGULAR`, active.
    pub fn new(id: CustomerId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            order_count: 0,
            tier: Tier::Regular,
            active: true,
        }
    }

    /// Builder-style helper, mostly for tests and fixtures.
    pub fn with_order_count(mut self, order_count: u32) -> Self {
        self.order_count = order_count;
        self.tier = Tier::for_order_count(order_count);
        self
    }
}

/// Payload for registering a new customer.
#[derive(Debug, Clone)]
pub struct CustomerCreate {
    pub name: String,
    pub email: String,
}

/// Payload for updating an existing customer. `None` leaves a field untouched.
///
/// `active` is not here: soft delete goes through
/// [`CustomerAction::SetActive`](crate::customer_actor::CustomerAction::SetActive).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub order_count: Option<u32>,
    pub tier: Option<Tier>,
}

impl From<&Customer> for CustomerUpdate {
    /// Full upsert of every mutable field.
    fn from(customer: &Customer) -> Self {
        Self {
            name: Some(customer.name.clone()),
            email: Some(customer.email.clone()),
            order_count: Some(customer.order_count),
            tier: Some(customer.tier),
        }
    }
}
