//! [`ActorEntity`] implementation for the [`Customer`] domain type.
//!
//! This is what turns a plain [`ResourceActor`](crate::framework::ResourceActor) into
//! the in-memory Customer Store. The entity knows nothing about tiers beyond storing
//! the fields it is given; keeping `tier` in step with `order_count` is the
//! reconciler's job.

use super::actions::{CustomerAction, CustomerActionResult};
use super::error::CustomerError;
use crate::framework::ActorEntity;
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate};
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Customer {
    type Id = CustomerId;
    type Create = CustomerCreate;
    type Update = CustomerUpdate;
    type Action = CustomerAction;
    type ActionResult = CustomerActionResult;
    type Context = ();
    type Error = CustomerError;

    /// Registers a customer with no orders, `REGULAR` tier, active.
    fn from_create_params(id: CustomerId, params: CustomerCreate) -> Result<Self, Self::Error> {
        if params.name.trim().is_empty() {
            return Err(CustomerError::InvalidInput("name must not be empty".into()));
        }
        Ok(Customer::new(id, params.name, params.email))
    }

    /// Applies every field present in the update.
    async fn on_update(&mut self, update: CustomerUpdate, _ctx: &()) -> Result<(), Self::Error> {
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(CustomerError::InvalidInput("name must not be empty".into()));
            }
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(order_count) = update.order_count {
            self.order_count = order_count;
        }
        if let Some(tier) = update.tier {
            self.tier = tier;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: CustomerAction,
        _ctx: &(),
    ) -> Result<CustomerActionResult, Self::Error> {
        match action {
            CustomerAction::SetActive(active) => {
                let changed = self.active != active;
                self.active = active;
                Ok(CustomerActionResult::SetActive { changed })
            }
        }
    }
}
