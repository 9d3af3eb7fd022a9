//! # Customer Actor
//!
//! The in-memory Customer Store: a [`ResourceActor`] over [`Customer`] entities.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`Customer`]
//! - [`error`] - [`CustomerError`], shared by the store, the reconciler and the ingestor
//! - [`actions`] - [`CustomerAction`] (soft delete) and [`CustomerActionResult`]
//! - [`new()`] - Factory function that creates the actor and its client
//!
//! ## Usage
//!
//! ```rust
//! use loyalty_tier::customer_actor;
//! use loyalty_tier::model::CustomerCreate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, client) = customer_actor::new(32);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client
//!         .create_customer(CustomerCreate {
//!             name: "Alice".to_string(),
//!             email: "alice@example.com".to_string(),
//!         })
//!         .await?;
//!     assert_eq!(id.0, 1);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::CustomerClient;
use crate::framework::ResourceActor;
use crate::model::Customer;

/// Creates a new Customer actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Customer>, CustomerClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, CustomerClient::new(generic_client))
}
