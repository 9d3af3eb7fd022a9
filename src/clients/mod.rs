//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient),
//! and the store traits the rest of the crate is written against.

pub mod actor_client;
pub mod customer_client;
pub mod store;

pub use actor_client::*;
pub use customer_client::*;
pub use store::*;
