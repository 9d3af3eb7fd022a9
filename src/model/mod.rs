//! Pure data structures implementing the [`ActorEntity`](crate::framework::ActorEntity) trait,
//! plus the tier policy they are derived by.

pub mod customer;
pub mod tier;

pub use customer::*;
pub use tier::*;
