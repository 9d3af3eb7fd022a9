//! Startup, wiring and shutdown.

pub mod tier_system;
pub mod tracing;

pub use tier_system::*;
pub use self::tracing::*;
