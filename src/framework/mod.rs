//! Generic actor framework the in-memory Customer Store runs on.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that stored resource types implement
//! - [`ResourceActor`] - Generic actor that owns the entities
//! - [`ResourceClient`] - Type-safe handle for sending requests to the actor
//! - [`FrameworkError`] - Plumbing errors
//!
//! # Testing
//!
//! See [`mock`] for an expectation-driven client that needs no real actor.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
