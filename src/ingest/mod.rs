//! Consumption of order-activity events from the ordering system.
//!
//! - [`envelope`] - JSON decoding and validation into [`OrderActivityEvent`]
//! - [`source`] - [`EventSource`] trait and the in-process [`ChannelEventSource`]
//! - [`retry`] - [`RetryPolicy`]
//! - [`ingestor`] - [`EventIngestor`], the partitioned consumer

pub mod envelope;
pub mod ingestor;
pub mod retry;
pub mod source;

pub use envelope::*;
pub use ingestor::*;
pub use retry::*;
pub use source::*;
