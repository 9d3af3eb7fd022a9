//! Decoding of inbound order-activity messages.
//!
//! ```json
//! { "eventType": "CUSTOMER_TIER_UPDATED_EVENT", "customerId": 42,
//!   "orderCount": 12, "timestamp": "2024-05-01T10:15:00", "data": null }
//! ```

use crate::model::CustomerId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A customer placed one more order. `orderCount` is ignored.
pub const ORDER_CREATED: &str = "CUSTOMER_ORDER_CREATED_EVENT";

/// The ordering system reports the customer's absolute order count.
pub const TIER_UPDATED: &str = "CUSTOMER_TIER_UPDATED_EVENT";

/// Why a message was dropped without being retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscardReason {
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("unrecognized event type: {0}")]
    UnrecognizedType(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),
    #[error("customer inactive: {0}")]
    CustomerInactive(CustomerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Increment the order count by one.
    OrderCreated,
    /// Replace the order count.
    TierUpdated { order_count: u32 },
}

/// A parsed, validated order-activity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderActivityEvent {
    pub customer_id: CustomerId,
    pub kind: EventKind,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    event_type: String,
    customer_id: u64,
    #[serde(default)]
    order_count: Option<i64>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    data: Option<Value>,
}

impl OrderActivityEvent {
    /// Decodes and validates one message payload.
    pub fn parse(payload: &str) -> Result<Self, DiscardReason> {
        let envelope: Envelope =
            serde_json::from_str(payload).map_err(|e| DiscardReason::Malformed(e.to_string()))?;

        let kind = match envelope.event_type.as_str() {
            ORDER_CREATED => EventKind::OrderCreated,
            TIER_UPDATED => {
                let raw = envelope.order_count.ok_or_else(|| {
                    DiscardReason::InvalidInput("orderCount is required".to_string())
                })?;
                let order_count = u32::try_from(raw).map_err(|_| {
                    DiscardReason::InvalidInput(format!("orderCount out of range: {raw}"))
                })?;
                EventKind::TierUpdated { order_count }
            }
            other => return Err(DiscardReason::UnrecognizedType(other.to_string())),
        };

        let timestamp = envelope
            .timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(Self {
            customer_id: CustomerId(envelope.customer_id),
            kind,
            timestamp,
        })
    }

    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::OrderCreated => ORDER_CREATED,
            EventKind::TierUpdated { .. } => TIER_UPDATED,
        }
    }
}

/// RFC 3339, or an ISO-8601 local date-time taken as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DiscardReason> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| DiscardReason::Malformed(format!("bad timestamp {raw:?}: {e}")))
}
