//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); the structured
//! fields carry the context instead.
//!
//! ## What Gets Traced
//!
//! - **Store**: actor startup and shutdown, creates, updates and actions
//! - **Reconciler**: a span per call with `customer_id`, tier changes at `info`
//! - **Ingestor**: discards and retries at `warn`, exhausted retries at `error`
//! - **Scanner**: one summary line per pass
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=loyalty_tier::ingest=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a promotion through the event path reads:
//!
//! ```text
//! INFO add_orders: Updated entity_type="Customer" id=customer_1
//! INFO add_orders: Tier changed order_count=10 from=REGULAR tier=GOLD
//! INFO Notification customer_id=customer_1 message="Congratulations! ..."
//! INFO Event applied customer_id=customer_1 event_type="CUSTOMER_ORDER_CREATED_EVENT" attempt=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
