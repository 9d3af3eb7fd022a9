#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Loyalty Tier
//!
//! > **Keeps each customer's loyalty tier in step with their order activity.**
//!
//! A customer's tier is a pure function of their order count:
//! `REGULAR` below 10 orders, `GOLD` from 10, `PLATINUM` from 20. Order counts
//! arrive from two directions: an administrative API and an at-least-once stream of
//! order-activity events from the ordering system. Every write funnels through one
//! reconciler, and a periodic scan nudges customers who are one order away from
//! their next tier.
//!
//! ## 🏗️ Design
//!
//! ### The store is an actor
//! Customers live in a [`ResourceActor`](framework::ResourceActor): one Tokio task
//! owns the map and processes requests one at a time, so each single-customer
//! write is atomic without locks. Everything else holds a cheap, cloneable
//! [`CustomerClient`](clients::CustomerClient).
//!
//! ### Last write wins
//! The reconciler reads, recomputes and saves. There is no version check, so an
//! administrative edit can race an event for the same customer. The event path is
//! serialized per customer: the ingestor routes by `customer_id % partitions`.
//!
//! ### Failures are values
//! "Not found" is `Ok(None)` from the store and [`CustomerError::NotFound`](customer_actor::CustomerError::NotFound)
//! from the reconciler. The ingestor turns errors into a [`Disposition`](ingest::Disposition):
//! permanent ones are discarded, transient ones are retried and, when retries run
//! out, dead-lettered.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic actor runtime and its [`mock`](framework::mock) client.
//!
//! ### 2. The Data ([`model`], [`customer_actor`])
//! [`Customer`](model::Customer), the [`Tier`](model::Tier) policy, and the entity
//! implementation that turns the actor into the Customer Store.
//!
//! ### 3. The Interface ([`clients`])
//! [`CustomerClient`](clients::CustomerClient) and the two seams the core is written
//! against: [`CustomerStore`](clients::CustomerStore) and
//! [`CustomerEnumerator`](clients::CustomerEnumerator).
//!
//! ### 4. The Core ([`reconciler`], [`ingest`], [`scanner`], [`notify`])
//! - [`TierReconciler`](reconciler::TierReconciler) - replace or increment, then restore the tier
//! - [`EventIngestor`](ingest::EventIngestor) - parse, dispatch, retry, settle
//! - [`MilestoneScanner`](scanner::MilestoneScanner) - paginated promotion nudges
//!
//! ### 5. The Edges ([`admin`], [`config`], [`lifecycle`])
//! The synchronous admin surface, YAML/env configuration, and the
//! [`TierSystem`](lifecycle::TierSystem) that wires it all together.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod admin;
pub mod clients;
pub mod config;
pub mod customer_actor;
pub mod framework;
pub mod ingest;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod reconciler;
pub mod scanner;
