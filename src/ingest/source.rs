//! Inbound event sources.
//!
//! An [`EventSource`] hands out tagged deliveries and is told how each one ended.
//! [`ChannelEventSource`] is the in-process implementation: producers publish
//! through an [`EventPublisher`], unsettled deliveries are tracked by tag, and
//! deliveries that failed processing are forwarded to a dead-letter receiver.

use super::ingestor::Disposition;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identifies one delivery for settlement.
pub type DeliveryTag = u64;

/// One message handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: DeliveryTag,
    pub payload: String,
}

/// A message whose processing failed after every retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub payload: String,
    pub error: String,
    pub attempts: u32,
}

/// At-least-once message source.
#[async_trait]
pub trait EventSource: Send {
    /// Next delivery, or `None` once the source is exhausted.
    ///
    /// Must be cancel safe: the consumer calls it inside `select!`.
    async fn recv(&mut self) -> Option<Delivery>;

    /// Reports how a delivery ended.
    fn settle(&mut self, tag: DeliveryTag, disposition: &Disposition);

    /// Stops accepting new messages. Deliveries already buffered are still
    /// returned by `recv`, which then yields `None`.
    fn close(&mut self);
}

#[async_trait]
impl<'a, S: EventSource + ?Sized> EventSource for &'a mut S {
    async fn recv(&mut self) -> Option<Delivery> {
        (**self).recv().await
    }

    fn settle(&mut self, tag: DeliveryTag, disposition: &Disposition) {
        (**self).settle(tag, disposition)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Producer side of a [`ChannelEventSource`].
#[derive(Debug, Clone)]
pub struct EventPublisher {
    channel: String,
    sender: mpsc::Sender<String>,
}

impl EventPublisher {
    /// Publishes one payload. Fails with the payload when the consumer is gone.
    pub async fn publish(&self, payload: impl Into<String>) -> Result<(), String> {
        let payload = payload.into();
        debug!(channel = %self.channel, %payload, "Publish");
        self.sender.send(payload).await.map_err(|e| e.0)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// In-memory named channel consumed by one consumer group.
pub struct ChannelEventSource {
    channel: String,
    group: String,
    receiver: mpsc::Receiver<String>,
    in_flight: HashMap<DeliveryTag, String>,
    next_tag: DeliveryTag,
    dead_letters: mpsc::UnboundedSender<DeadLetter>,
}

impl ChannelEventSource {
    /// Creates the source, its publisher, and the dead-letter receiver.
    pub fn new(
        channel: impl Into<String>,
        group: impl Into<String>,
        capacity: usize,
    ) -> (Self, EventPublisher, mpsc::UnboundedReceiver<DeadLetter>) {
        let channel = channel.into();
        let group = group.into();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        info!(%channel, %group, "Event source initialized");

        let source = Self {
            channel: channel.clone(),
            group,
            receiver,
            in_flight: HashMap::new(),
            next_tag: 1,
            dead_letters: dead_tx,
        };
        (source, EventPublisher { channel, sender }, dead_rx)
    }

    /// Deliveries handed out but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn recv(&mut self) -> Option<Delivery> {
        let payload = self.receiver.recv().await?;
        let tag = self.next_tag;
        self.next_tag += 1;
        self.in_flight.insert(tag, payload.clone());
        Some(Delivery { tag, payload })
    }

    fn settle(&mut self, tag: DeliveryTag, disposition: &Disposition) {
        let Some(payload) = self.in_flight.remove(&tag) else {
            warn!(channel = %self.channel, tag, "Settled unknown delivery");
            return;
        };
        if let Disposition::Failed { attempts, error } = disposition {
            let letter = DeadLetter {
                payload,
                error: error.to_string(),
                attempts: *attempts,
            };
            if self.dead_letters.send(letter).is_err() {
                warn!(channel = %self.channel, tag, "Dead-letter receiver dropped");
            }
        }
    }

    fn close(&mut self) {
        info!(channel = %self.channel, group = %self.group, "Event source closed");
        self.receiver.close();
    }
}
