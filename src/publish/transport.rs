use crate::error::Result;
use async_trait::async_trait;

/// Message transport used to publish transition events.
///
/// The publisher is the only caller, so implementations need not be shared.
#[async_trait]
pub trait Transport: Send {
    /// Human-readable broker address for logs.
    fn endpoint(&self) -> String;

    /// Attempt a single connection to the broker.
    async fn connect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Service keepalive and drain pending protocol traffic.
    async fn poll(&mut self);

    /// Publish once, fire-and-forget. Returns whether the message was sent.
    async fn publish(&mut self, topic: &str, payload: &str) -> bool;
}
