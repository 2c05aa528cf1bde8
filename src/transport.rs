#![cfg(feature = "runtime")]

use tokio::sync::mpsc;

use crate::protocol::{OutboundMessage, RemoteEvent};

/// Channel to the session authority. Implementations only move records;
/// decoding problems in a single frame are not fatal.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: OutboundMessage) -> anyhow::Result<()>;
    /// Next record from the authority. An error means the channel is gone.
    async fn recv(&mut self) -> anyhow::Result<RemoteEvent>;
}

/// Client end of an in-process channel. Frames travel as JSON text so the
/// same decoding rules apply as on a real connection.
pub struct InMemoryTransport {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Authority end of an [`InMemoryTransport`] pair, driven by tests or a
/// local stand-in server.
pub struct AuthorityEnd {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, AuthorityEnd) {
        let (to_client, from_authority) = mpsc::unbounded_channel();
        let (to_authority, from_client) = mpsc::unbounded_channel();
        (
            Self {
                inbound: from_authority,
                outbound: to_authority,
            },
            AuthorityEnd {
                outbound: to_client,
                inbound: from_client,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, msg: OutboundMessage) -> anyhow::Result<()> {
        let frame = msg.to_json()?;
        self.outbound
            .send(frame)
            .map_err(|_| anyhow::anyhow!("authority hung up"))
    }

    async fn recv(&mut self) -> anyhow::Result<RemoteEvent> {
        loop {
            let frame = self
                .inbound
                .recv()
                .await
                .ok_or_else(|| anyhow::anyhow!("channel closed"))?;
            match RemoteEvent::from_json(&frame) {
                Ok(event) => return Ok(event),
                Err(e) => log::warn!("dropping malformed frame: {}", e),
            }
        }
    }
}

impl AuthorityEnd {
    /// Deliver a record to the client.
    pub fn send_event(&self, event: &RemoteEvent) -> anyhow::Result<()> {
        self.send_raw(serde_json::to_string(event)?)
    }

    /// Deliver raw text, for records the typed enum cannot express.
    pub fn send_raw(&self, frame: impl Into<String>) -> anyhow::Result<()> {
        self.outbound
            .send(frame.into())
            .map_err(|_| anyhow::anyhow!("client hung up"))
    }

    /// Next request from the client, `None` once it has gone.
    pub async fn recv_message(&mut self) -> Option<anyhow::Result<OutboundMessage>> {
        let frame = self.inbound.recv().await?;
        Some(serde_json::from_str(&frame).map_err(Into::into))
    }
}
