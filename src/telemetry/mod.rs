//! Telemetry transport seam and connection lifecycle.
//!
//! The publish/subscribe wire protocol itself is an off-the-shelf
//! capability; the core consumes it through [`Transport`] and owns only
//! the connect/retry/backoff policy ([`connection::ConnectionManager`]),
//! the topic layout ([`topics::TopicSet`]), and the payload shapes
//! ([`payload`]).

pub mod connection;
pub mod payload;
pub mod topics;

use tracing::info;

use crate::error::Result;

pub use connection::{ConnectionManager, ConnectionState};

/// A message received from a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// UTF-8 payload.
    pub payload: String,
}

/// Connection + publish/subscribe primitive consumed by the core.
pub trait Transport {
    /// Open the broker connection.
    fn connect(&mut self) -> Result<()>;
    /// Drop the broker connection. Safe to call when already disconnected.
    fn disconnect(&mut self);
    /// Whether the connection is currently open.
    fn is_connected(&self) -> bool;
    /// Lightweight probe to detect a silently-dropped connection.
    fn probe_liveness(&mut self) -> bool;
    /// Publish a payload to a topic.
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<()>;
    /// Drain messages that arrived on subscribed topics since the last
    /// call. Invoked once per tick, before task dispatch.
    fn poll_incoming(&mut self) -> Vec<InboundMessage>;
}

/// Transport that logs every publish instead of talking to a broker.
///
/// Used by the simulator binary for bring-up without infrastructure.
#[derive(Debug, Default)]
pub struct LogTransport {
    connected: bool,
}

impl LogTransport {
    /// Create a disconnected log transport.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for LogTransport {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn probe_liveness(&mut self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<()> {
        info!(topic, retain, "{payload}");
        Ok(())
    }

    fn poll_incoming(&mut self) -> Vec<InboundMessage> {
        Vec::new()
    }
}
