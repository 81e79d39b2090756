//! Connection lifecycle management.
//!
//! Guarantees that gated tasks observe a connected transport or are
//! skipped cleanly for the whole tick. Within one `ensure_connected` call
//! the retry budget is bounded; across calls the manager backs off
//! exponentially instead of halting, so persistent broker loss leaves the
//! node in a recoverable `Disconnected` state rather than requiring an
//! external reset.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{NodeError, Result};
use crate::telemetry::Transport;

/// Transport connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No broker connection.
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// Connection open and passing liveness probes.
    Connected,
}

/// Callback used to wait between in-call connect attempts.
///
/// The wait blocks the whole device by design (cooperative model); tests
/// substitute a recording stub.
pub type SleepFn = Box<dyn FnMut(Duration) + Send>;

/// Owns the connect/retry/backoff policy for the transport.
pub struct ConnectionManager {
    state: ConnectionState,
    retry_budget: u32,
    retry_delay: Duration,
    max_backoff: Duration,
    /// Cross-call backoff applied after an exhausted retry budget.
    backoff: Duration,
    /// Earliest instant the next connect sequence may start.
    next_attempt_at: Option<Instant>,
    sleep: SleepFn,
}

impl ConnectionManager {
    /// Create a manager with the given policy.
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retry_budget: config.retry_budget.max(1),
            retry_delay: config.retry_delay(),
            max_backoff: config.max_backoff(),
            backoff: config.retry_delay(),
            next_attempt_at: None,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the inter-attempt wait. Used by tests.
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Ensure the transport is connected, or say why gated work must be
    /// skipped this tick.
    ///
    /// - Connected: runs a liveness probe; a failed probe forces
    ///   `Disconnected` and returns [`NodeError::Transport`]. The next
    ///   call attempts a reconnect immediately.
    /// - Disconnected: runs up to the retry budget of connect attempts
    ///   with a fixed delay between them. Exhaustion surfaces
    ///   [`NodeError::ConnectFailed`] carrying the last transport error,
    ///   exactly once per call, and opens a backoff window that doubles
    ///   on each exhausted call up to the configured cap.
    pub fn ensure_connected(&mut self, now: Instant, transport: &mut dyn Transport) -> Result<()> {
        if self.state == ConnectionState::Connected {
            if transport.probe_liveness() {
                return Ok(());
            }
            warn!("liveness probe failed, forcing disconnect");
            transport.disconnect();
            self.state = ConnectionState::Disconnected;
            return Err(NodeError::Transport("liveness probe failed".to_owned()));
        }

        if let Some(at) = self.next_attempt_at {
            if now < at {
                debug!("reconnect backoff open for {:?} more", at - now);
                return Err(NodeError::Transport("reconnect backoff open".to_owned()));
            }
            self.next_attempt_at = None;
        }

        self.state = ConnectionState::Connecting;
        let mut last_err = String::new();
        for attempt in 1..=self.retry_budget {
            match transport.connect() {
                Ok(()) => {
                    info!(attempt, "transport connected");
                    self.state = ConnectionState::Connected;
                    self.backoff = self.retry_delay;
                    self.next_attempt_at = None;
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, "connect attempt failed: {e}");
                    transport.disconnect();
                    // Keep the underlying message so ConnectFailed's
                    // Display does not nest the Transport wrapper.
                    last_err = match e {
                        NodeError::Transport(msg) => msg,
                        other => other.to_string(),
                    };
                    if attempt < self.retry_budget && !self.retry_delay.is_zero() {
                        (self.sleep)(self.retry_delay);
                    }
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        self.next_attempt_at = Some(now + self.backoff);
        self.backoff = (self.backoff * 2).min(self.max_backoff);
        Err(NodeError::ConnectFailed(last_err))
    }
}
