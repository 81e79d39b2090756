//! Error types for the sensor node core.

/// Top-level error type for the node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Transport unavailable for this tick (liveness probe failed or a
    /// reconnect backoff window is still open).
    #[error("transport error: {0}")]
    Transport(String),

    /// Connect retry budget exhausted; carries the last underlying
    /// transport error.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Sensor read or calibration error.
    #[error("sensor error: {0}")]
    Sensor(String),

    /// Calibration store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Task registration or dispatch error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NodeError>;
