use fingerlink_hardware::StatusCode;
use fingerlink_network::{NetworkError, TransportError};
use thiserror::Error;

/// Errors that stop the node from running.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The sensor did not pass the boot handshake.
    #[error("Fingerprint sensor unavailable: {0}")]
    SensorUnavailable(StatusCode),

    #[error(transparent)]
    Config(#[from] fingerlink_core::Error),

    #[error("Failed to read configuration {path}: {message}")]
    ConfigFile { path: String, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every unit stopped without asking for a restart.
    #[error("All node units stopped without a restart request")]
    Stopped,
}

/// Why one report could not be delivered.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The link is down for good; a restart is pending.
    #[error("Link unavailable: {0}")]
    Offline(#[from] NetworkError),

    /// The request got no response.
    #[error("Report not delivered: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, NodeError>;
