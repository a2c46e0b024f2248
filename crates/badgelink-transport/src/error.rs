//! Error types for transport operations.
//!
//! This module defines error types specific to the serial transport layer,
//! covering capability probing, port opening, mid-session reads, and
//! teardown.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur during serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Host has no serial-stream capability.
    #[error("Serial transport unavailable: {message}")]
    Unavailable { message: String },

    /// Opening a port failed (no matching device, open rejected).
    #[error("Failed to open serial device: {message}")]
    OpenFailed { message: String },

    /// Stream read raised an error mid-session.
    #[error("Serial read failed: {message}")]
    ReadFailed { message: String },

    /// Operation on a port that is already closed.
    #[error("Serial port closed: {port}")]
    Closed { port: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new open-failed error.
    pub fn open_failed(message: impl Into<String>) -> Self {
        Self::OpenFailed {
            message: message.into(),
        }
    }

    /// Create a new read-failed error.
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }

    /// Create a new closed error.
    pub fn closed(port: impl Into<String>) -> Self {
        Self::Closed { port: port.into() }
    }
}
