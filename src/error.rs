//! Error types for skyclient
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

use crate::network::ConnectionState;
use crate::protocol::Tag;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for skyclient operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connect to {host}:{port} timed out after {timeout_ms} ms")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout_ms: u64,
    },

    #[error("Connection not ready (state: {0:?})")]
    NotReady(ConnectionState),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("No response within {0} ms")]
    ReadTimeout(u64),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol corruption: {0}")]
    ProtocolCorruption(String),

    #[error("Unsupported type tag '{}' ({:?})", .0.as_char(), .0)]
    UnsupportedType(Tag),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn corruption(message: impl Into<String>) -> Self {
        ClientError::ProtocolCorruption(message.into())
    }
}
