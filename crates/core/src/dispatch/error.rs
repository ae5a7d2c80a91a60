//! Error types for the dispatcher.

use thiserror::Error;

use crate::acquire::AcquireError;
use crate::transport::TransportError;

/// Errors that abort handling of one message or callback.
///
/// Turned into a chat message at the dispatcher boundary; never fatal.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Download failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
