//! Trait definitions for the chat transport.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Keyboard, MediaSource, MessageRef, VideoHints};

/// Errors reported by the chat transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The payload exceeds the platform's size limit.
    #[error("Payload too large: {0}")]
    TooLarge(String),

    /// The platform refused the request for another reason.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The request did not reach the platform or the reply was lost.
    #[error("Network error: {0}")]
    Network(String),
}

impl TransportError {
    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::TooLarge(_))
    }

    /// Classifies a free-form error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("too big") || lower.contains("too large") || lower.contains("413") {
            Self::TooLarge(message)
        } else {
            Self::Rejected(message)
        }
    }
}

/// Outbound side of the chat platform.
///
/// Captions are HTML formatted; plain message text is sent as-is.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    async fn send_photo(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError>;

    async fn send_video(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
        hints: &VideoHints,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    async fn send_document(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError>;

    /// Acknowledges a callback query, optionally with a toast.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}
