//! Mock chat transport for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transport::{Keyboard, MediaSource, MessageRef, Transport, TransportError, VideoHints};

/// Which transport method a call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Text,
    Edit,
    Photo,
    Video,
    Document,
    Answer,
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat_id: i64,
        source: MediaSource,
        caption: Option<String>,
    },
    Video {
        chat_id: i64,
        source: MediaSource,
        caption: Option<String>,
        hints: VideoHints,
        keyboard: Option<Keyboard>,
    },
    Document {
        chat_id: i64,
        source: MediaSource,
        caption: Option<String>,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

impl TransportCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::Text { .. } => CallKind::Text,
            Self::Edit { .. } => CallKind::Edit,
            Self::Photo { .. } => CallKind::Photo,
            Self::Video { .. } => CallKind::Video,
            Self::Document { .. } => CallKind::Document,
            Self::Answer { .. } => CallKind::Answer,
        }
    }

    /// Message text, for text sends and edits.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } | Self::Edit { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Media source, for photo, video and document sends.
    pub fn source(&self) -> Option<&MediaSource> {
        match self {
            Self::Photo { source, .. }
            | Self::Video { source, .. }
            | Self::Document { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Text { keyboard, .. }
            | Self::Edit { keyboard, .. }
            | Self::Video { keyboard, .. } => keyboard.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct MockTransportState {
    /// Every call with whether it succeeded.
    calls: Vec<(TransportCall, bool)>,
    failures: HashMap<CallKind, VecDeque<TransportError>>,
    next_message_id: i32,
}

/// Mock implementation of the Transport trait.
///
/// Records every call. Failures are scripted per call kind and consumed in
/// order; local media that does not exist at send time is rejected, which
/// catches files deleted before they were delivered.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<RwLock<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `kind` fail with `error`.
    pub async fn fail_next(&self, kind: CallKind, error: TransportError) {
        self.state
            .write()
            .await
            .failures
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Every call so far, including failed ones.
    pub async fn calls(&self) -> Vec<TransportCall> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    /// Calls that succeeded.
    pub async fn delivered(&self) -> Vec<TransportCall> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(call, _)| call.clone())
            .collect()
    }

    /// Successful calls of one kind.
    pub async fn delivered_of(&self, kind: CallKind) -> Vec<TransportCall> {
        self.delivered()
            .await
            .into_iter()
            .filter(|c| c.kind() == kind)
            .collect()
    }

    /// Texts of every successful send and edit, in order.
    pub async fn texts(&self) -> Vec<String> {
        self.delivered()
            .await
            .iter()
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }

    pub async fn call_count(&self) -> usize {
        self.state.read().await.calls.len()
    }

    async fn record(&self, call: TransportCall) -> Result<MessageRef, TransportError> {
        let mut state = self.state.write().await;
        let kind = call.kind();

        let mut outcome = state
            .failures
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .map_or(Ok(()), Err);
        if let Some(MediaSource::Local(path)) = call.source() {
            if outcome.is_ok() && !path.exists() {
                outcome = Err(TransportError::Rejected(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
        }

        let chat_id = match &call {
            TransportCall::Text { chat_id, .. }
            | TransportCall::Photo { chat_id, .. }
            | TransportCall::Video { chat_id, .. }
            | TransportCall::Document { chat_id, .. } => *chat_id,
            TransportCall::Edit { message, .. } => message.chat_id,
            TransportCall::Answer { .. } => 0,
        };

        state.calls.push((call, outcome.is_ok()));
        outcome?;
        state.next_message_id += 1;
        Ok(MessageRef::new(chat_id, state.next_message_id))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.record(TransportCall::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
        .await
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Edit {
            message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
        .await
        .map(|_| ())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError> {
        self.record(TransportCall::Photo {
            chat_id,
            source: source.clone(),
            caption: caption.map(str::to_string),
        })
        .await
    }

    async fn send_video(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
        hints: &VideoHints,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.record(TransportCall::Video {
            chat_id,
            source: source.clone(),
            caption: caption.map(str::to_string),
            hints: hints.clone(),
            keyboard: keyboard.cloned(),
        })
        .await
    }

    async fn send_document(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError> {
        self.record(TransportCall::Document {
            chat_id,
            source: source.clone(),
            caption: caption.map(str::to_string),
        })
        .await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_records_and_scripts_failures() {
        let transport = MockTransport::new();
        transport
            .fail_next(CallKind::Text, TransportError::Network("down".into()))
            .await;

        assert!(transport.send_text(1, "first", None).await.is_err());
        let sent = transport.send_text(1, "second", None).await.unwrap();
        assert_eq!(sent.chat_id, 1);

        assert_eq!(transport.call_count().await, 2);
        assert_eq!(transport.texts().await, vec!["second"]);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_rejected() {
        let transport = MockTransport::new();
        let source = MediaSource::Local(PathBuf::from("/no/such/file.jpg"));
        let err = transport.send_photo(1, &source, None).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));

        let remote = MediaSource::Remote("https://x/a.jpg".into());
        assert!(transport.send_photo(1, &remote, None).await.is_ok());
        assert_eq!(transport.delivered_of(CallKind::Photo).await.len(), 1);
    }
}
