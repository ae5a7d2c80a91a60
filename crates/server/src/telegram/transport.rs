//! Bot API implementation of the engine's transport.

use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use teloxide::RequestError;
use tracing::debug;

use mediafetch_core::transport::{
    Keyboard, MediaSource, MessageRef, Transport, TransportError, VideoHints,
};

/// Edits that change nothing are reported as errors by the platform.
const NOT_MODIFIED: &str = "message is not modified";

/// [`Transport`] backed by a teloxide [`Bot`].
///
/// Captions use HTML parse mode; plain texts are sent verbatim.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn input_file(source: &MediaSource) -> Result<InputFile, TransportError> {
    match source {
        MediaSource::Local(path) => Ok(InputFile::file(path.clone())),
        MediaSource::Remote(url) => Url::parse(url)
            .map(InputFile::url)
            .map_err(|e| TransportError::Rejected(format!("invalid url {}: {}", url, e))),
    }
}

fn map_error(error: RequestError) -> TransportError {
    match error {
        RequestError::Network(e) => TransportError::Network(e.to_string()),
        RequestError::Io(e) => TransportError::Network(e.to_string()),
        other => TransportError::from_message(other.to_string()),
    }
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef::new(message.chat.id.0, message.id.0)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        let message = request.await.map_err(map_error)?;
        Ok(message_ref(&message))
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.edit_message_text(
            ChatId(message.chat_id),
            MessageId(message.message_id),
            text,
        );
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        match request.await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().to_lowercase().contains(NOT_MODIFIED) => {
                debug!(message_id = message.message_id, "edit left message unchanged");
                Ok(())
            }
            Err(e) => Err(map_error(e)),
        }
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError> {
        let mut request = self.bot.send_photo(ChatId(chat_id), input_file(source)?);
        if let Some(caption) = caption {
            request = request.caption(caption).parse_mode(ParseMode::Html);
        }
        let message = request.await.map_err(map_error)?;
        Ok(message_ref(&message))
    }

    async fn send_video(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
        hints: &VideoHints,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let mut request = self
            .bot
            .send_video(ChatId(chat_id), input_file(source)?)
            .supports_streaming(hints.supports_streaming);
        if let Some(caption) = caption {
            request = request.caption(caption).parse_mode(ParseMode::Html);
        }
        if let Some(duration) = hints.duration_secs {
            request = request.duration(duration);
        }
        if let Some(width) = hints.width {
            request = request.width(width);
        }
        if let Some(height) = hints.height {
            request = request.height(height);
        }
        if let Some(ref thumbnail) = hints.thumbnail {
            if thumbnail.exists() {
                request = request.thumbnail(InputFile::file(thumbnail.clone()));
            }
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        let message = request.await.map_err(map_error)?;
        Ok(message_ref(&message))
    }

    async fn send_document(
        &self,
        chat_id: i64,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<MessageRef, TransportError> {
        let mut request = self
            .bot
            .send_document(ChatId(chat_id), input_file(source)?);
        if let Some(caption) = caption {
            request = request.caption(caption).parse_mode(ParseMode::Html);
        }
        let message = request.await.map_err(map_error)?;
        Ok(message_ref(&message))
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(map_error)?;
        Ok(())
    }
}
