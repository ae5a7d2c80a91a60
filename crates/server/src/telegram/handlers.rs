//! Maps teloxide updates onto the engine's dispatcher.

use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::RequestError;
use tracing::{debug, warn};

use mediafetch_core::transport::MessageRef;
use mediafetch_core::{Dispatcher as ActionDispatcher, IncomingCallback, IncomingMessage};

use crate::metrics::{UPDATES_TOTAL, UPDATE_ERRORS_TOTAL};

/// Handler tree: text messages and callback queries, nothing else.
pub fn schema() -> UpdateHandler<RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback))
}

fn incoming_message(message: &Message) -> Option<IncomingMessage> {
    let text = message.text()?;
    Some(IncomingMessage {
        chat_id: message.chat.id.0,
        user_id: message.from.as_ref().map(|u| u.id.0),
        text: text.to_string(),
    })
}

fn incoming_callback(query: &CallbackQuery) -> Option<IncomingCallback> {
    let data = query.data.clone()?;
    let message = query
        .message
        .as_ref()
        .map(|m| MessageRef::new(m.chat().id.0, m.id().0));
    let chat_id = message
        .map(|m| m.chat_id)
        .unwrap_or(query.from.id.0 as i64);
    Some(IncomingCallback {
        id: query.id.clone(),
        chat_id,
        user_id: Some(query.from.id.0),
        message,
        data,
    })
}

// Work runs on its own task so a long download does not hold up the chat's
// other updates.

async fn on_message(message: Message, actions: Arc<ActionDispatcher>) -> ResponseResult<()> {
    let Some(incoming) = incoming_message(&message) else {
        debug!(chat_id = message.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    UPDATES_TOTAL.with_label_values(&["message"]).inc();
    tokio::spawn(async move {
        if let Err(e) = actions.handle_message(&incoming).await {
            UPDATE_ERRORS_TOTAL.with_label_values(&["message"]).inc();
            warn!(chat_id = incoming.chat_id, error = %e, "message handling failed");
        }
    });
    Ok(())
}

async fn on_callback(query: CallbackQuery, actions: Arc<ActionDispatcher>) -> ResponseResult<()> {
    let Some(incoming) = incoming_callback(&query) else {
        debug!(callback_id = %query.id, "ignoring callback without data");
        return Ok(());
    };
    UPDATES_TOTAL.with_label_values(&["callback"]).inc();
    tokio::spawn(async move {
        if let Err(e) = actions.handle_callback(&incoming).await {
            UPDATE_ERRORS_TOTAL.with_label_values(&["callback"]).inc();
            warn!(chat_id = incoming.chat_id, data = %incoming.data, error = %e, "callback handling failed");
        }
    });
    Ok(())
}
