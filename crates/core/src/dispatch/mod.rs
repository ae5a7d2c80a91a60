//! Interactive action dispatcher.
//!
//! Inbound links become pending jobs with a mode menu. Button presses carry
//! compact colon-separated payloads (see [`Callback`]) that drive
//! acquisition, direct delivery, index browsing and per-item re-delivery.

mod callback;
mod config;
mod dispatcher;
mod error;
pub mod menus;
pub mod messages;

pub use callback::{Callback, CallbackParseError, PreMode, MAX_CALLBACK_BYTES};
pub use config::DispatchConfig;
pub use dispatcher::{is_url, Dispatcher, IncomingCallback, IncomingMessage};
pub use error::DispatchError;
