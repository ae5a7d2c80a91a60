//! Telegram Bot API adapter.

mod handlers;
mod transport;

pub use handlers::schema;
pub use transport::TelegramTransport;
