//! Chat transport boundary.
//!
//! The engine talks to the chat platform only through [`Transport`]; the
//! concrete adapter lives in the server crate. [`AlternateSender`] is the
//! subprocess-backed fallback for payloads the bot API refuses.

mod alternate;
mod traits;
mod types;

pub use alternate::{AlternateConfig, AlternateSender};
pub use traits::{Transport, TransportError};
pub use types::{InlineButton, Keyboard, MediaSource, MessageRef, VideoHints};
