//! Media fetch engine for a chat bot.
//!
//! A user sends a link; the engine acquires the media behind it with
//! external extractors, classifies and transcodes it, and delivers it
//! through a [`transport::Transport`], either directly or by browsing an
//! index of groups and posts.

pub mod acquire;
pub mod auth;
pub mod config;
pub mod converter;
pub mod dispatch;
pub mod index;
pub mod media;
pub mod metrics;
pub mod runner;
pub mod store;
pub mod testing;
pub mod transport;

pub use acquire::{AcquisitionPipeline, HttpFetcher, ReqwestFetcher};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
    SingleUserAuthenticator,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use converter::{Converter, FfmpegConverter};
pub use dispatch::{Dispatcher, IncomingCallback, IncomingMessage};
pub use media::MediaPipeline;
pub use runner::{CommandRunner, ProcessRunner};
pub use store::{JobStore, TokenStore};
pub use transport::{AlternateSender, Transport, TransportError};
