use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sender is not identified")]
    NotAuthenticated,

    #[error("User {0} is not allowed to use this bot")]
    Forbidden(u64),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Decide whether the sender of an update may use the bot.
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
