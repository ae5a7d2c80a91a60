use serde::{Deserialize, Serialize};

/// Sender information for an inbound message or callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequest {
    /// Sending user, absent for channel posts and anonymous admins.
    pub user_id: Option<u64>,
    /// Chat the update arrived in.
    pub chat_id: i64,
}

impl AuthRequest {
    pub fn new(user_id: Option<u64>, chat_id: i64) -> Self {
        Self { user_id, chat_id }
    }
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Option<u64>,
    pub method: String,
}

impl Identity {
    pub fn anonymous(user_id: Option<u64>) -> Self {
        Self {
            user_id,
            method: "none".to_string(),
        }
    }
}
