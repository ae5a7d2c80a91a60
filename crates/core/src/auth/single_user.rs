//! Single-user access restriction.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that accepts exactly one user id.
pub struct SingleUserAuthenticator {
    allowed_user_id: u64,
}

impl SingleUserAuthenticator {
    pub fn new(allowed_user_id: u64) -> Self {
        Self { allowed_user_id }
    }

    pub fn allowed_user_id(&self) -> u64 {
        self.allowed_user_id
    }
}

#[async_trait]
impl Authenticator for SingleUserAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let user_id = request.user_id.ok_or(AuthError::NotAuthenticated)?;

        if user_id == self.allowed_user_id {
            Ok(Identity {
                user_id: Some(user_id),
                method: "single_user".to_string(),
            })
        } else {
            Err(AuthError::Forbidden(user_id))
        }
    }

    fn method_name(&self) -> &'static str {
        "single_user"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allowed_user_passes() {
        let auth = SingleUserAuthenticator::new(42);
        let identity = auth.authenticate(&AuthRequest::new(Some(42), 42)).await.unwrap();

        assert_eq!(identity.user_id, Some(42));
        assert_eq!(identity.method, "single_user");
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let auth = SingleUserAuthenticator::new(42);
        let result = auth.authenticate(&AuthRequest::new(Some(7), 7)).await;

        assert!(matches!(result, Err(AuthError::Forbidden(7))));
    }

    #[tokio::test]
    async fn test_missing_sender_is_rejected() {
        let auth = SingleUserAuthenticator::new(42);
        let result = auth.authenticate(&AuthRequest::new(None, -1001)).await;

        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_method_name() {
        let auth = SingleUserAuthenticator::new(1);
        assert_eq!(auth.method_name(), "single_user");
        assert_eq!(auth.allowed_user_id(), 1);
    }
}
