use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that lets every sender through.
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous(request.user_id))
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_authenticator_accepts_anyone() {
        let auth = NoneAuthenticator::new();

        let identity = auth
            .authenticate(&AuthRequest::new(Some(99), 99))
            .await
            .unwrap();
        assert_eq!(identity.user_id, Some(99));
        assert_eq!(identity.method, "none");

        let identity = auth.authenticate(&AuthRequest::new(None, -100)).await.unwrap();
        assert_eq!(identity.user_id, None);
    }

    #[test]
    fn test_none_authenticator_method_name() {
        assert_eq!(NoneAuthenticator::default().method_name(), "none");
    }
}
