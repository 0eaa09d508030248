//! Authentication service for API bearer sessions.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::CallerIdentity;
use crate::domain::repositories::SessionRepository;
use crate::error::AppError;
use crate::utils::token::hash_session_token;

/// Resolves bearer credentials to caller identities.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// lookup. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService {
    sessions: Arc<dyn SessionRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `sessions` - session repository
    /// - `signing_secret` - HMAC key; must match the value used when sessions were issued
    pub fn new(sessions: Arc<dyn SessionRepository>, signing_secret: String) -> Self {
        Self {
            sessions,
            signing_secret,
        }
    }

    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown, revoked or
    /// expired, or the user is inactive.
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let token_hash = hash_session_token(&self.signing_secret, token);

        self.sessions
            .find_identity(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid, expired or revoked session"}),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Role;
    use crate::domain::repositories::MockSessionRepository;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_repo = MockSessionRepository::new();

        let token = "valid-token";
        let expected_hash = hash_session_token(&test_secret(), token);

        mock_repo
            .expect_find_identity()
            .withf(move |hash| hash == expected_hash)
            .times(1)
            .returning(|_| {
                Ok(Some(CallerIdentity {
                    user_id: 3,
                    username: "jane".to_string(),
                    role: Role::Member,
                }))
            });

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let identity = service.authenticate(token).await.unwrap();

        assert_eq!(identity.user_id, 3);
        assert!(!identity.is_admin());
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token() {
        let mut mock_repo = MockSessionRepository::new();

        mock_repo
            .expect_find_identity()
            .times(1)
            .returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let result = service.authenticate("invalid-token").await;

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_raw_token_never_reaches_store() {
        let mut mock_repo = MockSessionRepository::new();

        mock_repo
            .expect_find_identity()
            .withf(|hash| hash != "plain-token" && hash.len() == 64)
            .times(1)
            .returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let _ = service.authenticate("plain-token").await;
    }
}
