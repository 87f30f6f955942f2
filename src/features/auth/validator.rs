use super::model::AuthenticatedUser;
use super::repositories::UserRepository;
use super::services::TokenService;
use crate::core::error::AppError;
use std::sync::Arc;

/// Resolves a bearer token into an [`AuthenticatedUser`]
pub struct JwtValidator {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepository>,
}

impl JwtValidator {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.tokens.verify(token)?;

        // The subject must still exist; role comes from the store, not the token
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Token subject {} no longer exists", claims.sub);
                AppError::Unauthorized("Not authorized to access this route".to_string())
            })?;

        Ok(AuthenticatedUser {
            id: user.id,
            role: user.role,
        })
    }
}
