use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::core::config::JwtConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{Claims, UserId, UserRole};

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies HS256 access tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expire_days: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expire_days: config.expire_days,
        }
    }

    /// Issue a token carrying the user id and role
    pub fn issue(&self, user_id: UserId, role: UserRole) -> Result<IssuedToken> {
        let now = Utc::now();
        let (lifetime, expires_at) = Duration::try_days(self.expire_days)
            .and_then(|lifetime| now.checked_add_signed(lifetime).map(|at| (lifetime, at)))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Token lifetime of {} days is out of range",
                    self.expire_days
                ))
            })?;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AppError::Unauthorized("Not authorized to access this route".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expire_days: 30,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(&config("test-secret-that-is-long-enough"));
        let user_id = UserId::new();

        let issued = service.issue(user_id, UserRole::Admin).unwrap();
        assert_eq!(issued.expires_in, 30 * 24 * 60 * 60);

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issuer = TokenService::new(&config("secret-alpha"));
        let verifier = TokenService::new(&config("secret-bravo"));

        let issued = issuer.issue(UserId::new(), UserRole::User).unwrap();
        let err = verifier.verify(&issued.token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let cfg = config("test-secret-that-is-long-enough");
        let service = TokenService::new(&cfg);

        // Well past the default 60 second leeway
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new(),
            role: UserRole::User,
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = TokenService::new(&JwtConfig {
            secret: "test-secret-that-is-long-enough".to_string(),
            expire_days: i64::MAX,
        });
        let err = service.issue(UserId::new(), UserRole::User).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = TokenService::new(&config("test-secret-that-is-long-enough"));
        assert!(service.verify("not.a.jwt").is_err());
    }
}
