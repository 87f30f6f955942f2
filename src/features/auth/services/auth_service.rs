use chrono::Utc;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, RegisterRequestDto, UpdateDetailsDto, UpdatePasswordDto,
    UserResponseDto,
};
use crate::features::auth::model::{
    AuthenticatedUser, CreateUser, UpdateUserDetails, User, UserRole,
};
use crate::features::auth::repositories::UserRepository;
use crate::features::auth::services::password::{spawn_hash_password, spawn_verify_password};
use crate::features::auth::services::token_service::TokenService;

/// Same message for unknown email, wrong password and role mismatch
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Service for account operations (register, login, profile changes)
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let role = match dto.role.as_deref() {
            Some(r) => r.parse::<UserRole>().map_err(AppError::Validation)?,
            None => UserRole::User,
        };

        if self.users.find_by_email(&dto.email).await?.is_some() {
            return Err(AppError::DuplicateKey(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = spawn_hash_password(dto.password).await?;
        let user = self
            .users
            .create(CreateUser {
                name: dto.name.trim().to_string(),
                email: dto.email,
                password_hash,
                role,
            })
            .await?;

        self.token_response(user)
    }

    /// Login with email and password, optionally asserting a role
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let mut user = self
            .users
            .find_by_email(&dto.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !spawn_verify_password(dto.password, user.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if let Some(requested) = dto.role.as_deref() {
            if requested != user.role.to_string() {
                tracing::debug!(
                    "Login role mismatch for user {}: requested {}, has {}",
                    user.id,
                    requested,
                    user.role
                );
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        }

        let now = Utc::now();
        self.users.set_last_login(user.id, now).await?;
        user.last_login = Some(now);

        tracing::info!("User {} logged in", user.id);
        self.token_response(user)
    }

    /// Current user profile
    pub async fn me(&self, requester: &AuthenticatedUser) -> Result<UserResponseDto> {
        self.find_user(requester).await.map(UserResponseDto::from)
    }

    /// Update name and/or email
    pub async fn update_details(
        &self,
        requester: &AuthenticatedUser,
        dto: UpdateDetailsDto,
    ) -> Result<UserResponseDto> {
        if let Some(email) = dto.email.as_deref() {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != requester.id {
                    return Err(AppError::DuplicateKey(
                        "Email is already registered".to_string(),
                    ));
                }
            }
        }

        let user = self
            .users
            .update_details(
                requester.id,
                UpdateUserDetails {
                    name: dto.name.map(|n| n.trim().to_string()),
                    email: dto.email,
                },
            )
            .await?;

        Ok(user.into())
    }

    /// Change password after verifying the current one; returns a fresh token
    pub async fn update_password(
        &self,
        requester: &AuthenticatedUser,
        dto: UpdatePasswordDto,
    ) -> Result<AuthResponseDto> {
        let user = self.find_user(requester).await?;

        if !spawn_verify_password(dto.current_password, user.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = spawn_hash_password(dto.new_password).await?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!("Password changed for user {}", user.id);
        self.token_response(user)
    }

    async fn find_user(&self, requester: &AuthenticatedUser) -> Result<User> {
        self.users
            .find_by_id(requester.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", requester.id)))
    }

    fn token_response(&self, user: User) -> Result<AuthResponseDto> {
        let issued = self.tokens.issue(user.id, user.role)?;
        Ok(AuthResponseDto {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }
}
