use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{CreateUser, UpdateUserDetails, User, UserId};

/// Persistence contract for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fails with `DuplicateKey` when the email is taken
    async fn create(&self, data: CreateUser) -> Result<User>;

    async fn set_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;

    async fn update_details(&self, id: UserId, data: UpdateUserDetails) -> Result<User>;

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, last_login, created_at";

/// Postgres-backed user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user: {:?}", e);
                AppError::from(e)
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by email: {:?}", e);
                AppError::from(e)
            })
    }

    async fn create(&self, data: CreateUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(UserId::new())
            .bind(&data.name)
            .bind(data.email.to_lowercase())
            .bind(&data.password_hash)
            .bind(data.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::DuplicateKey(_) => {
                    AppError::DuplicateKey("Email is already registered".to_string())
                }
                other => {
                    tracing::error!("Failed to create user: {}", other);
                    other
                }
            })?;

        tracing::info!("Created user: {} ({})", user.id, user.role);
        Ok(user)
    }

    async fn set_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update last login: {:?}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn update_details(&self, id: UserId, data: UpdateUserDetails) -> Result<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), email = COALESCE($3, email)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(data.name)
            .bind(data.email.map(|e| e.to_lowercase()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::DuplicateKey(_) => {
                    AppError::DuplicateKey("Email is already registered".to_string())
                }
                other => {
                    tracing::error!("Failed to update user details: {}", other);
                    other
                }
            })?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update password: {:?}", e);
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }
}
