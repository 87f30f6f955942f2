use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::auth::model::UserId;
use crate::features::reports::models::VerificationStatus;

/// One row of a report's append-only verification log
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct VerificationEntry {
    pub id: i64,
    pub report_id: Uuid,
    pub status: VerificationStatus,
    pub admin_id: UserId,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
