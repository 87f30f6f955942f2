use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::model::UserId;

/// Report type enum matching database enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "report_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Hazard,
    Maintenance,
    #[default]
    Other,
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Hazard => write!(f, "hazard"),
            ReportType::Maintenance => write!(f, "maintenance"),
            ReportType::Other => write!(f, "other"),
        }
    }
}

/// Report status enum matching database enum.
///
/// Variant order mirrors the database enum so sorting agrees in both places.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Verified,
    InProgress,
    Resolved,
    Rejected,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::Verified => write!(f, "verified"),
            ReportStatus::InProgress => write!(f, "in-progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
            ReportStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Verification status enum matching database enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Approved => write!(f, "approved"),
            VerificationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome an admin can record when reviewing a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
    Approved,
    Rejected,
}

impl VerificationDecision {
    pub fn verification_status(self) -> VerificationStatus {
        match self {
            VerificationDecision::Approved => VerificationStatus::Approved,
            VerificationDecision::Rejected => VerificationStatus::Rejected,
        }
    }

    /// Lifecycle status that accompanies the decision
    pub fn report_status(self) -> ReportStatus {
        match self {
            VerificationDecision::Approved => ReportStatus::Verified,
            VerificationDecision::Rejected => ReportStatus::Rejected,
        }
    }
}

/// Structured location, stored as JSONB next to the flat location fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetails {
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub landmark: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_details: Option<Json<LocationDetails>>,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub verification_status: VerificationStatus,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub admin_comments: Option<String>,
    pub image: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new report; `user_id` is always the requester
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub title: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_details: Option<LocationDetails>,
    pub report_type: ReportType,
    pub image: Option<String>,
    pub user_id: UserId,
}

/// Partial update; `None` leaves the column untouched. Ownership is immutable,
/// so there is no `user_id`.
#[derive(Debug, Clone, Default)]
pub struct ReportChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_details: Option<LocationDetails>,
    pub report_type: Option<ReportType>,
    pub image: Option<String>,
    pub status: Option<ReportStatus>,
    pub admin_comments: Option<String>,
}

impl ReportChanges {
    pub fn touches_admin_fields(&self) -> bool {
        self.status.is_some() || self.admin_comments.is_some()
    }
}

/// A verification about to be recorded
#[derive(Debug, Clone)]
pub struct RecordVerification {
    pub decision: VerificationDecision,
    pub admin_id: UserId,
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}
