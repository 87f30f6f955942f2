use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::UserId;
use crate::features::reports::models::{
    CreateReport, LocationDetails, Report, ReportChanges, ReportStatus, ReportType,
    VerificationDecision, VerificationEntry, VerificationStatus,
};

/// Request DTO for submitting a report.
///
/// Any `userId` in the body is ignored; the report is owned by the requester.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportDto {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Title is required (max 100 characters)"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 500, message = "Description is required (max 500 characters)"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub description: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Location is required"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub location: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: Option<f64>,

    pub location_details: Option<LocationDetails>,

    /// Defaults to `other`
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,

    /// URL returned by the upload endpoint
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

impl CreateReportDto {
    pub fn into_create(self, owner: UserId) -> CreateReport {
        CreateReport {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_details: self.location_details,
            report_type: self.report_type.unwrap_or_default(),
            image: self.image,
            user_id: owner,
        }
    }
}

/// Request DTO for a partial report update.
///
/// `status` and `adminComments` are reserved for admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportDto {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = 500, message = "Description must be 1-500 characters"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub description: Option<String>,

    #[validate(
        length(min = 1, message = "Location must not be empty"),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub location: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: Option<f64>,

    pub location_details: Option<LocationDetails>,

    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,

    pub status: Option<ReportStatus>,

    pub admin_comments: Option<String>,
}

impl From<UpdateReportDto> for ReportChanges {
    fn from(dto: UpdateReportDto) -> Self {
        Self {
            title: dto.title.map(|v| v.trim().to_string()),
            description: dto.description.map(|v| v.trim().to_string()),
            location: dto.location.map(|v| v.trim().to_string()),
            latitude: dto.latitude,
            longitude: dto.longitude,
            location_details: dto.location_details,
            report_type: dto.report_type,
            image: dto.image,
            status: dto.status,
            admin_comments: dto.admin_comments,
        }
    }
}

/// Request DTO for an admin verification decision
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyReportDto {
    /// `approved` or `rejected`
    pub status: VerificationDecision,

    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// One entry of a report's verification history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEntryDto {
    pub status: VerificationStatus,
    pub admin_id: UserId,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<VerificationEntry> for VerificationEntryDto {
    fn from(entry: VerificationEntry) -> Self {
        Self {
            status: entry.status,
            admin_id: entry.admin_id,
            comment: entry.comment,
            timestamp: entry.created_at,
        }
    }
}

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_details: Option<LocationDetails>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub verification_status: VerificationStatus,
    pub verification_history: Vec<VerificationEntryDto>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub admin_comments: Option<String>,
    pub image: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponseDto {
    pub fn new(report: Report, history: Vec<VerificationEntry>) -> Self {
        Self {
            id: report.id,
            title: report.title,
            description: report.description,
            location: report.location,
            latitude: report.latitude,
            longitude: report.longitude,
            location_details: report.location_details.map(|details| details.0),
            report_type: report.report_type,
            status: report.status,
            verification_status: report.verification_status,
            verification_history: history.into_iter().map(Into::into).collect(),
            verified_by: report.verified_by,
            verified_at: report.verified_at,
            admin_comments: report.admin_comments,
            image: report.image,
            user_id: report.user_id,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }

    /// Serialize keeping only the selected keys (and always `id`)
    pub fn project(&self, select: Option<&[String]>) -> Result<Value> {
        let value = serde_json::to_value(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))?;

        let Some(select) = select else {
            return Ok(value);
        };

        match value {
            Value::Object(map) => Ok(Value::Object(
                map.into_iter()
                    .filter(|(key, _)| key == "id" || select.iter().any(|s| s == key))
                    .collect(),
            )),
            other => Ok(other),
        }
    }
}
