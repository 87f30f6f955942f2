use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    CreateReportDto, ReportResponseDto, UpdateReportDto, VerifyReportDto,
};
use crate::features::reports::models::ReportQuery;
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta};

/// List reports (own reports for users, all reports for admins)
#[utoipa::path(
    get,
    path = "/api/reports",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated response keys, e.g. `title,status`"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort keys, `-` prefix for descending (default `-createdAt`)"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 10, max 100)"),
        ("status" = Option<String>, Query, description = "Filter by status; other fields and `field[gt|gte|lt|lte|in]` work the same way"),
    ),
    responses(
        (status = 200, description = "Page of reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 400, description = "Invalid filter, sort or select"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Vec<Value>>>> {
    let query = ReportQuery::from_params(&params)?;
    let select = query.select.clone();

    let page = service.list(query, &user).await?;
    let items = page
        .items
        .iter()
        .map(|report| report.project(select.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let meta = Meta {
        total: page.total,
        count: Some(items.len() as i64),
        pagination: Some(page.page.pagination(page.total)),
    };

    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// Get report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn get_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.get(id, &user).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Submit a new report
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn create_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.create(dto, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(report), None, None)),
    ))
}

/// Update a report (owner or admin; status and adminComments are admin-only)
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner, or admin-only field"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn update_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.update(id, dto, &user).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Delete a report (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn delete_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Report deleted".to_string()),
        None,
    )))
}

/// Approve or reject a report (admin only)
#[utoipa::path(
    put,
    path = "/api/reports/{id}/verify",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = VerifyReportDto,
    responses(
        (status = 200, description = "Verification recorded", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Status must be approved or rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn verify_report(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<VerifyReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.verify(id, dto, &admin).await?;
    let message = format!("Report {}", report.verification_status);
    Ok(Json(ApiResponse::success(Some(report), Some(message), None)))
}
