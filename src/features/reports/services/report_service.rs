use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    CreateReportDto, ReportResponseDto, UpdateReportDto, VerifyReportDto,
};
use crate::features::reports::models::{
    RecordVerification, Report, ReportChanges, ReportQuery, VerificationEntry,
};
use crate::features::reports::repositories::ReportRepository;
use crate::shared::types::PageRequest;

/// One page of a report listing
#[derive(Debug)]
pub struct ReportPage {
    pub items: Vec<ReportResponseDto>,
    pub total: i64,
    pub page: PageRequest,
}

/// Service for the report lifecycle and verification workflow
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    /// List reports; non-admins only ever see their own
    pub async fn list(
        &self,
        mut query: ReportQuery,
        requester: &AuthenticatedUser,
    ) -> Result<ReportPage> {
        if !requester.is_admin() {
            query.restrict_to_owner(requester.id);
        }

        let (reports, total) = self
            .reports
            .list(&query.predicates, &query.sort, query.page)
            .await?;

        Ok(ReportPage {
            items: self.with_history(reports).await?,
            total,
            page: query.page,
        })
    }

    /// Get a single report the requester owns (or any, for admins)
    pub async fn get(&self, id: Uuid, requester: &AuthenticatedUser) -> Result<ReportResponseDto> {
        let report = self.find_accessible(id, requester).await?;
        self.with_history_one(report).await
    }

    /// Create a report owned by the requester
    pub async fn create(
        &self,
        dto: CreateReportDto,
        requester: &AuthenticatedUser,
    ) -> Result<ReportResponseDto> {
        let report = self.reports.create(dto.into_create(requester.id)).await?;

        tracing::info!("Report {} created by user {}", report.id, requester.id);
        Ok(ReportResponseDto::new(report, Vec::new()))
    }

    /// Partially update a report; `status` and `adminComments` need an admin
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateReportDto,
        requester: &AuthenticatedUser,
    ) -> Result<ReportResponseDto> {
        self.find_accessible(id, requester).await?;

        let changes = ReportChanges::from(dto);
        if changes.touches_admin_fields() && !requester.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can change status or admin comments".to_string(),
            ));
        }

        let report = self
            .reports
            .update(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;

        self.with_history_one(report).await
    }

    /// Delete a report together with its verification history
    pub async fn delete(&self, id: Uuid, requester: &AuthenticatedUser) -> Result<()> {
        self.find_accessible(id, requester).await?;

        if !self.reports.delete(id).await? {
            return Err(not_found(id));
        }

        tracing::info!("Report {} deleted by user {}", id, requester.id);
        Ok(())
    }

    /// Record an admin decision and append it to the history
    pub async fn verify(
        &self,
        id: Uuid,
        dto: VerifyReportDto,
        requester: &AuthenticatedUser,
    ) -> Result<ReportResponseDto> {
        if !requester.is_admin() {
            return Err(AppError::Forbidden(format!(
                "User role {} is not authorized to verify reports",
                requester.role
            )));
        }

        let report = self
            .reports
            .record_verification(
                id,
                RecordVerification {
                    decision: dto.status,
                    admin_id: requester.id,
                    comment: dto.comment,
                    at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            "Report {} marked {} by admin {}",
            id,
            report.verification_status,
            requester.id
        );
        self.with_history_one(report).await
    }

    async fn find_accessible(&self, id: Uuid, requester: &AuthenticatedUser) -> Result<Report> {
        let report = self
            .reports
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if !requester.can_access(report.user_id) {
            return Err(AppError::Forbidden(format!(
                "User {} is not authorized to access this report",
                requester.id
            )));
        }

        Ok(report)
    }

    async fn with_history_one(&self, report: Report) -> Result<ReportResponseDto> {
        let history = self.reports.history(&[report.id]).await?;
        Ok(ReportResponseDto::new(report, history))
    }

    async fn with_history(&self, reports: Vec<Report>) -> Result<Vec<ReportResponseDto>> {
        let ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();

        let mut by_report: HashMap<Uuid, Vec<VerificationEntry>> = HashMap::new();
        for entry in self.reports.history(&ids).await? {
            by_report.entry(entry.report_id).or_default().push(entry);
        }

        Ok(reports
            .into_iter()
            .map(|report| {
                let history = by_report.remove(&report.id).unwrap_or_default();
                ReportResponseDto::new(report, history)
            })
            .collect())
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Report not found with id of {}", id))
}
