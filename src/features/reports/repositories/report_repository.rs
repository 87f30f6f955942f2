use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    CreateReport, FilterOp, FilterValue, Predicate, RecordVerification, Report, ReportChanges,
    SortKey, VerificationEntry,
};
use crate::shared::types::PageRequest;

/// Persistence contract for reports and their verification log
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>>;

    /// One page of matching reports plus the total number of matches
    async fn list(
        &self,
        predicates: &[Predicate],
        sort: &[SortKey],
        page: PageRequest,
    ) -> Result<(Vec<Report>, i64)>;

    async fn create(&self, data: CreateReport) -> Result<Report>;

    /// Applies the set fields and bumps `updated_at`; `None` if the report is gone
    async fn update(&self, id: Uuid, changes: ReportChanges) -> Result<Option<Report>>;

    /// Removes the report and its verification log; `false` if nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Updates the verification fields and appends one log entry atomically
    async fn record_verification(
        &self,
        id: Uuid,
        verification: RecordVerification,
    ) -> Result<Option<Report>>;

    /// Log entries for the given reports, oldest first
    async fn history(&self, report_ids: &[Uuid]) -> Result<Vec<VerificationEntry>>;
}

const REPORT_COLUMNS: &str = "id, title, description, location, latitude, longitude, \
     location_details, report_type, status, verification_status, verified_by, verified_at, \
     admin_comments, image, user_id, created_at, updated_at";

/// Postgres-backed report repository
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(v) => builder.push_bind(v.clone()),
        FilterValue::Type(v) => builder.push_bind(*v),
        FilterValue::Status(v) => builder.push_bind(*v),
        FilterValue::Verification(v) => builder.push_bind(*v),
        FilterValue::User(v) => builder.push_bind(*v),
        FilterValue::Timestamp(v) => builder.push_bind(*v),
    };
}

fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    builder.push(" WHERE TRUE");

    for predicate in predicates {
        builder.push(" AND ");
        builder.push(predicate.field.column());

        if predicate.op == FilterOp::In {
            builder.push(" IN (");
            for (i, value) in predicate.values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push(")");
        } else {
            builder.push(" ");
            builder.push(predicate.op.sql());
            builder.push(" ");
            if let Some(value) = predicate.values.first() {
                push_value(builder, value);
            }
        }
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    builder.push(" ORDER BY ");
    for key in sort {
        builder.push(key.field.column());
        builder.push(if key.descending { " DESC, " } else { " ASC, " });
    }
    builder.push("id ASC");
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get report: {:?}", e);
                AppError::from(e)
            })
    }

    async fn list(
        &self,
        predicates: &[Predicate],
        sort: &[SortKey],
        page: PageRequest,
    ) -> Result<(Vec<Report>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM reports");
        push_predicates(&mut count_builder, predicates);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count reports: {:?}", e);
                AppError::from(e)
            })?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM reports", REPORT_COLUMNS));
        push_predicates(&mut builder, predicates);
        push_order(&mut builder, sort);
        builder.push(" LIMIT ");
        builder.push_bind(page.limit);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let reports = builder
            .build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports: {:?}", e);
                AppError::from(e)
            })?;

        Ok((reports, total))
    }

    async fn create(&self, data: CreateReport) -> Result<Report> {
        let sql = format!(
            r#"
            INSERT INTO reports (
                id, title, description, location, latitude, longitude,
                location_details, report_type, image, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        sqlx::query_as::<_, Report>(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.location)
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(data.location_details.map(Json))
            .bind(data.report_type)
            .bind(&data.image)
            .bind(data.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create report: {:?}", e);
                AppError::from(e)
            })
    }

    async fn update(&self, id: Uuid, changes: ReportChanges) -> Result<Option<Report>> {
        let sql = format!(
            r#"
            UPDATE reports SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                location_details = COALESCE($7, location_details),
                report_type = COALESCE($8, report_type),
                image = COALESCE($9, image),
                status = COALESCE($10, status),
                admin_comments = COALESCE($11, admin_comments),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.location)
            .bind(changes.latitude)
            .bind(changes.longitude)
            .bind(changes.location_details.map(Json))
            .bind(changes.report_type)
            .bind(&changes.image)
            .bind(changes.status)
            .bind(&changes.admin_comments)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update report: {:?}", e);
                AppError::from(e)
            })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete report: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_verification(
        &self,
        id: Uuid,
        verification: RecordVerification,
    ) -> Result<Option<Report>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE reports SET
                status = $2,
                verification_status = $3,
                verified_by = $4,
                verified_at = $5,
                admin_comments = $6,
                updated_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .bind(verification.decision.report_status())
            .bind(verification.decision.verification_status())
            .bind(verification.admin_id)
            .bind(verification.at)
            .bind(&verification.comment)
            .fetch_optional(&mut *tx)
            .await?;

        // Dropping the transaction rolls it back
        let Some(report) = report else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO report_verifications (report_id, status, admin_id, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(verification.decision.verification_status())
        .bind(verification.admin_id)
        .bind(&verification.comment)
        .bind(verification.at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to append verification entry: {:?}", e);
            AppError::from(e)
        })?;

        tx.commit().await?;
        Ok(Some(report))
    }

    async fn history(&self, report_ids: &[Uuid]) -> Result<Vec<VerificationEntry>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, VerificationEntry>(
            r#"
            SELECT id, report_id, status, admin_id, comment, created_at
            FROM report_verifications
            WHERE report_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get verification history: {:?}", e);
            AppError::from(e)
        })
    }
}
