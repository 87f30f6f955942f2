//! In-memory repositories and an HTTP harness for tests.
//!
//! The report store mimics the Postgres queries closely enough for service and
//! router tests: NULLs never match a predicate, sort ascending puts NULLs last
//! and descending puts them first, and `id` breaks ties.

use async_trait::async_trait;
use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::core::config::{Environment, JwtConfig};
use crate::core::error::{AppError, Result};
use crate::core::router::{build_router, AppState};
use crate::features::auth::model::{CreateUser, UpdateUserDetails, User, UserId, UserRole};
use crate::features::auth::services::password::hash_password;
use crate::features::auth::{AuthService, JwtValidator, TokenService, UserRepository};
use crate::features::reports::models::{
    CreateReport, FilterOp, FilterValue, Predicate, RecordVerification, Report, ReportChanges,
    ReportField, SortKey, VerificationEntry,
};
use crate::features::reports::{ReportRepository, ReportService};
use crate::features::uploads::UploadService;
use crate::modules::storage::LocalStorage;
use crate::shared::types::PageRequest;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough".to_string(),
        expire_days: 30,
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: CreateUser) -> Result<User> {
        let email = data.email.to_lowercase();
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateKey(
                "Email is already registered".to_string(),
            ));
        }

        let user = User {
            id: UserId::new(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            role: data.role,
            last_login: None,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn update_details(&self, id: UserId, data: UpdateUserDetails) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        let email = data.email.map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::DuplicateKey(
                    "Email is already registered".to_string(),
                ));
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        Ok(user.clone())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

// =============================================================================
// REPORTS
// =============================================================================

#[derive(Default)]
pub struct InMemoryReportRepository {
    reports: Mutex<Vec<Report>>,
    history: Mutex<Vec<VerificationEntry>>,
}

impl InMemoryReportRepository {
    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

fn field_value(report: &Report, field: ReportField) -> Option<FilterValue> {
    match field {
        ReportField::Title => Some(FilterValue::Text(report.title.clone())),
        ReportField::Location => Some(FilterValue::Text(report.location.clone())),
        ReportField::Type => Some(FilterValue::Type(report.report_type)),
        ReportField::Status => Some(FilterValue::Status(report.status)),
        ReportField::VerificationStatus => {
            Some(FilterValue::Verification(report.verification_status))
        }
        ReportField::UserId => Some(FilterValue::User(report.user_id)),
        ReportField::VerifiedBy => report.verified_by.map(FilterValue::User),
        ReportField::CreatedAt => Some(FilterValue::Timestamp(report.created_at)),
        ReportField::UpdatedAt => Some(FilterValue::Timestamp(report.updated_at)),
        ReportField::VerifiedAt => report.verified_at.map(FilterValue::Timestamp),
    }
}

fn matches(report: &Report, predicate: &Predicate) -> bool {
    let Some(actual) = field_value(report, predicate.field) else {
        return false;
    };
    let Some(first) = predicate.values.first() else {
        return false;
    };

    match predicate.op {
        FilterOp::Eq => actual == *first,
        FilterOp::In => predicate.values.contains(&actual),
        FilterOp::Gt => actual > *first,
        FilterOp::Gte => actual >= *first,
        FilterOp::Lt => actual < *first,
        FilterOp::Lte => actual <= *first,
    }
}

fn compare(a: &Report, b: &Report, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = match (field_value(a, key.field), field_value(b, key.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        };
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        let reports = self.reports.lock().unwrap();
        Ok(reports.iter().find(|r| r.id == id).cloned())
    }

    async fn list(
        &self,
        predicates: &[Predicate],
        sort: &[SortKey],
        page: PageRequest,
    ) -> Result<(Vec<Report>, i64)> {
        let reports = self.reports.lock().unwrap();
        let mut matching: Vec<Report> = reports
            .iter()
            .filter(|r| predicates.iter().all(|p| matches(r, p)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare(a, b, sort));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn create(&self, data: CreateReport) -> Result<Report> {
        let now = Utc::now();
        let report = Report {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            location: data.location,
            latitude: data.latitude,
            longitude: data.longitude,
            location_details: data.location_details.map(sqlx::types::Json),
            report_type: data.report_type,
            status: Default::default(),
            verification_status: Default::default(),
            verified_by: None,
            verified_at: None,
            admin_comments: None,
            image: data.image,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        self.reports.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn update(&self, id: Uuid, changes: ReportChanges) -> Result<Option<Report>> {
        let mut reports = self.reports.lock().unwrap();
        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if let Some(v) = changes.title {
            report.title = v;
        }
        if let Some(v) = changes.description {
            report.description = v;
        }
        if let Some(v) = changes.location {
            report.location = v;
        }
        if changes.latitude.is_some() {
            report.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            report.longitude = changes.longitude;
        }
        if let Some(v) = changes.location_details {
            report.location_details = Some(sqlx::types::Json(v));
        }
        if let Some(v) = changes.report_type {
            report.report_type = v;
        }
        if changes.image.is_some() {
            report.image = changes.image;
        }
        if let Some(v) = changes.status {
            report.status = v;
        }
        if changes.admin_comments.is_some() {
            report.admin_comments = changes.admin_comments;
        }
        report.updated_at = Utc::now();

        Ok(Some(report.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|r| r.id != id);
        let removed = reports.len() < before;

        if removed {
            self.history.lock().unwrap().retain(|e| e.report_id != id);
        }
        Ok(removed)
    }

    async fn record_verification(
        &self,
        id: Uuid,
        verification: RecordVerification,
    ) -> Result<Option<Report>> {
        let mut reports = self.reports.lock().unwrap();
        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        report.status = verification.decision.report_status();
        report.verification_status = verification.decision.verification_status();
        report.verified_by = Some(verification.admin_id);
        report.verified_at = Some(verification.at);
        report.admin_comments = verification.comment.clone();
        report.updated_at = verification.at;

        let mut history = self.history.lock().unwrap();
        let entry_id = history.len() as i64 + 1;
        history.push(VerificationEntry {
            id: entry_id,
            report_id: id,
            status: verification.decision.verification_status(),
            admin_id: verification.admin_id,
            comment: verification.comment,
            created_at: verification.at,
        });

        Ok(Some(report.clone()))
    }

    async fn history(&self, report_ids: &[Uuid]) -> Result<Vec<VerificationEntry>> {
        let history = self.history.lock().unwrap();
        let mut entries: Vec<VerificationEntry> = history
            .iter()
            .filter(|e| report_ids.contains(&e.report_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}

// =============================================================================
// HTTP HARNESS
// =============================================================================

/// Full router over in-memory repositories and a throwaway upload directory
pub struct TestApp {
    pub server: TestServer,
    pub users: Arc<InMemoryUserRepository>,
    pub reports: Arc<InMemoryReportRepository>,
    tokens: Arc<TokenService>,
    upload_dir: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let reports = Arc::new(InMemoryReportRepository::default());
        let tokens = Arc::new(TokenService::new(&test_jwt_config()));

        let upload_dir = std::env::temp_dir().join(format!("hazard-uploads-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(upload_dir.clone(), "http://localhost:5000")
            .await
            .unwrap();

        let state = AppState {
            auth_service: Arc::new(AuthService::new(users.clone(), tokens.clone())),
            report_service: Arc::new(ReportService::new(reports.clone())),
            upload_service: Arc::new(UploadService::new(Arc::new(storage), 1024 * 1024)),
            jwt_validator: Arc::new(JwtValidator::new(tokens.clone(), users.clone())),
            upload_dir: upload_dir.clone(),
            environment: Environment::Production,
            cors_allowed_origins: vec!["*".to_string()],
        };

        Self {
            server: TestServer::new(build_router(state)).unwrap(),
            users,
            reports,
            tokens,
            upload_dir,
        }
    }

    pub fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    /// Store a regular user and return its id with a valid token
    pub async fn user(&self, email: &str) -> (UserId, String) {
        self.account(email, UserRole::User).await
    }

    pub async fn admin(&self, email: &str) -> (UserId, String) {
        self.account(email, UserRole::Admin).await
    }

    async fn account(&self, email: &str, role: UserRole) -> (UserId, String) {
        let user = self
            .users
            .create(CreateUser {
                name: "Test Account".to_string(),
                email: email.to_string(),
                password_hash: hash_password("secret123").unwrap(),
                role,
            })
            .await
            .unwrap();
        let issued = self.tokens.issue(user.id, user.role).unwrap();
        (user.id, issued.token)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
