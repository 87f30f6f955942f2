//! Query language for report listings.
//!
//! `field=value` is an equality filter and `field[op]=value` applies one of
//! `gt`, `gte`, `lt`, `lte` or `in` (comma-separated). The keys `select`,
//! `sort`, `page` and `limit` are reserved.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::UserId;
use crate::features::reports::models::{ReportStatus, ReportType, VerificationStatus};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PageRequest;
use crate::shared::validation::{FILTER_KEY_REGEX, SORT_KEY_REGEX};

/// Response keys a `select` may name
pub const SELECTABLE_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "location",
    "latitude",
    "longitude",
    "locationDetails",
    "type",
    "status",
    "verificationStatus",
    "verificationHistory",
    "verifiedBy",
    "verifiedAt",
    "adminComments",
    "image",
    "userId",
    "createdAt",
    "updatedAt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Enum,
    Id,
    Timestamp,
}

/// Report fields that can be filtered and sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Title,
    Location,
    Type,
    Status,
    VerificationStatus,
    UserId,
    VerifiedBy,
    CreatedAt,
    UpdatedAt,
    VerifiedAt,
}

impl ReportField {
    pub const ALL: [ReportField; 10] = [
        ReportField::Title,
        ReportField::Location,
        ReportField::Type,
        ReportField::Status,
        ReportField::VerificationStatus,
        ReportField::UserId,
        ReportField::VerifiedBy,
        ReportField::CreatedAt,
        ReportField::UpdatedAt,
        ReportField::VerifiedAt,
    ];

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.api_name() == name)
    }

    /// Name used in query strings and JSON
    pub fn api_name(self) -> &'static str {
        match self {
            ReportField::Title => "title",
            ReportField::Location => "location",
            ReportField::Type => "type",
            ReportField::Status => "status",
            ReportField::VerificationStatus => "verificationStatus",
            ReportField::UserId => "userId",
            ReportField::VerifiedBy => "verifiedBy",
            ReportField::CreatedAt => "createdAt",
            ReportField::UpdatedAt => "updatedAt",
            ReportField::VerifiedAt => "verifiedAt",
        }
    }

    /// Column in the `reports` table
    pub fn column(self) -> &'static str {
        match self {
            ReportField::Title => "title",
            ReportField::Location => "location",
            ReportField::Type => "report_type",
            ReportField::Status => "status",
            ReportField::VerificationStatus => "verification_status",
            ReportField::UserId => "user_id",
            ReportField::VerifiedBy => "verified_by",
            ReportField::CreatedAt => "created_at",
            ReportField::UpdatedAt => "updated_at",
            ReportField::VerifiedAt => "verified_at",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ReportField::Title | ReportField::Location => FieldKind::Text,
            ReportField::Type | ReportField::Status | ReportField::VerificationStatus => {
                FieldKind::Enum
            }
            ReportField::UserId | ReportField::VerifiedBy => FieldKind::Id,
            ReportField::CreatedAt | ReportField::UpdatedAt | ReportField::VerifiedAt => {
                FieldKind::Timestamp
            }
        }
    }

    fn supports(self, op: FilterOp) -> bool {
        match self.kind() {
            FieldKind::Text | FieldKind::Timestamp => true,
            FieldKind::Enum | FieldKind::Id => matches!(op, FilterOp::Eq | FilterOp::In),
        }
    }

    fn parse_value(self, raw: &str) -> Result<FilterValue> {
        let invalid = || {
            AppError::Validation(format!(
                "Invalid value '{}' for field '{}'",
                raw,
                self.api_name()
            ))
        };

        match self {
            ReportField::Title | ReportField::Location => Ok(FilterValue::Text(raw.to_string())),
            ReportField::Type => parse_enum(raw).map(FilterValue::Type).ok_or_else(invalid),
            ReportField::Status => parse_enum(raw).map(FilterValue::Status).ok_or_else(invalid),
            ReportField::VerificationStatus => parse_enum(raw)
                .map(FilterValue::Verification)
                .ok_or_else(invalid),
            ReportField::UserId | ReportField::VerifiedBy => raw
                .parse::<UserId>()
                .map(FilterValue::User)
                .map_err(|_| invalid()),
            ReportField::CreatedAt | ReportField::UpdatedAt | ReportField::VerifiedAt => {
                parse_timestamp(raw)
                    .map(FilterValue::Timestamp)
                    .ok_or_else(invalid)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    fn from_suffix(suffix: Option<&str>) -> Option<Self> {
        match suffix {
            None => Some(FilterOp::Eq),
            Some("gt") => Some(FilterOp::Gt),
            Some("gte") => Some(FilterOp::Gte),
            Some("lt") => Some(FilterOp::Lt),
            Some("lte") => Some(FilterOp::Lte),
            Some("in") => Some(FilterOp::In),
            Some(_) => None,
        }
    }

    /// SQL comparison operator; `In` is rendered as a list by the repository
    pub fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::In => "IN",
        }
    }
}

/// Typed filter operand
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum FilterValue {
    Text(String),
    Type(ReportType),
    Status(ReportStatus),
    Verification(VerificationStatus),
    User(UserId),
    Timestamp(DateTime<Utc>),
}

/// `field op values`; non-`In` predicates carry exactly one value
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: ReportField,
    pub op: FilterOp,
    pub values: Vec<FilterValue>,
}

impl Predicate {
    pub fn eq(field: ReportField, value: FilterValue) -> Self {
        Self {
            field,
            op: FilterOp::Eq,
            values: vec![value],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: ReportField,
    pub descending: bool,
}

/// Parsed listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub predicates: Vec<Predicate>,
    pub sort: Vec<SortKey>,
    pub page: PageRequest,
    /// Requested response keys; `None` returns every key
    pub select: Option<Vec<String>>,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: default_sort(),
            page: PageRequest::default(),
            select: None,
        }
    }
}

impl ReportQuery {
    /// Parse raw query-string pairs
    pub fn from_params(params: &[(String, String)]) -> Result<Self> {
        let mut query = ReportQuery::default();
        let mut page = 1;
        let mut limit = DEFAULT_PAGE_SIZE;

        for (key, value) in params {
            match key.as_str() {
                "select" => query.select = parse_select(value)?,
                "sort" => query.sort = parse_sort(value)?,
                "page" => page = parse_number("page", value)?,
                "limit" => limit = parse_number("limit", value)?,
                _ => query.predicates.push(parse_predicate(key, value)?),
            }
        }

        query.page = PageRequest::new(page, limit);
        Ok(query)
    }

    /// Replace any `userId` filter with the given owner
    pub fn restrict_to_owner(&mut self, owner: UserId) {
        self.predicates
            .retain(|predicate| predicate.field != ReportField::UserId);
        self.predicates
            .push(Predicate::eq(ReportField::UserId, FilterValue::User(owner)));
    }
}

fn default_sort() -> Vec<SortKey> {
    vec![SortKey {
        field: ReportField::CreatedAt,
        descending: true,
    }]
}

fn parse_predicate(key: &str, raw: &str) -> Result<Predicate> {
    let caps = FILTER_KEY_REGEX
        .captures(key)
        .ok_or_else(|| AppError::Validation(format!("Invalid query parameter '{}'", key)))?;

    let name = &caps[1];
    let field = ReportField::from_api_name(name)
        .ok_or_else(|| AppError::Validation(format!("Cannot filter on field '{}'", name)))?;
    let op = FilterOp::from_suffix(caps.get(2).map(|m| m.as_str()))
        .ok_or_else(|| AppError::Validation(format!("Invalid query parameter '{}'", key)))?;

    if !field.supports(op) {
        return Err(AppError::Validation(format!(
            "Operator in '{}' is not supported for field '{}'",
            key,
            field.api_name()
        )));
    }

    let values = if op == FilterOp::In {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| field.parse_value(part))
            .collect::<Result<Vec<_>>>()?;
        if values.is_empty() {
            return Err(AppError::Validation(format!(
                "'{}' needs at least one value",
                key
            )));
        }
        values
    } else {
        vec![field.parse_value(raw)?]
    };

    Ok(Predicate { field, op, values })
}

fn parse_sort(raw: &str) -> Result<Vec<SortKey>> {
    let mut keys = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !SORT_KEY_REGEX.is_match(part) {
            return Err(AppError::Validation(format!("Invalid sort key '{}'", part)));
        }
        let (descending, name) = match part.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, part),
        };
        let field = ReportField::from_api_name(name)
            .ok_or_else(|| AppError::Validation(format!("Cannot sort on field '{}'", name)))?;
        keys.push(SortKey { field, descending });
    }

    if keys.is_empty() {
        return Ok(default_sort());
    }
    Ok(keys)
}

fn parse_select(raw: &str) -> Result<Option<Vec<String>>> {
    let mut fields = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !SELECTABLE_FIELDS.contains(&name) {
            return Err(AppError::Validation(format!(
                "Cannot select field '{}'",
                name
            )));
        }
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }

    Ok((!fields.is_empty()).then_some(fields))
}

fn parse_number(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("'{}' must be an integer", name)))
}

fn parse_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
