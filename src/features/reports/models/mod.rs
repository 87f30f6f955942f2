mod filter;
mod report;
mod verification;

pub use filter::{
    FieldKind, FilterOp, FilterValue, Predicate, ReportField, ReportQuery, SortKey,
    SELECTABLE_FIELDS,
};
pub use report::{
    CreateReport, LocationDetails, RecordVerification, Report, ReportChanges, ReportStatus,
    ReportType, VerificationDecision, VerificationStatus,
};
pub use verification::VerificationEntry;
