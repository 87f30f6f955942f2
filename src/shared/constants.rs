/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number honoured; larger requests land past the last row
pub const MAX_PAGE: i64 = 1_000_000;

// =============================================================================
// UPLOADS
// =============================================================================

/// URL prefix under which stored uploads are served
pub const UPLOADS_PATH: &str = "/uploads";
