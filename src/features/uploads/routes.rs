use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;

use crate::features::uploads::handlers::upload_image;
use crate::features::uploads::services::UploadService;

/// Upload routes (require the auth middleware applied by the caller)
pub fn routes(service: Arc<UploadService>) -> Router {
    // Room for the multipart envelope on top of the file itself
    let body_limit = service.max_file_size() + 64 * 1024;

    Router::new()
        .route(
            "/api/upload",
            post(upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(service)
}
