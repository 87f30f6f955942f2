use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::UserId;
use crate::features::uploads::dtos::{
    extension_for, is_mime_type_allowed, UploadResponseDto, ALLOWED_MIME_TYPES,
};
use crate::modules::storage::LocalStorage;

/// Service for image uploads
pub struct UploadService {
    storage: Arc<LocalStorage>,
    max_file_size: usize,
}

impl UploadService {
    pub fn new(storage: Arc<LocalStorage>, max_file_size: usize) -> Self {
        Self {
            storage,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate and store an image under a collision-resistant name
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        content_type: &str,
        uploader: UserId,
    ) -> Result<UploadResponseDto> {
        if !is_mime_type_allowed(content_type) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        if data.len() > self.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_file_size,
                self.max_file_size / 1024 / 1024
            )));
        }

        let extension = extension_for(content_type).unwrap_or("bin");
        let filename = format!(
            "image-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            extension
        );

        let url = self.storage.upload(&filename, &data).await?;
        info!(
            "Image uploaded: file={}, size={}, user={}",
            filename,
            data.len(),
            uploader
        );

        Ok(UploadResponseDto {
            url,
            filename,
            content_type: content_type.to_string(),
            size: data.len(),
        })
    }
}
