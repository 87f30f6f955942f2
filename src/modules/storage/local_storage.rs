//! Local disk storage for uploaded files
//!
//! Files are written flat into the upload directory, which the router serves
//! statically under `/uploads`.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::error::AppError;
use crate::shared::constants::UPLOADS_PATH;

/// Stores files on the local filesystem and builds their public URLs
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    /// Create the storage, making sure the upload directory exists
    pub async fn new(root: PathBuf, public_base_url: &str) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!("Local storage ready at '{}'", root.display());

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Directory served under `/uploads`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file under `key`, returning its public URL
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<String, AppError> {
        if !is_safe_key(key) {
            return Err(AppError::BadRequest(format!("Invalid file name '{}'", key)));
        }

        let path = self.root.join(key);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store file '{}': {}", key, e)))?;

        debug!("Stored {} bytes at '{}'", data.len(), path.display());
        Ok(self.get_file_url(key))
    }

    /// Absolute URL of a stored file
    pub fn get_file_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.public_base_url, UPLOADS_PATH, key)
    }
}

/// A single path segment without traversal
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\'])
        && !key.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("local-storage-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let root = temp_root();
        let storage = LocalStorage::new(root.clone(), "http://localhost:5000/")
            .await
            .unwrap();

        let url = storage.upload("image-1-abc.png", b"png-bytes").await.unwrap();
        assert_eq!(url, "http://localhost:5000/uploads/image-1-abc.png");

        let stored = tokio::fs::read(root.join("image-1-abc.png")).await.unwrap();
        assert_eq!(stored, b"png-bytes");

        tokio::fs::remove_dir_all(root).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_path_traversal() {
        let root = temp_root();
        let storage = LocalStorage::new(root.clone(), "http://localhost:5000")
            .await
            .unwrap();

        for key in ["../escape.png", "nested/file.png", ".hidden", ""] {
            let err = storage.upload(key, b"x").await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{} accepted", key);
        }

        tokio::fs::remove_dir_all(root).await.unwrap();
    }
}
