use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::AppError;
use crate::shared::validation::secure_filename;

/// Filesystem-backed storage rooted at `UPLOAD_DIR`
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates the upload directory if it does not exist yet
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        let root = PathBuf::from(&config.upload_dir);
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!("Local storage initialized at {}", root.display());
        Ok(Self { root })
    }

    #[cfg(test)]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the stored name `{timestamp}_{uuid}_{sanitised original name}`.
    ///
    /// The uuid keeps two uploads of the same name in the same millisecond
    /// apart.
    pub fn generate_key(&self, original_name: &str) -> Result<String, AppError> {
        let safe = secure_filename(original_name)
            .ok_or_else(|| AppError::BadRequest("Invalid file name".to_string()))?;
        Ok(format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S_%3f"),
            Uuid::now_v7().simple(),
            safe
        ))
    }

    /// Writes the file and returns the path to store in the database.
    /// Never replaces an existing file.
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<String, AppError> {
        let path = self.root.join(key);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AppError::Conflict("A stored file with this name already exists".to_string())
                } else {
                    AppError::Internal(format!("Failed to store file '{}': {}", path.display(), e))
                }
            })?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(AppError::Internal(format!(
                "Failed to store file '{}': {}",
                path.display(),
                e
            )));
        }

        debug!("Stored file '{}' ({} bytes)", path.display(), data.len());
        Ok(path.to_string_lossy().into_owned())
    }

    /// Maps a stored path back onto the upload directory, rejecting anything
    /// that would land outside it
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, AppError> {
        let path = PathBuf::from(stored_path);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            warn!("Rejected file access outside upload directory: {}", stored_path);
            return Err(AppError::Forbidden(
                "File is outside the upload directory".to_string(),
            ));
        }
        Ok(path)
    }

    pub async fn download(&self, stored_path: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(stored_path)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound("Resume file not found on server".to_string())
            } else {
                AppError::Internal(format!("Failed to read file '{}': {}", stored_path, e))
            }
        })
    }

    /// Removes a stored file. A missing file is not an error.
    pub async fn delete(&self, stored_path: &str) -> Result<(), AppError> {
        let path = self.resolve(stored_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted file '{}'", stored_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete file '{}': {}",
                stored_path, e
            ))),
        }
    }

    /// Deletes every path, logging instead of failing
    pub async fn delete_all_best_effort(&self, stored_paths: &[String]) {
        for path in stored_paths {
            if let Err(e) = self.delete(path).await {
                warn!("Could not remove stored file: {}", e);
            }
        }
    }
}
