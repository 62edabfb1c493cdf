use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

/// Directory-backed store for images received by the multipart pipeline.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file format")]
    InvalidFormat,
    #[error("File too large")]
    FileTooLarge,
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub content_hash: String,
    pub size: usize,
    pub stored_at: DateTime<Utc>,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    /// File names are derived from content only; the client's name never
    /// reaches the filesystem.
    pub fn generate_file_name(image_hash: &str, file_extension: &str) -> String {
        format!("{}.{}", image_hash, file_extension)
    }

    pub fn validate_image_size(image_data: &[u8]) -> Result<(), StorageError> {
        shared::check_upload_size(image_data.len() as u64).map_err(|_| StorageError::FileTooLarge)
    }

    pub async fn save_image(
        &self,
        image_data: &[u8],
        file_extension: &str,
    ) -> Result<StoredUpload, StorageError> {
        UploadStore::validate_image_size(image_data)?;
        if file_extension.is_empty() || !file_extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidFormat);
        }

        let content_hash = UploadStore::calculate_image_hash(image_data);
        let path = self
            .dir
            .join(UploadStore::generate_file_name(&content_hash, file_extension));

        // Identical uploads share a path, so a re-save must never expose a
        // truncated file to a predictor already reading it.
        let staging = self
            .dir
            .join(format!(".{}.{}.part", content_hash, Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&staging, image_data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        log::info!("Image uploaded to: {}", path.display());

        Ok(StoredUpload {
            path,
            content_hash,
            size: image_data.len(),
            stored_at: Utc::now(),
        })
    }

    /// Deletes stored files last modified before `now - max_age`. Returns the
    /// number of files removed.
    pub async fn sweep_expired(&self, max_age: Duration) -> Result<usize, StorageError> {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(modified) => modified.into(),
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if modified < cutoff {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => log::warn!("Failed to remove {}: {}", entry.path().display(), e),
                }
            }
        }

        if removed > 0 {
            log::info!("Swept {} expired uploads from {}", removed, self.dir.display());
        }
        Ok(removed)
    }
}
