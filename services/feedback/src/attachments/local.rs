use super::{new_attachment_key, AttachmentStore};
use crate::config::LocalStorageConfig;
use crate::error::StorageError;
use crate::models::PhotoUpload;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Writes photos into a directory served under `url_prefix`
pub struct LocalAttachmentStore {
    upload_dir: PathBuf,
    url_prefix: String,
}

impl LocalAttachmentStore {
    /// Create the store, making sure the upload directory exists
    pub async fn new(config: &LocalStorageConfig) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;

        info!(
            upload_dir = %config.upload_dir.display(),
            url_prefix = %config.url_prefix,
            "Local attachment store initialized"
        );

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    async fn write_new(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.upload_dir.join(key);

        // create_new: an existing upload is never replaced
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        if let Err(e) = write_all_synced(&mut file, bytes).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

async fn write_all_synced(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    fn backend_tag(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, photo), fields(size_bytes = photo.bytes.len()))]
    async fn store(&self, club_id: &str, photo: &PhotoUpload) -> Result<String, StorageError> {
        let key = new_attachment_key(club_id, &photo.filename);

        self.write_new(&key, &photo.bytes).await?;

        debug!(key = %key, "Photo written to upload directory");

        Ok(format!("{}/{}", self.url_prefix, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &Path) -> LocalStorageConfig {
        LocalStorageConfig {
            upload_dir: dir.join("uploads"),
            url_prefix: "/uploads/".to_string(),
        }
    }

    fn photo() -> PhotoUpload {
        PhotoUpload {
            bytes: b"\x89PNG fake".to_vec(),
            content_type: Some("image/png".to_string()),
            filename: "../evil name.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_relative_url() {
        let tmp = tempdir().unwrap();
        let store = LocalAttachmentStore::new(&config(tmp.path())).await.unwrap();

        let url = store.store("LEVEL", &photo()).await.unwrap();

        assert!(url.starts_with("/uploads/LEVEL-"));
        assert!(url.ends_with("-..evilname.png"));

        let name = url.trim_start_matches("/uploads/");
        let written = std::fs::read(store.upload_dir().join(name)).unwrap();
        assert_eq!(written, photo().bytes);
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let tmp = tempdir().unwrap();
        let store = LocalAttachmentStore::new(&config(tmp.path())).await.unwrap();

        store.write_new("same-key.png", b"first").await.unwrap();
        let err = store.write_new("same-key.png", b"second").await.unwrap_err();

        assert!(matches!(err, StorageError::Io(_)));
        let kept = std::fs::read(store.upload_dir().join("same-key.png")).unwrap();
        assert_eq!(kept, b"first");
    }

    #[tokio::test]
    async fn test_missing_directory_fails_store() {
        let tmp = tempdir().unwrap();
        let store = LocalAttachmentStore::new(&config(tmp.path())).await.unwrap();
        std::fs::remove_dir_all(store.upload_dir()).unwrap();

        assert!(store.store("LEVEL", &photo()).await.is_err());
    }
}
