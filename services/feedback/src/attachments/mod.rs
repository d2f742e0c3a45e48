//! Photo attachment storage.
//!
//! Both backends satisfy [`AttachmentStore`]; which one runs is chosen from
//! configuration at startup by [`build_attachment_store`].

pub mod local;
pub mod s3;

use crate::config::{AttachmentBackend, AttachmentConfig};
use crate::error::StorageError;
use crate::models::PhotoUpload;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

pub use local::LocalAttachmentStore;
pub use s3::S3AttachmentStore;

/// Stores an uploaded photo and resolves a URL it can be fetched from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Short backend name for logs and metrics
    fn backend_tag(&self) -> &'static str;

    /// Persist the photo for a club and return its public URL
    async fn store(&self, club_id: &str, photo: &PhotoUpload) -> Result<String, StorageError>;
}

/// Build the configured backend
pub async fn build_attachment_store(
    config: &AttachmentConfig,
) -> anyhow::Result<Arc<dyn AttachmentStore>> {
    match config.backend {
        AttachmentBackend::Local => {
            let store = LocalAttachmentStore::new(&config.local)
                .await
                .context("Failed to initialize local attachment store")?;
            Ok(Arc::new(store))
        }
        AttachmentBackend::S3 => {
            let s3_config = config
                .s3
                .as_ref()
                .context("attachments.s3 section is required for the s3 backend")?;
            let store = S3AttachmentStore::new(s3_config)
                .await
                .context("Failed to initialize S3 attachment store")?;
            Ok(Arc::new(store))
        }
    }
}

/// Object name for an upload.
/// Format: {club_id}-{unix_millis}-{original_filename}, each part sanitized
pub fn attachment_key(club_id: &str, filename: &str, unix_millis: i64) -> String {
    format!(
        "{}-{}-{}",
        sanitize_component(club_id),
        unix_millis,
        sanitize_component(filename)
    )
}

/// Key stamped with the current wall-clock time
pub fn new_attachment_key(club_id: &str, filename: &str) -> String {
    attachment_key(club_id, filename, Utc::now().timestamp_millis())
}

/// Keep only `[A-Za-z0-9.-]`, which also removes path separators
fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect()
}

/// Content type to record for an upload
pub fn content_type_for(photo: &PhotoUpload) -> String {
    if let Some(declared) = photo.content_type.as_deref().filter(|ct| !ct.is_empty()) {
        return declared.to_string();
    }

    let extension = photo
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
    .to_string()
}
