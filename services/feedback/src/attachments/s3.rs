use super::{content_type_for, new_attachment_key, AttachmentStore};
use crate::config::S3Config;
use crate::error::StorageError;
use crate::models::PhotoUpload;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info, instrument, warn};

/// Uploads photos to an S3-compatible bucket
pub struct S3AttachmentStore {
    client: S3Client,
    bucket: String,
    config: S3Config,
}

impl S3AttachmentStore {
    /// Create a new S3 attachment store
    pub async fn new(config: &S3Config) -> Result<Self, StorageError> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 attachment store initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            config: config.clone(),
        })
    }

    /// Simple single-part upload for small files
    async fn simple_upload(
        &self,
        key: &str,
        content_type: &str,
        club_id: &str,
        photo: &PhotoUpload,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(photo.bytes.clone()))
            .content_type(content_type)
            .metadata("club-id", club_id)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("put_object failed: {e}")))?;

        Ok(())
    }

    /// Multipart upload for large files
    async fn multipart_upload(
        &self,
        key: &str,
        content_type: &str,
        club_id: &str,
        photo: &PhotoUpload,
    ) -> Result<(), StorageError> {
        let create_response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .metadata("club-id", club_id)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("create_multipart_upload failed: {e}")))?;

        let upload_id = create_response
            .upload_id()
            .ok_or_else(|| StorageError::Upload("no upload id in response".to_string()))?
            .to_string();

        match self.upload_parts(key, &upload_id, &photo.bytes).await {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::Upload(format!("complete_multipart_upload failed: {e}"))
                    })?;
                Ok(())
            }
            Err(e) => {
                // Uploaded parts persist until the upload is aborted
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(key = %key, error = %abort_err, "Failed to abort multipart upload");
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        bytes: &[u8],
    ) -> Result<Vec<CompletedPart>, StorageError> {
        let mut completed_parts = Vec::new();

        for (index, chunk) in bytes.chunks(self.config.part_size_bytes).enumerate() {
            let part_number = index as i32 + 1;

            let response = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk.to_vec()))
                .send()
                .await
                .map_err(|e| StorageError::Upload(format!("upload_part failed: {e}")))?;

            completed_parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(response.e_tag().unwrap_or_default())
                    .build(),
            );
        }

        Ok(completed_parts)
    }

    /// Public URL the uploaded object is served from
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.config, key)
    }
}

fn public_url(config: &S3Config, key: &str) -> String {
    if let Some(base) = &config.public_url_base {
        return format!("{}/{}", base.trim_end_matches('/'), key);
    }

    match (&config.endpoint_url, config.force_path_style) {
        (Some(endpoint), true) => {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), config.bucket, key)
        }
        (Some(endpoint), false) => {
            let (scheme, host) = endpoint
                .split_once("://")
                .unwrap_or(("https", endpoint.as_str()));
            format!(
                "{scheme}://{}.{}/{key}",
                config.bucket,
                host.trim_end_matches('/')
            )
        }
        (None, _) => format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            config.bucket, config.region, key
        ),
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    fn backend_tag(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self, photo), fields(size_bytes = photo.bytes.len()))]
    async fn store(&self, club_id: &str, photo: &PhotoUpload) -> Result<String, StorageError> {
        let key = new_attachment_key(club_id, &photo.filename);
        let content_type = content_type_for(photo);

        debug!(key = %key, content_type = %content_type, "Uploading photo to S3");

        if photo.bytes.len() > self.config.multipart_threshold_bytes {
            self.multipart_upload(&key, &content_type, club_id, photo)
                .await?;
        } else {
            self.simple_upload(&key, &content_type, club_id, photo)
                .await?;
        }

        info!(key = %key, "Photo uploaded to S3");

        Ok(self.public_url(&key))
    }
}
