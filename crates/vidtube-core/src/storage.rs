//! Media store: where avatars, cover images, thumbnails and video files go.
//!
//! Handlers only see [`StorageBackend`]. The local backend writes under
//! `UPLOAD_DIR` (served back at `/media`); with the `s3` feature and
//! `S3_BUCKET` set, objects go to an S3-compatible bucket instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::VidtubeError;

#[cfg(feature = "s3")]
use crate::config::Config;

/// A stored object: `key` deletes it, `url` is handed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredMedia {
    /// Backend key (UUID-based to avoid collisions)
    pub key: String,
    /// Public URL or path
    pub url: String,
    /// MIME content type
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
}

/// Storage backend trait for pluggable media storage.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store bytes and return where they ended up.
    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredMedia, VidtubeError>;

    /// Delete an object by key. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), VidtubeError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, VidtubeError>;
}

/// Local filesystem storage backend.
///
/// ```rust,ignore
/// let storage = LocalStorage::new("./uploads");
/// let media = storage.store("avatar.png", "image/png", &bytes).await?;
/// println!("Served at: {}", media.url);
/// ```
#[derive(Clone)]
pub struct LocalStorage {
    pub upload_dir: PathBuf,
}

impl LocalStorage {
    /// URL prefix the app serves `upload_dir` under.
    pub const URL_PREFIX: &'static str = "/media";

    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        LocalStorage {
            upload_dir: upload_dir.into(),
        }
    }

    /// Ensure the upload directory exists.
    pub async fn ensure_dir(&self) -> Result<(), VidtubeError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| VidtubeError::Internal(format!("Failed to create upload dir: {}", e)))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, VidtubeError> {
        // Keys are generated by `store`; anything with a separator is not ours.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(VidtubeError::BadRequest(format!("Invalid media key '{}'", key)));
        }
        Ok(self.upload_dir.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredMedia, VidtubeError> {
        self.ensure_dir().await?;

        let key = stored_name(filename);
        tokio::fs::write(self.upload_dir.join(&key), data)
            .await
            .map_err(|e| VidtubeError::Internal(format!("Failed to write file: {}", e)))?;

        Ok(StoredMedia {
            url: format!("{}/{}", Self::URL_PREFIX, key),
            key,
            content_type: content_type.to_string(),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), VidtubeError> {
        let file_path = self.path_for(key)?;
        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VidtubeError::Internal(format!("Failed to delete file: {}", e))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, VidtubeError> {
        let file_path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&file_path).await.unwrap_or(false))
    }
}

fn stored_name(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{}", uuid::Uuid::new_v4(), ext)
}

// ---------------------------------------------------------------------------
// S3-compatible object storage backend (AWS S3, Cloudflare R2, MinIO, etc.)
// ---------------------------------------------------------------------------
#[cfg(feature = "s3")]
mod s3_backend {
    use super::*;
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::config::{Credentials, Region};
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::Client;

    /// S3-compatible media backend.
    #[derive(Clone)]
    pub struct S3Storage {
        client: Client,
        bucket: String,
        prefix: String,
        public_url: Option<String>,
    }

    impl S3Storage {
        /// Build from `S3_*` configuration values.
        pub async fn from_config(config: &Config) -> Result<Self, VidtubeError> {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| {
                    VidtubeError::Internal("S3_BUCKET must be set to use S3 storage".to_string())
                })?;

            let region = config
                .s3_region
                .clone()
                .unwrap_or_else(|| "us-east-1".to_string());

            let mut builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .force_path_style(true);

            if let Some(endpoint) = &config.s3_endpoint {
                builder = builder.endpoint_url(endpoint);
            }

            if let (Some(access_key), Some(secret_key)) =
                (&config.s3_access_key_id, &config.s3_secret_access_key)
            {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "vidtube-env");
                builder = builder.credentials_provider(credentials);
            } else {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await;
                let provider = shared
                    .credentials_provider()
                    .ok_or_else(|| {
                        VidtubeError::Internal(
                            "No S3 credentials found. Set S3_ACCESS_KEY_ID and \
                             S3_SECRET_ACCESS_KEY, or configure AWS credentials."
                                .to_string(),
                        )
                    })?
                    .clone();
                builder = builder.credentials_provider(provider);
            }

            Ok(S3Storage {
                client: Client::from_conf(builder.build()),
                bucket,
                prefix: config
                    .s3_prefix
                    .clone()
                    .unwrap_or_else(|| "media/".to_string()),
                public_url: config.s3_public_url.clone(),
            })
        }

        fn object_key(&self, key: &str) -> String {
            format!("{}{}", self.prefix, key)
        }

        fn public_url(&self, object_key: &str) -> String {
            match &self.public_url {
                Some(base) => format!("{}/{}", base.trim_end_matches('/'), object_key),
                None => format!("s3://{}/{}", self.bucket, object_key),
            }
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for S3Storage {
        async fn store(
            &self,
            filename: &str,
            content_type: &str,
            data: &[u8],
        ) -> Result<StoredMedia, VidtubeError> {
            let key = stored_name(filename);
            let object_key = self.object_key(&key);

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&object_key)
                .body(ByteStream::from(data.to_vec()))
                .content_type(content_type)
                .send()
                .await
                .map_err(|e| VidtubeError::Internal(format!("S3 upload failed: {}", e)))?;

            Ok(StoredMedia {
                url: self.public_url(&object_key),
                key,
                content_type: content_type.to_string(),
                size: data.len() as u64,
            })
        }

        async fn delete(&self, key: &str) -> Result<(), VidtubeError> {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(self.object_key(key))
                .send()
                .await
                .map_err(|e| VidtubeError::Internal(format!("S3 delete failed: {}", e)))?;
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool, VidtubeError> {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(self.object_key(key))
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_not_found() {
                        Ok(false)
                    } else {
                        Err(VidtubeError::Internal(format!(
                            "S3 head_object failed: {}",
                            service_err
                        )))
                    }
                }
            }
        }
    }
}

#[cfg(feature = "s3")]
pub use s3_backend::S3Storage;

/// One file part of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A parsed multipart form: text fields plus at most one file per field name.
///
/// ```rust,ignore
/// let mut form = MediaForm::parse(multipart, state.config.max_upload_size).await?;
/// let title = form.required_text("title")?;
/// let thumbnail = form.take_file("thumbnail");
/// ```
#[derive(Debug, Default)]
pub struct MediaForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadPart>,
}

impl MediaForm {
    /// Read the whole form, rejecting any file larger than `max_size` bytes.
    pub async fn parse(mut multipart: Multipart, max_size: u64) -> Result<Self, VidtubeError> {
        let mut form = MediaForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| VidtubeError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            match field.file_name().map(|s| s.to_string()) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| {
                            mime_guess::from_path(&filename)
                                .first_or_octet_stream()
                                .to_string()
                        });
                    let data = field.bytes().await.map_err(|e| {
                        VidtubeError::BadRequest(format!("Failed to read field: {}", e))
                    })?;

                    if data.len() as u64 > max_size {
                        return Err(VidtubeError::BadRequest(format!(
                            "File '{}' exceeds maximum size of {} bytes",
                            filename, max_size
                        )));
                    }
                    if data.is_empty() {
                        continue;
                    }

                    form.files.insert(
                        name,
                        UploadPart {
                            filename,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        VidtubeError::BadRequest(format!("Failed to read field: {}", e))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed text field that must be present and non-blank.
    pub fn required_text(&self, name: &str) -> Result<String, VidtubeError> {
        self.text(name)
            .ok_or_else(|| VidtubeError::BadRequest(format!("{} is required", name)))
    }

    /// Take ownership of an uploaded file.
    pub fn take_file(&mut self, name: &str) -> Option<UploadPart> {
        self.files.remove(name)
    }
}

/// Store an upload after checking its MIME family (e.g. `"image/"`).
pub async fn store_upload(
    storage: &dyn StorageBackend,
    part: &UploadPart,
    allowed: &[&str],
) -> Result<StoredMedia, VidtubeError> {
    validate_content_type(&part.content_type, allowed)?;
    storage
        .store(&part.filename, &part.content_type, &part.data)
        .await
}

/// Best-effort delete for media that has already been replaced or orphaned.
pub async fn discard(storage: &dyn StorageBackend, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(key, error = %e, "failed to delete media");
    }
}

/// Helper to validate allowed MIME types.
pub fn validate_content_type(content_type: &str, allowed: &[&str]) -> Result<(), VidtubeError> {
    if !allowed.iter().any(|a| content_type.starts_with(a)) {
        return Err(VidtubeError::BadRequest(format!(
            "Content type '{}' not allowed. Allowed: {:?}",
            content_type, allowed
        )));
    }
    Ok(())
}
