use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Image file not found: {0}")]
    NotFound(String),

    #[error("Image storage error: {0}")]
    Io(String),
}

/// Byte source for uploaded images. Lifecycle, quotas and cleanup are not its concern.
pub trait ImageStore {
    fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn load(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;
}

/// Images under a local media root
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are relative; anything that climbs out of the root does not exist.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        (contained && !key.is_empty()).then(|| self.root.join(relative))
    }
}

impl ImageStore for LocalImageStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self
            .resolve(key)
            .ok_or_else(|| StorageError::Io(format!("Invalid image key: {}", key)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self
            .resolve(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(StorageError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Images in an S3 bucket, keyed by object key
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
}

impl S3ImageStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Io(format!("S3 put_object error: {}", e)))?;

        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(format!("s3://{}/{}", self.bucket, key))
                } else {
                    StorageError::Io(format!("S3 get_object error: {}", service_error))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Io(format!("S3 body read error: {}", e)))?;

        Ok(data.into_bytes().to_vec())
    }
}

/// The store selected by configuration
#[derive(Debug, Clone)]
pub enum ImageStorage {
    Local(LocalImageStore),
    S3(S3ImageStore),
}

impl ImageStorage {
    pub fn from_config(config: &StorageConfig, s3_client: S3Client) -> Self {
        match config {
            StorageConfig::Local { media_root } => {
                ImageStorage::Local(LocalImageStore::new(media_root.clone()))
            }
            StorageConfig::S3 { bucket } => {
                ImageStorage::S3(S3ImageStore::new(s3_client, bucket.clone()))
            }
        }
    }
}

impl ImageStore for ImageStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        match self {
            ImageStorage::Local(store) => store.put(key, bytes, content_type).await,
            ImageStorage::S3(store) => store.put(key, bytes, content_type).await,
        }
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            ImageStorage::Local(store) => store.load(key).await,
            ImageStorage::S3(store) => store.load(key).await,
        }
    }
}
