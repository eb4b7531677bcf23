//! Object storage for uploaded CV files.
//!
//! `S3ObjectStorage` targets MinIO locally and S3 in production; `LocalObjectStorage`
//! keeps objects in a directory for single-node setups.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an uploaded object landed and how to fetch it for a limited time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    pub object_name: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, bytes: Bytes, object_name: &str) -> Result<StoredObject, StorageError>;

    async fn download(&self, object_name: &str) -> Result<Bytes, StorageError>;

    /// Returns whether an object was removed.
    async fn delete(&self, object_name: &str) -> Result<bool, StorageError>;
}

fn content_type_for(object_name: &str) -> &'static str {
    match Path::new(object_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Rejects absolute names and parent-directory segments.
fn validate_object_name(object_name: &str) -> Result<(), StorageError> {
    let path = Path::new(object_name);
    let safe = !object_name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(StorageError::InvalidName(object_name.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    url_expiry: Duration,
}

impl S3ObjectStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, url_expiry: Duration) -> Self {
        Self {
            client,
            bucket,
            url_expiry,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(&self, bytes: Bytes, object_name: &str) -> Result<StoredObject, StorageError> {
        validate_object_name(object_name)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_name)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(object_name))
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        let presigning = PresigningConfig::expires_in(self.url_expiry)
            .map_err(|e| StorageError::S3(format!("invalid URL expiry: {e}")))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_name)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::S3(format!("presigning failed: {e}")))?;

        info!("Uploaded CV to s3://{}/{}", self.bucket, object_name);

        Ok(StoredObject {
            object_name: object_name.to_string(),
            url: presigned.uri().to_string(),
        })
    }

    async fn download(&self, object_name: &str) -> Result<Bytes, StorageError> {
        validate_object_name(object_name)?;

        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("download failed: {e}")))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading object body failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, object_name: &str) -> Result<bool, StorageError> {
        validate_object_name(object_name)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;
        Ok(true)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local directory
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, object_name: &str) -> Result<PathBuf, StorageError> {
        validate_object_name(object_name)?;
        Ok(self.root.join(object_name))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, bytes: Bytes, object_name: &str) -> Result<StoredObject, StorageError> {
        let path = self.path_for(object_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        let absolute = tokio::fs::canonicalize(&path).await?;
        Ok(StoredObject {
            object_name: object_name.to_string(),
            url: format!("file://{}", absolute.display()),
        })
    }

    async fn download(&self, object_name: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(object_name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(object_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, object_name: &str) -> Result<bool, StorageError> {
        let path = self.path_for(object_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_upload_download_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let stored = storage
            .upload(Bytes::from_static(b"%PDF-1.4"), "cvs/ada_resume.pdf")
            .await
            .unwrap();
        assert_eq!(stored.object_name, "cvs/ada_resume.pdf");
        assert!(stored.url.starts_with("file://"));

        let data = storage.download("cvs/ada_resume.pdf").await.unwrap();
        assert_eq!(&data[..], b"%PDF-1.4");

        assert!(storage.delete("cvs/ada_resume.pdf").await.unwrap());
        assert!(!storage.delete("cvs/ada_resume.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());
        let err = storage.download("cvs/nobody.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_object_names_cannot_escape_root() {
        assert!(validate_object_name("cvs/a.pdf").is_ok());
        assert!(validate_object_name("../etc/passwd").is_err());
        assert!(validate_object_name("/abs/path.pdf").is_err());
        assert!(validate_object_name("").is_err());
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for("cvs/a.PDF"), "application/pdf");
        assert_eq!(content_type_for("cvs/a.txt"), "text/plain");
        assert_eq!(content_type_for("cvs/a"), "application/octet-stream");
    }
}
