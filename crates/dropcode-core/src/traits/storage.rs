//! Storage provider trait for share payload storage.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Path within the storage provider.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for payload storage backends.
///
/// The trait is defined here in `dropcode-core` and implemented in
/// `dropcode-storage` for the local filesystem.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read a file and return its byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Read a file into memory as a complete byte vector.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write bytes to a file at the given path.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Write a byte stream to a file at the given path.
    async fn write_stream(&self, path: &str, stream: ByteStream) -> AppResult<u64>;

    /// Delete a file at the given path.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete a directory and all its contents recursively.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Check whether a file or directory exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Get metadata about a file or directory.
    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta>;

    /// List the contents of a directory.
    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>>;
}
