//! Local filesystem storage provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use dropcode_core::error::{AppError, ErrorKind};
use dropcode_core::result::AppResult;
use dropcode_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored payloads.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a relative path to an absolute path within the root.
    fn resolve(&self, path: &str) -> PathBuf {
        let clean = path.trim_start_matches('/');
        self.root.join(clean)
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path);
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {path}"),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(|b| b.into()))))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path);
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read file: {path}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path);
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {path}"),
                e,
            )
        })?;

        debug!(path, bytes = data.len(), "Wrote payload");
        Ok(())
    }

    async fn write_stream(&self, path: &str, mut stream: ByteStream) -> AppResult<u64> {
        let full_path = self.resolve(path);
        self.ensure_parent(&full_path).await?;

        let mut file = fs::File::create(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create file: {path}"),
                e,
            )
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
            })?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))?;

        debug!(path, bytes = total_bytes, "Wrote payload from stream");
        Ok(total_bytes)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path);
        if full_path.exists() {
            fs::remove_file(&full_path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete file: {path}"),
                    e,
                )
            })?;
        }
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path);
        if full_path.exists() {
            fs::remove_dir_all(&full_path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete directory: {path}"),
                    e,
                )
            })?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path);
        Ok(full_path.exists())
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let full_path = self.resolve(path);
        let meta = fs::metadata(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Path not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to get metadata: {path}"),
                    e,
                )
            }
        })?;

        let last_modified = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t));

        Ok(StorageObjectMeta {
            path: path.to_string(),
            size_bytes: meta.len(),
            last_modified,
            is_directory: meta.is_dir(),
        })
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        let full_path = self.resolve(path);
        let mut entries = fs::read_dir(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Directory not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list directory: {path}"),
                    e,
                )
            }
        })?;

        let mut results = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read entry metadata", e)
            })?;
            let last_modified = meta
                .modified()
                .ok()
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t));

            results.push(StorageObjectMeta {
                path: format!("{}/{}", path.trim_end_matches('/'), name),
                size_bytes: meta.len(),
                last_modified,
                is_directory: meta.is_dir(),
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn make_provider() -> (tempfile::TempDir, LocalStorageProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (_dir, provider) = make_provider().await;
        provider
            .write("shares/AB2CD/file.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        let data = provider.read_bytes("shares/AB2CD/file.txt").await.unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, provider) = make_provider().await;
        let err = provider.read_bytes("shares/XXXXX/gone").await.unwrap_err();
        assert_eq!(err.kind, dropcode_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_dir_removes_share_payloads() {
        let (_dir, provider) = make_provider().await;
        provider
            .write("shares/AB2CD/a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        provider
            .write("shares/AB2CD/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        provider.delete_dir("shares/AB2CD").await.unwrap();
        assert!(!provider.exists("shares/AB2CD").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_directory() {
        let (_dir, provider) = make_provider().await;
        provider
            .write("shares/AB2CD/a.txt", Bytes::from_static(b"aaa"))
            .await
            .unwrap();
        provider
            .write("shares/EFGH2/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        let entries = provider.list("shares").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_directory));
    }

    #[tokio::test]
    async fn test_stream_roundtrip() {
        let (_dir, provider) = make_provider().await;
        provider
            .write("shares/AB2CD/big.bin", Bytes::from(vec![7u8; 64 * 1024]))
            .await
            .unwrap();

        let mut stream = provider.read("shares/AB2CD/big.bin").await.unwrap();
        let mut total = 0usize;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 64 * 1024);
    }
}
