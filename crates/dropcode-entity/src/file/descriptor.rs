//! File descriptor model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single file belonging to a share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Unique descriptor identifier (also the stem of the storage name).
    pub id: Uuid,
    /// The original file name (including extension).
    pub name: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// The path within the storage provider.
    pub storage_path: String,
}

impl FileDescriptor {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}
