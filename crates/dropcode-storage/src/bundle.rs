//! Zip bundling for the multi-file fallback artifact.
//!
//! When per-file persistence fails mid-upload, or a redeemer wants a
//! multi-file share as one download, the files are packed into a single
//! zip archive. Archive construction is synchronous, so it runs on the
//! blocking pool.

use std::io::{Cursor, Write};

use bytes::Bytes;
use tracing::debug;

use dropcode_core::error::{AppError, ErrorKind};
use dropcode_core::result::AppResult;

/// Builds zip archives from in-memory payloads.
#[derive(Debug, Clone, Default)]
pub struct ZipBundler;

impl ZipBundler {
    /// Create a new bundler.
    pub fn new() -> Self {
        Self
    }

    /// Pack the given `(name, data)` pairs into a zip archive.
    ///
    /// Entry names repeat when users upload files with identical names;
    /// duplicates get a numeric prefix so no entry is silently lost.
    pub async fn bundle(&self, files: Vec<(String, Bytes)>) -> AppResult<Bytes> {
        if files.is_empty() {
            return Err(AppError::validation("Cannot bundle an empty file list"));
        }

        let file_count = files.len();
        let archive = tokio::task::spawn_blocking(move || build_archive(files))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Bundle task panicked", e)
            })??;

        debug!(
            files = file_count,
            bytes = archive.len(),
            "Built zip bundle"
        );
        Ok(Bytes::from(archive))
    }
}

fn build_archive(files: Vec<(String, Bytes)>) -> AppResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut used_names: Vec<String> = Vec::new();
    for (index, (name, data)) in files.into_iter().enumerate() {
        let entry_name = if used_names.contains(&name) {
            format!("{index}-{name}")
        } else {
            name.clone()
        };
        used_names.push(name);

        writer.start_file(&entry_name, options).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to start zip entry: {entry_name}"),
                e,
            )
        })?;
        writer.write_all(&data).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write zip entry: {entry_name}"),
                e,
            )
        })?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to finish zip", e))?;
    Ok(cursor.into_inner())
}
