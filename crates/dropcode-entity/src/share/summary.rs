//! Non-consuming share summary value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dropcode_core::types::ShareCode;

/// Metadata returned by a verification lookup. Contains no storage
/// locators, so handing it to a would-be downloader is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSummary {
    /// The share code.
    pub code: ShareCode,
    /// Display name for the share.
    pub display_name: String,
    /// Total payload size in bytes.
    pub total_size_bytes: u64,
    /// Number of files in the share.
    pub file_count: usize,
    /// MIME type of the first file.
    pub mime_type: String,
    /// When the share was registered.
    pub created_at: DateTime<Utc>,
    /// When the share expires.
    pub expires_at: DateTime<Utc>,
    /// The configured expiry window in minutes.
    pub expiry_minutes: u32,
    /// Configured download budget (`None` = unlimited).
    pub max_downloads: Option<u32>,
    /// Remaining download budget (`None` = unlimited).
    pub downloads_left: Option<u32>,
    /// Total downloads so far.
    pub downloads: u64,
    /// Whether a redemption would currently succeed.
    pub redeemable: bool,
}
