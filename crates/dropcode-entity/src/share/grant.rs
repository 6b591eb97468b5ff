//! Redemption grant value object.

use serde::{Deserialize, Serialize};

use dropcode_core::types::ShareCode;

use crate::file::FileDescriptor;

/// The result of a successful redemption: one unit of the download budget
/// has been consumed and the holder may fetch the listed payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionGrant {
    /// The share code.
    pub code: ShareCode,
    /// Display name for the share.
    pub display_name: String,
    /// Files the holder may fetch.
    pub files: Vec<FileDescriptor>,
    /// Whether the files are a single degraded zip bundle.
    pub bundled: bool,
    /// Remaining budget after this redemption (`None` = unlimited).
    pub downloads_left: Option<u32>,
    /// Total downloads including this one.
    pub downloads: u64,
    /// Whether this redemption consumed the last budget unit; the record
    /// is already gone and payloads are scheduled for deletion.
    pub exhausted: bool,
}
