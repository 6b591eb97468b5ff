//! Share record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dropcode_core::types::ShareCode;

use crate::file::FileDescriptor;

/// The record a share code maps to.
///
/// Creation data and configured limits live here; the *live* download
/// budget is kept in a dedicated store counter so concurrent redemptions
/// can decrement it atomically. The record itself is immutable between
/// settings updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    /// The share code.
    pub code: ShareCode,
    /// Files belonging to this share.
    pub files: Vec<FileDescriptor>,
    /// Display name: the file name for single-file shares, "N files" otherwise.
    pub display_name: String,
    /// Total payload size in bytes.
    pub total_size_bytes: u64,
    /// When the share was registered.
    pub created_at: DateTime<Utc>,
    /// When the share expires.
    pub expires_at: DateTime<Utc>,
    /// The configured expiry window in minutes.
    pub expiry_minutes: u32,
    /// Configured download budget (`None` = unlimited).
    pub max_downloads: Option<u32>,
    /// Whether the payload was degraded to a single zip bundle.
    pub bundled: bool,
}

impl ShareRecord {
    /// Check whether the share has passed its expiry timestamp.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The redeemability invariant: a share is redeemable iff it has not
    /// expired and its remaining budget (if any) is positive.
    pub fn is_redeemable(&self, now: DateTime<Utc>, downloads_left: Option<u32>) -> bool {
        if self.is_expired(now) {
            return false;
        }
        match (self.max_downloads, downloads_left) {
            (None, _) => true,
            (Some(_), Some(left)) => left > 0,
            // Budgeted share whose counter is gone: treat as spent.
            (Some(_), None) => false,
        }
    }

    /// Build the display name for a set of files.
    pub fn display_name_for(files: &[FileDescriptor]) -> String {
        match files {
            [single] => single.name.clone(),
            many => format!("{} files", many.len()),
        }
    }
}

/// A settings update applied to an existing share.
///
/// The outer `Option` means "leave unchanged"; for `max_downloads` the
/// inner `Option` distinguishes a concrete budget from unlimited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareSettingsUpdate {
    /// New expiry window in minutes.
    pub expiry_minutes: Option<u32>,
    /// New download budget (`Some(None)` = unlimited).
    pub max_downloads: Option<Option<u32>>,
}

impl ShareSettingsUpdate {
    /// Whether the update changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.expiry_minutes.is_none() && self.max_downloads.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn record(max_downloads: Option<u32>) -> ShareRecord {
        let now = Utc::now();
        ShareRecord {
            code: ShareCode::parse("AB2CD").unwrap(),
            files: vec![FileDescriptor {
                id: Uuid::new_v4(),
                name: "notes.txt".to_string(),
                mime_type: "text/plain".to_string(),
                size_bytes: 42,
                storage_path: "shares/AB2CD/notes.txt".to_string(),
            }],
            display_name: "notes.txt".to_string(),
            total_size_bytes: 42,
            created_at: now,
            expires_at: now + Duration::minutes(10),
            expiry_minutes: 10,
            max_downloads,
            bundled: false,
        }
    }

    #[test]
    fn test_redeemable_within_window_and_budget() {
        let rec = record(Some(5));
        assert!(rec.is_redeemable(Utc::now(), Some(3)));
    }

    #[test]
    fn test_not_redeemable_when_expired() {
        let rec = record(Some(5));
        let later = Utc::now() + Duration::minutes(11);
        assert!(!rec.is_redeemable(later, Some(3)));
    }

    #[test]
    fn test_not_redeemable_when_budget_spent() {
        let rec = record(Some(5));
        assert!(!rec.is_redeemable(Utc::now(), Some(0)));
        assert!(!rec.is_redeemable(Utc::now(), None));
    }

    #[test]
    fn test_unlimited_budget_always_redeemable_before_expiry() {
        let rec = record(None);
        assert!(rec.is_redeemable(Utc::now(), None));
    }

    #[test]
    fn test_display_name() {
        let rec = record(None);
        assert_eq!(ShareRecord::display_name_for(&rec.files), "notes.txt");

        let mut files = rec.files.clone();
        files.push(files[0].clone());
        files.push(files[0].clone());
        assert_eq!(ShareRecord::display_name_for(&files), "3 files");
    }
}
