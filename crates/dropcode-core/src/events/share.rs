//! Share lifecycle events.

use serde::{Deserialize, Serialize};

/// Events related to the share lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShareEvent {
    /// A share was registered.
    Created {
        /// The share code.
        code: String,
        /// Number of files in the share.
        file_count: usize,
        /// Total payload size in bytes.
        total_size: u64,
        /// Whether the payload was degraded to a single zip bundle.
        bundled: bool,
    },
    /// A redemption consumed one unit of the download budget.
    Redeemed {
        /// The share code.
        code: String,
        /// Remaining budget after this redemption (`None` = unlimited).
        downloads_left: Option<u32>,
        /// Total downloads so far.
        downloads: u64,
    },
    /// The last budget unit was consumed and the record destroyed.
    Exhausted {
        /// The share code.
        code: String,
    },
    /// A share expired (observed by a reader or the sweep).
    Expired {
        /// The share code.
        code: String,
    },
    /// Expiry or budget settings were changed.
    SettingsUpdated {
        /// The share code.
        code: String,
        /// New expiry window in minutes, if changed.
        expiry_minutes: Option<u32>,
        /// New download budget, if changed (`None` inside = unlimited).
        max_downloads: Option<Option<u32>>,
    },
}
