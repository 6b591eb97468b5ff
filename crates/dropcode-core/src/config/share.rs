//! Share lifecycle defaults and limits.

use serde::{Deserialize, Serialize};

/// Defaults governing share creation and settings updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Length of generated share codes.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Number of fresh codes tried before giving up on a collision streak.
    #[serde(default = "default_collision_attempts")]
    pub max_collision_attempts: u32,
    /// Default expiry window in minutes for new shares.
    #[serde(default = "default_expiry_minutes")]
    pub default_expiry_minutes: u32,
    /// Expiry windows (minutes) accepted by settings updates.
    #[serde(default = "default_allowed_expiry")]
    pub allowed_expiry_minutes: Vec<u32>,
    /// Default download budget for new shares (`None` = unlimited).
    #[serde(default = "default_max_downloads")]
    pub default_max_downloads: Option<u32>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            max_collision_attempts: default_collision_attempts(),
            default_expiry_minutes: default_expiry_minutes(),
            allowed_expiry_minutes: default_allowed_expiry(),
            default_max_downloads: default_max_downloads(),
        }
    }
}

fn default_code_length() -> usize {
    5
}

fn default_collision_attempts() -> u32 {
    5
}

fn default_expiry_minutes() -> u32 {
    10
}

fn default_allowed_expiry() -> Vec<u32> {
    vec![5, 10, 30]
}

fn default_max_downloads() -> Option<u32> {
    Some(5)
}
