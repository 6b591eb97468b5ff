//! Background cleanup worker configuration.

use serde::{Deserialize, Serialize};

/// Background cleanup worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the cleanup worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the orphan payload sweep.
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
    /// Age in minutes after which temp bundle artifacts are removed.
    #[serde(default = "default_temp_max_age")]
    pub temp_max_age_minutes: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_schedule: default_sweep_schedule(),
            temp_max_age_minutes: default_temp_max_age(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_schedule() -> String {
    // Every 5 minutes.
    "0 */5 * * * *".to_string()
}

fn default_temp_max_age() -> u64 {
    60
}
