//! # dropcode-worker
//!
//! Background maintenance. Store TTLs expire records on their own, but
//! payload files and temp artifacts live outside the store and need an
//! active sweep: a cron-scheduled pass removes payload directories whose
//! record is gone and stale temp entries.

pub mod scheduler;
pub mod sweep;

pub use scheduler::SweepScheduler;
pub use sweep::{SweepReport, SweepService};
