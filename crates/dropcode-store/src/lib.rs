//! # dropcode-store
//!
//! Share store implementations for DropCode. Supports two backends:
//!
//! - **memory**: In-process store using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The backend is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
