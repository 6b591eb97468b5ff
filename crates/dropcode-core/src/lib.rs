//! # dropcode-core
//!
//! Core crate for DropCode. Contains traits, configuration schemas, the
//! share-code type, domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DropCode crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
