//! # dropcode-storage
//!
//! Payload storage for DropCode. Share payloads live on the local
//! filesystem under one directory per share code; the bundle module
//! builds the single-zip fallback artifact for multi-file shares.

pub mod bundle;
pub mod layout;
pub mod providers;

pub use bundle::ZipBundler;
pub use providers::local::LocalStorageProvider;
