//! # dropcode-service
//!
//! The share lifecycle: code generation, upload registration with
//! collision-checked codes, the atomic redemption protocol, verification,
//! and settings updates. Everything here works against the [`ShareStore`]
//! and [`StorageProvider`] seams, so backends are interchangeable.
//!
//! [`ShareStore`]: dropcode_core::traits::store::ShareStore
//! [`StorageProvider`]: dropcode_core::traits::storage::StorageProvider

pub mod codegen;
pub mod records;
pub mod redeem;
pub mod service;
pub mod upload;

pub use codegen::CodeGenerator;
pub use records::ShareRecords;
pub use redeem::RedeemService;
pub use service::ShareService;
pub use upload::UploadService;
