//! Trait seams implemented by the store and storage crates.

pub mod storage;
pub mod store;

pub use storage::{ByteStream, StorageObjectMeta, StorageProvider};
pub use store::ShareStore;
