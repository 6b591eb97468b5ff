//! # dropcode-entity
//!
//! Domain models for DropCode. Every struct in this crate is a plain serde
//! value object; share state lives in a key-value store, so there is no
//! relational mapping layer. All entities derive `Debug`, `Clone`,
//! `Serialize`, and `Deserialize`.

pub mod file;
pub mod share;
