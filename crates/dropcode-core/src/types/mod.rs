//! Shared domain value types.

pub mod code;

pub use code::{CODE_ALPHABET, ShareCode};
