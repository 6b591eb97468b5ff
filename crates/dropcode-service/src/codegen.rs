//! Share code generation.

use rand::Rng;

use dropcode_core::types::{CODE_ALPHABET, ShareCode};

/// Generates random share codes over the unambiguous alphabet.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    /// Length of generated codes.
    length: usize,
}

impl CodeGenerator {
    /// Create a generator producing codes of the given length.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Generate a fresh random code.
    ///
    /// Uniqueness is the caller's problem: registration claims the code
    /// with a set-if-absent write and retries on collision.
    pub fn generate(&self) -> ShareCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        ShareCode::from_generated(code)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(5)
    }
}
