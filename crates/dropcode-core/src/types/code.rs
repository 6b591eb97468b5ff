//! The human-typed share code.
//!
//! Codes are short strings over a fixed alphabet that excludes the
//! ambiguous characters `I`, `O`, `0`, and `1`. Input is case-insensitive;
//! the canonical form is uppercase and every store key is built from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Characters a share code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Maximum accepted code length (generated codes are much shorter).
const MAX_CODE_LENGTH: usize = 16;

/// A validated, canonicalized share code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareCode(String);

impl ShareCode {
    /// Parse and canonicalize a user-entered code.
    ///
    /// Lowercase input is accepted and uppercased; anything outside the
    /// code alphabet is rejected.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let canonical = input.trim().to_ascii_uppercase();

        if canonical.is_empty() {
            return Err(AppError::validation("Share code must not be empty"));
        }
        if canonical.len() > MAX_CODE_LENGTH {
            return Err(AppError::validation(format!(
                "Share code exceeds {MAX_CODE_LENGTH} characters"
            )));
        }
        if let Some(bad) = canonical
            .bytes()
            .find(|b| !CODE_ALPHABET.contains(b))
        {
            return Err(AppError::validation(format!(
                "Share code contains invalid character '{}'",
                bad as char
            )));
        }

        Ok(Self(canonical))
    }

    /// Build a code from characters already drawn from the alphabet.
    ///
    /// Used by the code generator; skips validation of individual bytes.
    pub fn from_generated(code: String) -> Self {
        debug_assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        Self(code)
    }

    /// Return the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShareCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShareCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareCode> for String {
    fn from(code: ShareCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uppercases() {
        let code = ShareCode::parse("ab2cd").unwrap();
        assert_eq!(code.as_str(), "AB2CD");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let code = ShareCode::parse("  XYZ23 ").unwrap();
        assert_eq!(code.as_str(), "XYZ23");
    }

    #[test]
    fn test_rejects_ambiguous_characters() {
        assert!(ShareCode::parse("ABCD0").is_err());
        assert!(ShareCode::parse("ABCDO").is_err());
        assert!(ShareCode::parse("ABCD1").is_err());
        assert!(ShareCode::parse("ABCDI").is_err());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(ShareCode::parse("").is_err());
        assert!(ShareCode::parse(&"A".repeat(17)).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let code = ShareCode::parse("ab2cd").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"AB2CD\"");
        let back: ShareCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }
}
