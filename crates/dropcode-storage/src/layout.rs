//! Storage path layout for share payloads.
//!
//! Everything a share stores lives under `shares/{CODE}/`, so destroying
//! a share is a single directory removal and the cleanup sweep can map
//! directories back to codes.

use dropcode_core::types::ShareCode;
use uuid::Uuid;

/// Top-level directory holding one subdirectory per live share.
pub const SHARES_DIR: &str = "shares";

/// Directory for in-flight bundle artifacts, swept by the worker.
pub const TEMP_DIR: &str = "tmp";

/// Payload directory for a share.
pub fn payload_dir(code: &ShareCode) -> String {
    format!("{SHARES_DIR}/{code}")
}

/// Storage path for one payload file. The stored name is the descriptor
/// ID plus the original extension; original names are kept only in the
/// record (uploads with the same name must not overwrite each other).
pub fn payload_file(code: &ShareCode, file_id: Uuid, original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{SHARES_DIR}/{code}/{file_id}.{ext}")
        }
        _ => format!("{SHARES_DIR}/{code}/{file_id}"),
    }
}

/// Storage path of the zip-fallback bundle for a share.
pub fn bundle_file(code: &ShareCode) -> String {
    format!("{SHARES_DIR}/{code}/{code}.zip")
}

/// Extract the share code a payload directory belongs to, if its name
/// parses as one.
pub fn code_for_dir(dir_name: &str) -> Option<ShareCode> {
    ShareCode::parse(dir_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_file_keeps_extension() {
        let code = ShareCode::parse("AB2CD").unwrap();
        let id = Uuid::nil();
        assert_eq!(
            payload_file(&code, id, "report.pdf"),
            format!("shares/AB2CD/{id}.pdf")
        );
        assert_eq!(
            payload_file(&code, id, "Makefile"),
            format!("shares/AB2CD/{id}")
        );
        // A leading dot is a hidden file, not an extension.
        assert_eq!(
            payload_file(&code, id, ".env"),
            format!("shares/AB2CD/{id}")
        );
    }

    #[test]
    fn test_bundle_file() {
        let code = ShareCode::parse("AB2CD").unwrap();
        assert_eq!(bundle_file(&code), "shares/AB2CD/AB2CD.zip");
    }

    #[test]
    fn test_code_for_dir() {
        assert!(code_for_dir("AB2CD").is_some());
        assert!(code_for_dir("not-a-code!").is_none());
    }
}
