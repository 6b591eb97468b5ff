//! Store key builders for all DropCode entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Codes are canonical
//! (uppercase) by the time they reach this module.

use dropcode_core::types::ShareCode;

/// Key holding the serialized share record.
pub fn share_record(code: &ShareCode) -> String {
    format!("share:{code}")
}

/// Key holding the remaining-download counter of a budgeted share.
pub fn share_slots(code: &ShareCode) -> String {
    format!("share:{code}:slots")
}

/// Key holding the total-download counter.
pub fn share_downloads(code: &ShareCode) -> String {
    format!("share:{code}:downloads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_use_canonical_code() {
        let code = ShareCode::parse("ab2cd").unwrap();
        assert_eq!(share_record(&code), "share:AB2CD");
        assert_eq!(share_slots(&code), "share:AB2CD:slots");
        assert_eq!(share_downloads(&code), "share:AB2CD:downloads");
    }
}
