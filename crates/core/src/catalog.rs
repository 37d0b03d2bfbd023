//! Catalog constants, validation, and checksum helpers.
//!
//! Provides URL and MD5 validation for batch ingest, checksum comparison
//! for lease completion, and the system-config keys (with hard-coded
//! fallbacks) that govern worker liveness.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// System config keys and fallback defaults
// ---------------------------------------------------------------------------

/// Config key: how often a worker should send heartbeats (seconds).
pub const CONFIG_HEARTBEAT_INTERVAL: &str = "heartbeat_interval_seconds";

/// Config key: how long without a heartbeat before a lease is reclaimed (seconds).
pub const CONFIG_HEARTBEAT_TIMEOUT: &str = "heartbeat_timeout_seconds";

/// Fallback heartbeat interval when the config row is absent.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: i64 = 30;

/// Fallback heartbeat timeout when the config row is absent.
pub const DEFAULT_HEARTBEAT_TIMEOUT_SECS: i64 = 90;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Length of a hex-encoded MD5 digest.
pub const MD5_HEX_LEN: usize = 32;

/// Validate that a checksum is exactly 32 hexadecimal characters.
pub fn validate_md5(md5: &str) -> Result<(), CoreError> {
    if md5.len() != MD5_HEX_LEN || !md5.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "Checksum must be exactly {MD5_HEX_LEN} hexadecimal characters, got: '{md5}'"
        )));
    }
    Ok(())
}

/// Normalize a checksum to lowercase hex for storage and fingerprinting.
///
/// Callers are expected to have run [`validate_md5`] first.
pub fn normalize_md5(md5: &str) -> String {
    md5.to_ascii_lowercase()
}

/// Case-insensitive checksum comparison.
///
/// The upstream system only ever produced lowercase digests; comparing
/// case-insensitively tolerates uppercase-reporting clients as well.
pub fn md5_matches(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

/// Validate that a dataset URL is non-empty and starts with `http`.
pub fn validate_download_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Dataset URL must not be empty".to_string(),
        ));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CoreError::Validation(format!(
            "Dataset URL must start with http:// or https://, got: '{trimmed}'"
        )));
    }
    Ok(())
}
