//! Attr-name and file-name validators.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

fn attr_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap())
}

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Validates a tag attr name against invariant 7. `allow_reserved` should be
/// `true` only for writes made by the platform itself (e.g. `trac_data_*`
/// provenance attrs written by the data service).
pub fn validate_attr_name(name: &str, allow_reserved: bool) -> Result<()> {
    if !attr_name_pattern().is_match(name) {
        return Err(Error::invalid_argument(format!(
            "attr name '{name}' does not match [A-Za-z][A-Za-z0-9_]*"
        )));
    }
    if !allow_reserved
        && (name.starts_with("trac_") || name.starts_with("__") || name.starts_with('_'))
    {
        return Err(Error::invalid_argument(format!(
            "attr name '{name}' uses a reserved prefix"
        )));
    }
    Ok(())
}

/// Validates a FILE name against invariant 8.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument("file name must not be empty"));
    }
    if name.chars().any(|c| c.is_control() || c == '\0') {
        return Err(Error::invalid_argument("file name must not contain control characters"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_argument("file name must not contain path separators"));
    }
    if name.trim() != name {
        return Err(Error::invalid_argument(
            "file name must not have leading or trailing whitespace",
        ));
    }
    if name.ends_with('.') {
        return Err(Error::invalid_argument("file name must not end with a trailing dot"));
    }
    if name.starts_with("trac_") || name.starts_with('_') {
        return Err(Error::invalid_argument(
            "file name must not use a reserved prefix",
        ));
    }
    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED_WINDOWS_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
    {
        return Err(Error::invalid_argument(format!(
            "file name '{name}' collides with a reserved Windows device name"
        )));
    }
    Ok(())
}
