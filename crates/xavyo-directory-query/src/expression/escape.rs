//! RFC 4515 value escaping and attribute-name validation.

use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

use crate::error::{QueryError, QueryResult};

/// Attribute descriptions: a descriptor or numeric OID, optionally followed by
/// `;option` tags.
static ATTRIBUTE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-.;_]*$").expect("ATTRIBUTE_NAME_RE is a valid regex pattern")
});

/// Escape a filter assertion value.
///
/// `*`, `(`, `)`, `\`, NUL and every byte outside printable ASCII become a
/// backslash followed by two lowercase hex digits.
#[must_use]
pub fn escape_value(value: &[u8]) -> String {
    escape_bytes(value, false)
}

/// Escape a LIKE pattern: identical to [`escape_value`] except that `*` is kept
/// as a substring marker.
#[must_use]
pub fn escape_like_value(value: &[u8]) -> String {
    escape_bytes(value, true)
}

fn escape_bytes(value: &[u8], keep_wildcards: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for &byte in value {
        match byte {
            b'*' if keep_wildcards => out.push('*'),
            b'*' | b'(' | b')' | b'\\' => push_hex(&mut out, byte),
            0x20..=0x7E => out.push(char::from(byte)),
            _ => push_hex(&mut out, byte),
        }
    }
    out
}

fn push_hex(out: &mut String, byte: u8) {
    // Writing to a String cannot fail.
    let _ = write!(out, "\\{byte:02x}");
}

/// Check an attribute name before it is written into a filter.
///
/// Names are never escaped, so anything outside the descriptor alphabet is a
/// syntax error.
pub fn validate_attribute_name(name: &str) -> QueryResult<()> {
    if ATTRIBUTE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::syntax(format!(
            "invalid attribute name '{name}' in filter"
        )))
    }
}
