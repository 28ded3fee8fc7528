//! # Query Strings
//!
//! Encode and decode the query-string form of protocol message fields, as
//! used by indirect (redirect) messages.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

const UNRESERVED: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-').remove(b'~');

/// Encodes a field map as a percent-encoded query string.
#[must_use]
pub fn to_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, UNRESERVED),
                utf8_percent_encode(value, UNRESERVED)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Decodes a query string into a field map. A pair without a `=` is treated
/// as a field with an empty value.
#[must_use]
pub fn from_str(query: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        fields.insert(
            percent_decode_str(name).decode_utf8_lossy().into_owned(),
            percent_decode_str(value).decode_utf8_lossy().into_owned(),
        );
    }
    fields
}
