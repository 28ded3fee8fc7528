//! # XRI Identifiers
//!
//! Extensible Resource Identifiers: a global context symbol followed by one
//! or more subsegments, optionally written with an `xri://` prefix.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use super::{Error, Result};

/// Symbols opening an XRI global context.
const GLOBAL_CONTEXT_SYMBOLS: [char; 5] = ['=', '@', '+', '$', '!'];

const XRI_SCHEME: &str = "xri://";

// Strips a leading `xri://`, case-insensitively.
fn strip_scheme(raw: &str) -> &str {
    raw.get(..XRI_SCHEME.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(XRI_SCHEME))
        .map_or(raw, |_| &raw[XRI_SCHEME.len()..])
}

/// True when the raw string should be treated as an XRI rather than a URI.
pub(crate) fn is_xri(raw: &str) -> bool {
    strip_scheme(raw).starts_with(GLOBAL_CONTEXT_SYMBOLS)
}

/// An XRI identifier.
///
/// The canonical form drops the `xri://` prefix. Resolution is performed
/// through a proxy resolver and is not representable as a plain URI, which
/// is why [`super::Identifier`] keeps XRIs as a separate variant rather
/// than coercing them.
#[derive(Clone, Debug, Eq)]
pub struct XriIdentifier {
    original: String,
    canonical: String,
    secure_end_to_end: bool,
}

impl XriIdentifier {
    /// Parses a raw XRI string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` when the input does not open with a
    /// global context symbol or has no subsegments.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let canonical = strip_scheme(raw);

        if !canonical.starts_with(GLOBAL_CONTEXT_SYMBOLS) {
            return Err(Error::InvalidIdentifier(format!("`{raw}` is not a valid XRI")));
        }
        if canonical.chars().count() < 2 {
            return Err(Error::InvalidIdentifier(format!("`{raw}` has no subsegments")));
        }

        Ok(Self {
            original: raw.to_string(),
            canonical: canonical.to_string(),
            secure_end_to_end: false,
        })
    }

    /// The identifier string as supplied by the caller.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The canonical XRI, without any `xri://` prefix.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// True when every discovery step for this identifier is contractually
    /// required to use HTTPS.
    #[must_use]
    pub const fn is_discovery_secure_end_to_end(&self) -> bool {
        self.secure_end_to_end
    }

    /// Returns an identifier flagged secure end-to-end. XRI resolution goes
    /// through an https proxy resolver, so the requirement can always be
    /// honored.
    #[must_use]
    pub fn require_ssl(&self) -> Self {
        let mut secure = self.clone();
        secure.secure_end_to_end = true;
        secure
    }

    /// Returns an identifier with any fragment removed. An identifier
    /// without a fragment comes back as a plain clone, never a re-parse.
    #[must_use]
    pub fn trim_fragment(&self) -> Self {
        let Some((canonical, _)) = self.canonical.split_once('#') else {
            return self.clone();
        };
        let original =
            self.original.split_once('#').map_or(self.original.as_str(), |(before, _)| before);

        Self {
            original: original.to_string(),
            canonical: canonical.to_string(),
            secure_end_to_end: self.secure_end_to_end,
        }
    }
}

impl Display for XriIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for XriIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Hash for XriIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_optional() {
        let a = XriIdentifier::parse("=john.doe").expect("should parse");
        let b = XriIdentifier::parse("xri://=john.doe").expect("should parse");
        assert_eq!(a, b);
        assert_eq!(b.original(), "xri://=john.doe");
        assert_eq!(b.canonical(), "=john.doe");
    }

    #[test]
    fn context_symbol_required() {
        assert!(XriIdentifier::parse("john.doe").is_err());
        assert!(XriIdentifier::parse("xri://").is_err());
        assert!(XriIdentifier::parse("=").is_err());
    }

    #[test]
    fn require_ssl_always_succeeds() {
        let id = XriIdentifier::parse("@company*unit").expect("should parse");
        let secure = id.require_ssl();
        assert!(secure.is_discovery_secure_end_to_end());
        assert_eq!(secure, id);
    }

    #[test]
    fn trim_fragment() {
        let id = XriIdentifier::parse("=john.doe#frag").expect("should parse");
        let trimmed = id.trim_fragment();
        assert_eq!(trimmed.canonical(), "=john.doe");
        assert_eq!(trimmed.trim_fragment(), trimmed);
    }
}
