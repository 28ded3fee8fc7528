//! # URI Identifiers
//!
//! Canonicalization of http(s) identifiers and the secure-discovery
//! upgrade.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use super::{DiscoveryConfig, Error, Identifier, Result};

const SCHEME_HTTP: &str = "http";
const SCHEME_HTTPS: &str = "https";
const DEFAULT_PORT_HTTP: u16 = 80;
const DEFAULT_PORT_HTTPS: u16 = 443;

/// Case-insensitive membership test against the allowed identifier schemes
/// (http and https).
///
/// Accepts either a bare scheme name (`https`) or a full identifier string
/// (`https://example.com`). Returns false on empty input.
#[must_use]
pub fn is_allowed_scheme(candidate: &str) -> bool {
    let scheme = candidate.split("://").next().unwrap_or_default();
    scheme.eq_ignore_ascii_case(SCHEME_HTTP) || scheme.eq_ignore_ascii_case(SCHEME_HTTPS)
}

/// Allowed identifier schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain-text http.
    Http,

    /// TLS-protected https.
    Https,
}

impl Scheme {
    /// The scheme name, lower-cased.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => SCHEME_HTTP,
            Self::Https => SCHEME_HTTPS,
        }
    }

    /// The port implied when the authority carries none.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => DEFAULT_PORT_HTTP,
            Self::Https => DEFAULT_PORT_HTTPS,
        }
    }

    fn parse(scheme: &str) -> Result<Self> {
        if scheme.eq_ignore_ascii_case(SCHEME_HTTP) {
            Ok(Self::Http)
        } else if scheme.eq_ignore_ascii_case(SCHEME_HTTPS) {
            Ok(Self::Https)
        } else {
            Err(Error::InvalidIdentifier(format!("scheme `{scheme}` is not allowed")))
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized absolute form of a URI identifier.
///
/// Only the explicitly specified normalization is performed: the scheme and
/// host are lower-cased and default ports are elided. The path and query
/// keep their case, the path is never compressed, and trailing-period path
/// segments are preserved (see [`DiscoveryConfig`]).
///
/// Equality and hashing cover scheme, host, port, path, and query; the
/// fragment is excluded.
#[derive(Clone, Debug, Eq)]
pub struct CanonicalUri {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl CanonicalUri {
    /// Parses an absolute http(s) URI.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` when the input is not syntactically
    /// absolute or its scheme is not http(s).
    pub fn parse(uri: &str, config: &DiscoveryConfig) -> Result<Self> {
        let Some((scheme, rest)) = uri.split_once("://") else {
            return Err(Error::InvalidIdentifier(format!("`{uri}` is not an absolute URI")));
        };
        let scheme = Scheme::parse(scheme)?;

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(authority_end);
        let (host, port) = split_authority(authority)?;

        let host = host.to_ascii_lowercase();
        let port = port.filter(|&p| p != scheme.default_port());

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (rest, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        let path = if path.is_empty() { "/".to_string() } else { path.to_string() };
        let path = if config.preserves_periods() { path } else { compress_path(&path) };

        Ok(Self { scheme, host, port, path, query, fragment })
    }

    /// The URI scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The lower-cased host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit, non-default port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// The path, case and trailing periods intact.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The fragment, without the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    // Rewrites the scheme to https. An explicit port 80 follows the scheme
    // to 443; any other explicit port is left untouched.
    pub(crate) fn with_scheme_https(mut self) -> Self {
        self.scheme = Scheme::Https;
        self.port = match self.port {
            Some(DEFAULT_PORT_HTTP | DEFAULT_PORT_HTTPS) => None,
            other => other,
        };
        self
    }

    pub(crate) fn without_fragment(mut self) -> Self {
        self.fragment = None;
        self
    }
}

impl Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl PartialEq for CanonicalUri {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.port == other.port
            && self.path == other.path
            && self.query == other.query
    }
}

impl Hash for CanonicalUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.host.hash(state);
        self.port.hash(state);
        self.path.hash(state);
        self.query.hash(state);
    }
}

// Splits an authority into host and explicit port, allowing a bracketed
// IPv6 literal.
fn split_authority(authority: &str) -> Result<(&str, Option<u16>)> {
    if authority.is_empty() {
        return Err(Error::InvalidIdentifier("missing host".into()));
    }
    if authority.contains(['@', ' ']) {
        return Err(Error::InvalidIdentifier(format!("invalid authority `{authority}`")));
    }

    let (host, port) = if let Some(end) = authority.find(']') {
        let (host, rest) = authority.split_at(end + 1);
        (host, rest.strip_prefix(':'))
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(Error::InvalidIdentifier("missing host".into()));
    }
    let port = match port {
        Some(port) => Some(
            port.parse::<u16>()
                .map_err(|_| Error::InvalidIdentifier(format!("invalid port `{port}`")))?,
        ),
        None => None,
    };

    Ok((host, port))
}

// Emulates the defective default normalization used when the
// period-preserving workaround is not installed: dot segments are resolved
// and trailing periods are stripped from each remaining segment.
fn compress_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment.trim_end_matches('.')),
        }
    }

    let mut compressed = segments.join("/");
    if !compressed.starts_with('/') {
        compressed.insert(0, '/');
    }
    if compressed != path {
        tracing::warn!("path compression altered `{path}` to `{compressed}`");
    }
    compressed
}

/// An identifier in absolute http(s) URI form.
///
/// Equality and hashing compare canonical URIs, not original strings: two
/// differently-spelled inputs that canonicalize identically are equal.
#[derive(Clone, Debug, Eq)]
pub struct UriIdentifier {
    original: String,
    canonical: CanonicalUri,
    scheme_prepended: bool,
    secure_end_to_end: bool,
}

impl UriIdentifier {
    /// Canonicalizes a raw string into a URI identifier.
    ///
    /// When the input does not start with an allowed scheme, one is
    /// inferred: `https://` when `force_https_default_scheme` is set,
    /// `http://` otherwise. The inference is recorded so the secure
    /// upgrade can distinguish an inferred `http` from one the caller
    /// asserted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` when the input cannot be canonicalized
    /// into an absolute http(s) URI, and `SchemeConflict` when an explicit
    /// non-https scheme meets `force_https_default_scheme`.
    pub fn parse(
        raw: &str, force_https_default_scheme: bool, config: &DiscoveryConfig,
    ) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidIdentifier("identifier is empty".into()));
        }

        let explicit_scheme = raw.split_once("://").map(|(scheme, _)| scheme);
        let scheme_prepended = !explicit_scheme.is_some_and(is_allowed_scheme);

        let candidate = if scheme_prepended {
            let default_scheme =
                if force_https_default_scheme { SCHEME_HTTPS } else { SCHEME_HTTP };
            format!("{default_scheme}://{raw}")
        } else {
            raw.to_string()
        };

        let canonical = CanonicalUri::parse(&candidate, config)?;
        if force_https_default_scheme && canonical.scheme() != Scheme::Https {
            // an explicitly chosen scheme is never rewritten
            return Err(Error::SchemeConflict(format!("`{raw}` is not an https identifier")));
        }

        Ok(Self {
            original: raw.to_string(),
            canonical,
            scheme_prepended,
            secure_end_to_end: false,
        })
    }

    /// The canonical absolute URI.
    #[must_use]
    pub const fn canonical_uri(&self) -> &CanonicalUri {
        &self.canonical
    }

    /// The identifier string as supplied by the caller.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// True when no scheme was present in the input and one was inferred.
    #[must_use]
    pub const fn scheme_prepended(&self) -> bool {
        self.scheme_prepended
    }

    /// True when every discovery step for this identifier is contractually
    /// required to use HTTPS.
    #[must_use]
    pub const fn is_discovery_secure_end_to_end(&self) -> bool {
        self.secure_end_to_end
    }

    /// Returns an identifier with any fragment removed. An identifier
    /// without a fragment comes back as a plain clone, never a re-parse;
    /// the borrowing receiver means an owned copy rather than the same
    /// instance.
    #[must_use]
    pub fn trim_fragment(&self) -> Self {
        if self.canonical.fragment().is_none() {
            return self.clone();
        }

        let original =
            self.original.split_once('#').map_or(self.original.as_str(), |(before, _)| before);

        Self {
            original: original.to_string(),
            canonical: self.canonical.clone().without_fragment(),
            scheme_prepended: self.scheme_prepended,
            secure_end_to_end: self.secure_end_to_end,
        }
    }

    /// Attempts to derive an identifier whose discovery is secure
    /// end-to-end, refusing silent downgrade.
    ///
    /// Checked in order:
    ///
    /// 1. Already secure: returned unchanged.
    /// 2. The canonical scheme is https: flagged secure.
    /// 3. The scheme was inferred: rewritten to https and flagged secure;
    ///    the caller never asserted http, so upgrading breaks no contract.
    /// 4. The caller explicitly chose `http://`: the upgrade is refused
    ///    and an identifier that performs no discovery at all is returned.
    #[must_use]
    pub fn try_require_ssl(&self) -> (Identifier, bool) {
        if self.secure_end_to_end {
            return (Identifier::Uri(self.clone()), true);
        }

        if self.canonical.scheme() == Scheme::Https {
            let mut secure = self.clone();
            secure.secure_end_to_end = true;
            return (Identifier::Uri(secure), true);
        }

        if self.scheme_prepended {
            let mut secure = self.clone();
            secure.canonical = secure.canonical.with_scheme_https();
            secure.secure_end_to_end = true;
            return (Identifier::Uri(secure), true);
        }

        // rewriting an explicit http identifier would be a security-relevant
        // behavior change the caller did not request
        (Identifier::NoDiscovery(self.clone()), false)
    }
}

impl Display for UriIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.canonical, f)
    }
}

impl PartialEq for UriIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Hash for UriIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}
