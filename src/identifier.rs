//! # Identifiers
//!
//! A user-supplied string identifying a person online: either a URI or an
//! XRI. Identifiers are canonicalized on construction and immutable
//! thereafter; derived forms (fragment-trimmed, secure-upgraded) are new
//! values, never in-place mutations.

mod uri;
mod xri;

use std::fmt::{self, Display};

use thiserror::Error;

pub use self::uri::{CanonicalUri, Scheme, UriIdentifier, is_allowed_scheme};
pub use self::xri::XriIdentifier;

/// Identifier errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input cannot be canonicalized into an absolute http(s) URI or a
    /// valid XRI. Non-recoverable locally.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// An explicitly supplied scheme is incompatible with a mandated
    /// security requirement. Reported as a distinct condition from a parse
    /// failure so callers can message users differently.
    #[error("scheme conflict: {0}")]
    SchemeConflict(String),
}

/// Identifier result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Canonicalizer configuration, constructed once at process start and passed
/// into parsing rather than read from ambient global state.
///
/// Generic URI-normalization routines on some platforms silently compress
/// dot segments and strip trailing periods from path segments, corrupting
/// identifiers that legitimately end a path segment with `.`. The
/// canonicalizer here preserves such paths verbatim when the workaround is
/// installed. The degraded mode retains the defective normalization so the
/// two behaviors can be compared under test.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    path_compression_disabled: bool,
}

impl DiscoveryConfig {
    /// Creates the standard configuration with the period-preserving
    /// workaround installed.
    #[must_use]
    pub const fn init() -> Self {
        Self { path_compression_disabled: true }
    }

    /// Creates a degraded configuration emulating default platform
    /// normalization: dot segments are compressed and trailing periods are
    /// stripped. Canonicalization proceeds best-effort, emitting a
    /// diagnostic whenever a path is altered.
    #[must_use]
    pub const fn degraded() -> Self {
        Self { path_compression_disabled: false }
    }

    /// True when trailing-period path segments are preserved verbatim.
    #[must_use]
    pub const fn preserves_periods(&self) -> bool {
        self.path_compression_disabled
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::init()
    }
}

/// A canonicalized user-supplied identifier.
///
/// The variant set is closed: every consumption site matches exhaustively,
/// so adding a variant is a compile-visible change.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// An identifier in absolute http(s) URI form.
    Uri(UriIdentifier),

    /// An XRI (Extensible Resource Identifier).
    Xri(XriIdentifier),

    /// A URI identifier on which no discovery may be performed. Produced
    /// when an SSL requirement cannot be met without rewriting a scheme the
    /// caller explicitly chose.
    NoDiscovery(UriIdentifier),
}

impl Identifier {
    /// Parses a raw identifier string, canonicalizing it into a URI or XRI
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` when the input cannot be canonicalized.
    /// Construction either fully succeeds or fails atomically.
    pub fn parse(raw: &str, config: &DiscoveryConfig) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidIdentifier("identifier is empty".into()));
        }

        if xri::is_xri(raw) {
            Ok(Self::Xri(XriIdentifier::parse(raw)?))
        } else {
            Ok(Self::Uri(UriIdentifier::parse(raw, false, config)?))
        }
    }

    /// The identifier string as supplied by the caller.
    #[must_use]
    pub fn original(&self) -> &str {
        match self {
            Self::Uri(id) | Self::NoDiscovery(id) => id.original(),
            Self::Xri(id) => id.original(),
        }
    }

    /// True when every discovery step for this identifier is contractually
    /// required to use HTTPS.
    #[must_use]
    pub const fn is_discovery_secure_end_to_end(&self) -> bool {
        match self {
            Self::Uri(id) | Self::NoDiscovery(id) => id.is_discovery_secure_end_to_end(),
            Self::Xri(id) => id.is_discovery_secure_end_to_end(),
        }
    }

    /// True when discovery may be performed for this identifier at all.
    #[must_use]
    pub const fn performs_discovery(&self) -> bool {
        !matches!(self, Self::NoDiscovery(_))
    }

    /// Returns an equivalent identifier with any fragment removed. An
    /// identifier without a fragment comes back as a plain clone, never a
    /// re-parse.
    #[must_use]
    pub fn trim_fragment(&self) -> Self {
        match self {
            Self::Uri(id) => Self::Uri(id.trim_fragment()),
            Self::NoDiscovery(id) => Self::NoDiscovery(id.trim_fragment()),
            Self::Xri(id) => Self::Xri(id.trim_fragment()),
        }
    }

    /// Attempts to derive a variant whose discovery is secure end-to-end.
    ///
    /// Returns the derived identifier and whether the upgrade succeeded.
    /// Idempotent: an already-secure identifier returns an equivalent
    /// result, not an error. An identifier built from an explicit `http://`
    /// scheme is never rewritten; it becomes a [`Identifier::NoDiscovery`]
    /// value instead and the upgrade reports failure.
    #[must_use]
    pub fn try_require_ssl(&self) -> (Self, bool) {
        match self {
            Self::Uri(id) => id.try_require_ssl(),
            // XRI resolution goes through an https proxy resolver
            Self::Xri(id) => (Self::Xri(id.require_ssl()), true),
            // the upgrade was already refused; the identifier stays inert
            Self::NoDiscovery(id) => (Self::NoDiscovery(id.clone()), false),
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(id) | Self::NoDiscovery(id) => Display::fmt(id, f),
            Self::Xri(id) => Display::fmt(id, f),
        }
    }
}
