//! An identity-federation protocol library implementing the relying-party
//! side of OpenID identifier handling and the consumer side of the OAuth
//! three-legged token exchange.
//!
//! The library lets an application establish who a remote user is, or obtain
//! a delegated access token, without implementing wire-level protocol
//! details itself.
//!
//! # Design
//!
//! **Identifiers**
//!
//! A user-supplied identity string is canonicalized into an immutable
//! [`Identifier`]: an absolute http(s) URI or an XRI. Canonicalization
//! performs only the specified normalization (scheme inference, host
//! lower-casing) and is careful never to corrupt identifiers whose path
//! segments legitimately end in a period. [`Identifier::try_require_ssl`]
//! derives a secure-discovery variant without ever silently rewriting a
//! scheme the caller explicitly chose.
//!
//! **Messages**
//!
//! Protocol messages are serde types bound to a transport (direct between
//! two endpoints, or indirect via the user's agent) and declare per-field
//! presence and emptiness rules that are validated on both serialization and
//! deserialization. See the [`message`] module.
//!
//! **OAuth consumer**
//!
//! The [`oauth::consumer`] handlers drive the three-legged exchange: obtain
//! a request token, redirect the user for authorization, and exchange the
//! authorized request token for an access token. Transport, signing, and
//! token persistence are delegated to the [`oauth::provider`] traits
//! implemented by the embedding application; the handlers themselves are
//! stateless value-transformers and safe for concurrent use.

pub mod core;
pub mod identifier;
pub mod message;
pub mod oauth;

pub use crate::identifier::{DiscoveryConfig, Identifier, UriIdentifier, XriIdentifier};
