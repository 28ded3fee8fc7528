//! # Provider
//!
//! Traits the embedding application implements to supply the externals the
//! consumer transitions depend on: transport, token persistence, and
//! message signing.

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;

use crate::identifier::CanonicalUri;

/// Consumer provider trait.
pub trait Provider: Channel + TokenStore + Signature + Clone {}

/// Transport channel used for direct messages.
pub trait Channel: Send + Sync {
    /// Sends the serialized parts of a direct message to a protocol
    /// endpoint and returns the parts of the response. Request/response
    /// semantics are synchronous per call; cancellation and timeouts are
    /// the channel's responsibility, surfaced as an error.
    fn send(
        &self, endpoint: &CanonicalUri, fields: BTreeMap<String, String>,
    ) -> impl Future<Output = anyhow::Result<BTreeMap<String, String>>> + Send;
}

/// Error a channel embeds (via `anyhow`) when an incoming message fails
/// signature verification. The transitions map it to
/// [`crate::oauth::Error::SignatureInvalid`] and abort.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SignatureRejected(pub String);

/// Token store errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// No secret is held for the presented token.
    #[error("token not found")]
    NotFound,

    /// The request token has already been exchanged for an access token.
    #[error("request token already consumed")]
    AlreadyConsumed,
}

/// Persists token/secret pairs between transitions.
///
/// The store is the only shared mutable state in the exchange and must
/// guarantee at-most-once successful exchange per request token.
pub trait TokenStore: Send + Sync {
    /// Stores a newly issued request token and its secret.
    fn store_request_token(
        &self, token: &str, secret: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// The secret for a live (un-consumed) request token.
    fn request_token_secret(
        &self, token: &str,
    ) -> impl Future<Output = Result<String, TokenError>> + Send;

    /// Marks the request token consumed and records the access token and
    /// its secret as a single store operation, so a half-redeemed exchange
    /// is never observable. Fails without side effects when the request
    /// token is unknown or already consumed.
    fn redeem_request_token(
        &self, request_token: &str, access_token: &str, access_secret: &str,
    ) -> impl Future<Output = Result<(), TokenError>> + Send;
}

/// Produces and verifies message signatures. Opaque to the library: the
/// fields and secrets go in, a signature comes out.
pub trait Signature: Send + Sync {
    /// Signs the ordered message fields with the consumer secret and, when
    /// one is held, the token secret.
    fn sign(
        &self, fields: &BTreeMap<String, String>, consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> String;

    /// Verifies a signature over the ordered message fields. The
    /// transitions apply this to every direct response before interpreting
    /// it; a `false` return aborts the transition.
    fn verify(
        &self, fields: &BTreeMap<String, String>, signature: &str, consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> bool;
}
