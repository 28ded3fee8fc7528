//! # OAuth Consumer
//!
//! The consumer side of the OAuth three-legged authorization exchange: the
//! consumer obtains a request token from the service provider, redirects
//! the user to authorize it, then exchanges the authorized request token
//! for a long-lived access token.
//!
//! The library is architected around the three transitions, each with its
//! own request and response message types. Transport, signing, and token
//! persistence are delegated to the [`provider`] traits implemented by the
//! embedding application; the transitions themselves carry no mutable
//! state and are safe for concurrent use provided the [`types::Consumer`]
//! configuration is not mutated after first use.

pub mod consumer;
pub mod provider;
pub mod state;
pub mod types;

use thiserror::Error;

use crate::message;
use crate::oauth::provider::TokenError;

/// OAuth consumer errors. Every failure is a typed outcome; no transition
/// leaves partial state behind.
#[derive(Error, Debug)]
pub enum Error {
    /// The presented state is not at the stage the transition requires.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The authorization state expired before the exchange completed.
    #[error("authorization state has expired")]
    Expired,

    /// The transport channel failed. Reported verbatim; the library does
    /// not retry.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An incoming message failed signature verification. Always fatal to
    /// the current transition, never silently ignored.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// The token store rejected the operation.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A message violated its shape declarations.
    #[error(transparent)]
    Message(#[from] message::Error),

    /// A provider collaborator failed unexpectedly.
    #[error("provider failure: {0}")]
    Provider(String),
}

/// OAuth result type.
pub type Result<T> = std::result::Result<T, Error>;
