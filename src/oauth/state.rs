//! # State
//!
//! Consumer-side authorization state persisted by the application between
//! the legs of the exchange. Token secrets are deliberately absent: they
//! stay behind the provider's token store.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::oauth::Error;
use crate::oauth::provider::TokenError;

/// State persisted between transitions of the three-legged exchange.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct State {
    /// Stage of the exchange.
    pub stage: Stage,

    /// Time state should expire.
    pub expires_at: DateTime<Utc>,
}

impl State {
    /// Creates state at the given stage with the stage's standard lifetime.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        let expires_at = Utc::now() + Expire::for_stage(&stage).duration();
        Self { stage, expires_at }
    }

    /// Determines whether state has expired or not.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.signed_duration_since(Utc::now()).num_seconds() < 0
    }

    /// The terminal state to persist when a transition fails definitively.
    ///
    /// A lapsed state maps to [`Stage::Expired`]; a rejected signature or
    /// an already-consumed request token maps to [`Stage::Rejected`].
    /// Transport and provider failures are retryable and map to no terminal
    /// state, leaving the persisted state untouched.
    #[must_use]
    pub fn on_failure(&self, error: &Error) -> Option<Self> {
        match error {
            Error::Expired => {
                Some(Self { stage: Stage::Expired, expires_at: self.expires_at })
            }
            Error::SignatureInvalid(_) | Error::Token(TokenError::AlreadyConsumed) => {
                Some(Self { stage: Stage::Rejected, expires_at: self.expires_at })
            }
            _ => None,
        }
    }
}

/// Exchange stages.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No tokens have been obtained.
    #[default]
    Unauthorized,

    /// An unauthorized request token has been obtained from the service
    /// provider and awaits user authorization.
    RequestToken(RequestToken),

    /// The user has been redirected to the service provider; the held
    /// request token is pending authorization.
    AuthorizationPending(RequestToken),

    /// The request token has been exchanged for an access token. Terminal
    /// success.
    Authorized(AccessToken),

    /// The service provider rejected the exchange. Terminal.
    Rejected,

    /// The state expired before the exchange completed. Terminal.
    Expired,
}

/// A request token held between legs: opaque, time-bounded, and valid for
/// a single consumer-authorization lifecycle.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestToken {
    /// Opaque token issued by the service provider.
    pub token: String,

    /// Whether the provider confirmed the consumer's callback (1.0a).
    pub callback_confirmed: bool,
}

/// An access token: opaque and long-lived relative to the request token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccessToken {
    /// Opaque token issued by the service provider.
    pub token: String,
}

/// Expire enum.
pub enum Expire {
    /// Lifetime of a request token awaiting authorization.
    RequestToken,

    /// Lifetime of completed-exchange state.
    Authorized,
}

impl Expire {
    /// Duration of the state.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        match self {
            Self::RequestToken => TimeDelta::try_minutes(15).unwrap_or_default(),
            Self::Authorized => TimeDelta::try_days(365).unwrap_or_default(),
        }
    }

    const fn for_stage(stage: &Stage) -> Self {
        match stage {
            Stage::Authorized(_) => Self::Authorized,
            _ => Self::RequestToken,
        }
    }
}
