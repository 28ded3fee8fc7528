//! # Consumer Transitions
//!
//! The three legs of the exchange: obtain a request token, redirect the
//! user for authorization, and exchange the authorized request token for
//! an access token.
//!
//! Each transition takes the persisted [`State`] (where one exists) and
//! returns the follow-on state; failures are typed and leave no state
//! behind, so retrying is always the caller's decision.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::instrument;

use crate::core::generate;
use crate::identifier::CanonicalUri;
use crate::message;
use crate::oauth::provider::{Channel, Provider, Signature, SignatureRejected, TokenStore};
use crate::oauth::state::{AccessToken, RequestToken, Stage, State};
use crate::oauth::types::{
    AccessTokenRequest, AccessTokenResponse, Consumer, RequestTokenRequest,
    UnauthorizedTokenResponse, UserAuthorizationRequest,
};
use crate::oauth::{Error, Result};

const SIGNATURE_PART: &str = "oauth_signature";
const CALLBACK_CONFIRMED: &str = "true";

/// Obtains an unauthorized request token from the service provider.
///
/// On success the token/secret pair is stored via the provider's token
/// store and the returned state holds the request token, ready for
/// [`authorization_url`].
///
/// # Errors
///
/// Returns `Transport` when the channel fails (the transition is aborted
/// and may be re-attempted by the caller), `SignatureInvalid` when the
/// channel rejects the request signature or the response signature fails
/// verification, `Message` when the response violates its shape, and
/// `Provider` when the token store fails.
#[instrument(level = "debug", skip(provider, consumer))]
pub async fn request_token(
    provider: impl Provider, consumer: &Consumer, callback: Option<String>,
) -> Result<State> {
    tracing::debug!("consumer::request_token");

    let request = RequestTokenRequest {
        oauth_consumer_key: consumer.consumer_key.clone(),
        oauth_signature_method: consumer.service.signature_method.clone(),
        oauth_signature: None,
        oauth_timestamp: Utc::now().timestamp().to_string(),
        oauth_nonce: generate::nonce(),
        oauth_version: Some(consumer.service.version.to_string()),
        oauth_callback: callback,
    };

    let fields = sign(&provider, &request, &consumer.consumer_secret, None)?;
    let response = send(&provider, &consumer.service.request_token_endpoint, fields).await?;
    verify_response(&provider, &response, &consumer.consumer_secret, None)?;
    let response: UnauthorizedTokenResponse = message::deserialize(&response)?;

    TokenStore::store_request_token(&provider, &response.oauth_token, &response.oauth_token_secret)
        .await
        .map_err(|e| Error::Provider(format!("issue storing request token: {e}")))?;

    Ok(State::new(Stage::RequestToken(RequestToken {
        token: response.oauth_token,
        callback_confirmed: response.oauth_callback_confirmed.as_deref()
            == Some(CALLBACK_CONFIRMED),
    })))
}

/// Builds the redirect that sends the user to the service provider to
/// authorize the pending request token.
///
/// Returns the redirect location (the authorization endpoint with the
/// request token and any consumer-supplied extra parameters appended) and
/// the follow-on state. Control then leaves the process with the user
/// agent; no message is sent directly.
///
/// # Errors
///
/// Returns `InvalidState` unless the state holds an unauthorized request
/// token, and `Expired` when the state has lapsed.
#[instrument(level = "debug", skip(consumer, state))]
pub fn authorization_url(
    consumer: &Consumer, state: &State, callback: Option<String>,
    extra: BTreeMap<String, String>,
) -> Result<(String, State)> {
    tracing::debug!("consumer::authorization_url");

    if state.is_expired() {
        return Err(Error::Expired);
    }
    let Stage::RequestToken(request_token) = &state.stage else {
        return Err(Error::InvalidState("no request token to authorize".into()));
    };

    let request = UserAuthorizationRequest {
        recipient: consumer.service.user_authorization_endpoint.clone(),
        oauth_token: request_token.token.clone(),
        oauth_callback: callback,
        extra,
    };
    let location = message::redirect_location(&request)?;

    Ok((location, State::new(Stage::AuthorizationPending(request_token.clone()))))
}

/// Exchanges the user-authorized request token for an access token.
///
/// The request token is single-use: the token store enforces at-most-once
/// exchange, so a second attempt with the same token fails with
/// [`crate::oauth::provider::TokenError::AlreadyConsumed`].
///
/// # Errors
///
/// Returns `InvalidState`/`Expired` on a stage or lifetime violation,
/// `Token` when the store does not hold a live secret for the token or the
/// token was already redeemed, `Transport` on channel failure,
/// `SignatureInvalid` when either the request or the response signature is
/// rejected, and `Message` when the response violates its shape.
#[instrument(level = "debug", skip(provider, consumer, state))]
pub async fn access_token(
    provider: impl Provider, consumer: &Consumer, state: &State, verifier: Option<String>,
) -> Result<State> {
    tracing::debug!("consumer::access_token");

    let ctx = Context { consumer, state };
    let request_token = ctx.verify()?;
    ctx.process(provider, request_token, verifier).await
}

struct Context<'a> {
    consumer: &'a Consumer,
    state: &'a State,
}

impl Context<'_> {
    // The exchange is only valid while user authorization is pending.
    fn verify(&self) -> Result<&RequestToken> {
        if self.state.is_expired() {
            return Err(Error::Expired);
        }
        let Stage::AuthorizationPending(request_token) = &self.state.stage else {
            return Err(Error::InvalidState("no authorization is pending".into()));
        };
        Ok(request_token)
    }

    async fn process(
        &self, provider: impl Provider, request_token: &RequestToken, verifier: Option<String>,
    ) -> Result<State> {
        let secret = TokenStore::request_token_secret(&provider, &request_token.token).await?;

        let request = AccessTokenRequest {
            oauth_consumer_key: self.consumer.consumer_key.clone(),
            oauth_token: request_token.token.clone(),
            oauth_signature_method: self.consumer.service.signature_method.clone(),
            oauth_signature: None,
            oauth_timestamp: Utc::now().timestamp().to_string(),
            oauth_nonce: generate::nonce(),
            oauth_verifier: verifier,
            oauth_version: Some(self.consumer.service.version.to_string()),
        };

        let fields = sign(&provider, &request, &self.consumer.consumer_secret, Some(&secret))?;
        let response =
            send(&provider, &self.consumer.service.access_token_endpoint, fields).await?;
        verify_response(&provider, &response, &self.consumer.consumer_secret, Some(&secret))?;
        let response: AccessTokenResponse = message::deserialize(&response)?;

        // consume the request token and record the access pair as one store
        // operation; the request token is invalid from here on
        TokenStore::redeem_request_token(
            &provider,
            &request_token.token,
            &response.oauth_token,
            &response.oauth_token_secret,
        )
        .await?;

        Ok(State::new(Stage::Authorized(AccessToken { token: response.oauth_token })))
    }
}

// Serializes an outgoing direct message and appends its signature.
fn sign<M: message::Message>(
    signer: &impl Signature, request: &M, consumer_secret: &str, token_secret: Option<&str>,
) -> Result<BTreeMap<String, String>> {
    let mut fields = message::serialize(request)?;
    let signature = signer.sign(&fields, consumer_secret, token_secret);
    fields.insert(SIGNATURE_PART.to_string(), signature);
    Ok(fields)
}

// Checks the signature carried on an incoming direct response before it is
// interpreted. An absent or unverifiable signature is fatal to the
// transition.
fn verify_response(
    verifier: &impl Signature, fields: &BTreeMap<String, String>, consumer_secret: &str,
    token_secret: Option<&str>,
) -> Result<()> {
    let mut unsigned = fields.clone();
    let signature = unsigned.remove(SIGNATURE_PART).unwrap_or_default();
    if !verifier.verify(&unsigned, &signature, consumer_secret, token_secret) {
        return Err(Error::SignatureInvalid("response signature rejected".into()));
    }
    Ok(())
}

// Sends serialized parts over the channel, mapping failures into the
// transition-fatal error taxonomy.
async fn send(
    channel: &impl Channel, endpoint: &CanonicalUri, fields: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    match channel.send(endpoint, fields).await {
        Ok(response) => Ok(response),
        Err(e) => match e.downcast::<SignatureRejected>() {
            Ok(rejected) => Err(Error::SignatureInvalid(rejected.to_string())),
            Err(e) => Err(Error::Transport(e.to_string())),
        },
    }
}
