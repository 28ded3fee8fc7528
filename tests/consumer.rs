//! Tests for the consumer three-legged exchange.

mod utils;

use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::{TimeDelta, Utc};
use openauth::core::querystring;
use openauth::oauth::provider::{SignatureRejected, TokenError};
use openauth::oauth::state::{Stage, State};
use openauth::oauth::{Error, consumer};
use utils::ProviderImpl;

fn request_token_response() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("oauth_token".to_string(), "req-token".to_string()),
        ("oauth_token_secret".to_string(), "req-secret".to_string()),
        ("oauth_callback_confirmed".to_string(), "true".to_string()),
    ])
}

fn access_token_response() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("oauth_token".to_string(), "access-token".to_string()),
        ("oauth_token_secret".to_string(), "access-secret".to_string()),
    ])
}

#[tokio::test]
async fn three_legged_flow() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    // leg 1: obtain a request token
    provider.enqueue_signed(request_token_response(), None);
    let state = consumer::request_token(
        provider.clone(),
        &consumer_cfg,
        Some("https://consumer.example/cb".into()),
    )
    .await
    .expect("request token obtained");

    let Stage::RequestToken(request_token) = &state.stage else {
        panic!("unexpected stage: {:?}", state.stage);
    };
    assert_eq!(request_token.token, "req-token");
    assert!(request_token.callback_confirmed);

    // the outgoing message was signed and carried the callback
    {
        let sent = provider.sent.lock().expect("lock");
        let (endpoint, fields) = &sent[0];
        assert_eq!(endpoint, "https://provider.example/request_token");
        assert_eq!(fields.get("oauth_consumer_key").map(String::as_str), Some(utils::CONSUMER_KEY));
        assert_eq!(
            fields.get("oauth_callback").map(String::as_str),
            Some("https://consumer.example/cb")
        );
        assert!(fields.contains_key("oauth_signature"));
    }

    // leg 2: redirect the user for authorization
    let (location, state) = consumer::authorization_url(
        &consumer_cfg,
        &state,
        None,
        BTreeMap::from([("lang".to_string(), "en".to_string())]),
    )
    .expect("redirect built");

    let (endpoint, query) = location.split_once('?').expect("location has a query");
    assert_eq!(endpoint, "https://provider.example/authorize");
    let fields = querystring::from_str(query);
    assert_eq!(fields.get("oauth_token").map(String::as_str), Some("req-token"));
    assert_eq!(fields.get("lang").map(String::as_str), Some("en"));
    assert!(matches!(state.stage, Stage::AuthorizationPending(_)));

    // leg 3: exchange for an access token
    provider.enqueue_signed(access_token_response(), Some("req-secret"));
    let state = consumer::access_token(
        provider.clone(),
        &consumer_cfg,
        &state,
        Some("verifier-123".into()),
    )
    .await
    .expect("access token obtained");

    let Stage::Authorized(access_token) = &state.stage else {
        panic!("unexpected stage: {:?}", state.stage);
    };
    assert_eq!(access_token.token, "access-token");
    assert_eq!(
        provider.access_token_secret("access-token").as_deref(),
        Some("access-secret")
    );

    // the exchange request carried the verifier and was signed with the
    // request token secret
    let sent = provider.sent.lock().expect("lock");
    let (endpoint, fields) = &sent[1];
    assert_eq!(endpoint, "https://provider.example/access_token");
    assert_eq!(fields.get("oauth_token").map(String::as_str), Some("req-token"));
    assert_eq!(fields.get("oauth_verifier").map(String::as_str), Some("verifier-123"));
    assert!(fields.contains_key("oauth_signature"));
}

#[tokio::test]
async fn request_token_is_single_use() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    provider.enqueue_signed(request_token_response(), None);
    let state = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect("request token obtained");
    let (_, pending) = consumer::authorization_url(&consumer_cfg, &state, None, BTreeMap::new())
        .expect("redirect built");

    provider.enqueue_signed(access_token_response(), Some("req-secret"));
    consumer::access_token(provider.clone(), &consumer_cfg, &pending, None)
        .await
        .expect("first exchange succeeds");

    // a second exchange of the same request token must fail
    let err = consumer::access_token(provider.clone(), &consumer_cfg, &pending, None)
        .await
        .expect_err("second exchange fails");
    assert!(matches!(err, Error::Token(TokenError::AlreadyConsumed)));

    // the failure is definitive: the persisted state becomes terminal
    let terminal = pending.on_failure(&err).expect("terminal state");
    assert!(matches!(terminal.stage, Stage::Rejected));
}

#[tokio::test]
async fn unverifiable_response_is_rejected() {
    let provider = ProviderImpl::rejecting();
    let consumer_cfg = utils::consumer();

    provider.enqueue_signed(request_token_response(), None);
    let err = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect_err("transition aborts");
    assert!(matches!(err, Error::SignatureInvalid(_)));
}

#[tokio::test]
async fn unsigned_response_is_rejected() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    // a response carrying no oauth_signature at all
    provider.enqueue_response(request_token_response());
    let err = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect_err("transition aborts");
    assert!(matches!(err, Error::SignatureInvalid(_)));
}

#[tokio::test]
async fn mis_signed_access_response_is_rejected() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    provider.enqueue_signed(request_token_response(), None);
    let state = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect("request token obtained");
    let (_, pending) = consumer::authorization_url(&consumer_cfg, &state, None, BTreeMap::new())
        .expect("redirect built");

    // signed with the wrong token secret
    provider.enqueue_signed(access_token_response(), Some("not-the-request-secret"));
    let err = consumer::access_token(provider.clone(), &consumer_cfg, &pending, None)
        .await
        .expect_err("exchange aborts");
    assert!(matches!(err, Error::SignatureInvalid(_)));
}

#[tokio::test]
async fn signature_rejection_is_fatal() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    provider.enqueue_error(anyhow::Error::new(SignatureRejected("bad signature".into())));
    let err = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect_err("transition aborts");
    assert!(matches!(err, Error::SignatureInvalid(_)));
}

#[tokio::test]
async fn transport_errors_surface_verbatim() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    provider.enqueue_error(anyhow!("connection refused"));
    let err = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect_err("transition aborts");
    let Error::Transport(detail) = err else { panic!("unexpected error: {err}") };
    assert_eq!(detail, "connection refused");
}

#[tokio::test]
async fn wrong_stage_is_rejected() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    let state = State::new(Stage::Unauthorized);
    let err = consumer::access_token(provider.clone(), &consumer_cfg, &state, None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::InvalidState(_)));

    let err = consumer::authorization_url(&consumer_cfg, &state, None, BTreeMap::new())
        .expect_err("should fail");
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn expired_state_is_rejected() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    provider.enqueue_signed(request_token_response(), None);
    let state = consumer::request_token(provider.clone(), &consumer_cfg, None)
        .await
        .expect("request token obtained");
    let (_, mut pending) =
        consumer::authorization_url(&consumer_cfg, &state, None, BTreeMap::new())
            .expect("redirect built");

    pending.expires_at = Utc::now() - TimeDelta::try_minutes(1).unwrap_or_default();

    let err = consumer::access_token(provider.clone(), &consumer_cfg, &pending, None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::Expired));

    // the failure is definitive: the persisted state becomes terminal
    let terminal = pending.on_failure(&err).expect("terminal state");
    assert!(matches!(terminal.stage, Stage::Expired));
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let provider = ProviderImpl::new();
    let consumer_cfg = utils::consumer();

    // pending state for a token the store never saw
    let state = State::new(Stage::AuthorizationPending(
        openauth::oauth::state::RequestToken { token: "ghost".into(), callback_confirmed: false },
    ));

    let err = consumer::access_token(provider.clone(), &consumer_cfg, &state, None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::Token(TokenError::NotFound)));
}
