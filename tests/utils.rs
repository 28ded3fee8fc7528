#![allow(missing_docs)]
#![allow(dead_code)]

//! In-memory provider for exercising the consumer state machine.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use openauth::identifier::{CanonicalUri, DiscoveryConfig};
use openauth::message::ProtocolVersion;
use openauth::oauth::provider::{Channel, Provider, Signature, TokenError, TokenStore};
use openauth::oauth::types::{Consumer, ServiceDescription};
use sha2::{Digest, Sha256};

pub const CONSUMER_KEY: &str = "dpp-consumer";
pub const CONSUMER_SECRET: &str = "dpp-secret";

pub fn consumer() -> Consumer {
    let config = DiscoveryConfig::init();
    let endpoint = |uri: &str| CanonicalUri::parse(uri, &config).expect("endpoint is valid");

    Consumer {
        consumer_key: CONSUMER_KEY.into(),
        consumer_secret: CONSUMER_SECRET.into(),
        service: ServiceDescription {
            request_token_endpoint: endpoint("https://provider.example/request_token"),
            user_authorization_endpoint: endpoint("https://provider.example/authorize"),
            access_token_endpoint: endpoint("https://provider.example/access_token"),
            signature_method: "HMAC-SHA1".into(),
            version: ProtocolVersion::V10a,
        },
    }
}

/// Scripted channel, in-memory token store, and a digest-based signature.
#[derive(Clone, Default)]
pub struct ProviderImpl {
    // request token -> (secret, consumed)
    request_tokens: Arc<Mutex<HashMap<String, (String, bool)>>>,
    access_tokens: Arc<Mutex<HashMap<String, String>>>,
    responses: Arc<Mutex<Vec<anyhow::Result<BTreeMap<String, String>>>>>,
    reject_signatures: bool,
    pub sent: Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>,
}

impl ProviderImpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose signature verification always fails.
    pub fn rejecting() -> Self {
        Self { reject_signatures: true, ..Self::default() }
    }

    pub fn enqueue_response(&self, fields: BTreeMap<String, String>) {
        self.responses.lock().expect("lock").push(Ok(fields));
    }

    /// Enqueues a response carrying a signature this provider will verify.
    pub fn enqueue_signed(&self, mut fields: BTreeMap<String, String>, token_secret: Option<&str>) {
        let signature = self.sign(&fields, CONSUMER_SECRET, token_secret);
        fields.insert("oauth_signature".to_string(), signature);
        self.enqueue_response(fields);
    }

    pub fn enqueue_error(&self, error: anyhow::Error) {
        self.responses.lock().expect("lock").push(Err(error));
    }

    pub fn access_token_secret(&self, token: &str) -> Option<String> {
        self.access_tokens.lock().expect("lock").get(token).cloned()
    }
}

impl Provider for ProviderImpl {}

impl Channel for ProviderImpl {
    async fn send(
        &self, endpoint: &CanonicalUri, fields: BTreeMap<String, String>,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.sent.lock().expect("lock").push((endpoint.to_string(), fields));

        let mut responses = self.responses.lock().expect("lock");
        if responses.is_empty() {
            return Err(anyhow!("no scripted response"));
        }
        responses.remove(0)
    }
}

impl TokenStore for ProviderImpl {
    async fn store_request_token(&self, token: &str, secret: &str) -> anyhow::Result<()> {
        self.request_tokens
            .lock()
            .expect("lock")
            .insert(token.to_string(), (secret.to_string(), false));
        Ok(())
    }

    async fn request_token_secret(&self, token: &str) -> Result<String, TokenError> {
        match self.request_tokens.lock().expect("lock").get(token) {
            Some((_, true)) => Err(TokenError::AlreadyConsumed),
            Some((secret, false)) => Ok(secret.clone()),
            None => Err(TokenError::NotFound),
        }
    }

    async fn redeem_request_token(
        &self, request_token: &str, access_token: &str, access_secret: &str,
    ) -> Result<(), TokenError> {
        let mut tokens = self.request_tokens.lock().expect("lock");
        let Some((_, consumed)) = tokens.get_mut(request_token) else {
            return Err(TokenError::NotFound);
        };
        if *consumed {
            return Err(TokenError::AlreadyConsumed);
        }
        *consumed = true;
        self.access_tokens
            .lock()
            .expect("lock")
            .insert(access_token.to_string(), access_secret.to_string());
        Ok(())
    }
}

impl Signature for ProviderImpl {
    fn sign(
        &self, fields: &BTreeMap<String, String>, consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> String {
        let mut hasher = Sha256::new();
        for (name, value) in fields {
            hasher.update(name);
            hasher.update(value);
        }
        hasher.update(consumer_secret);
        hasher.update(token_secret.unwrap_or_default());
        format!("{:x}", hasher.finalize())
    }

    fn verify(
        &self, fields: &BTreeMap<String, String>, signature: &str, consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> bool {
        !self.reject_signatures && self.sign(fields, consumer_secret, token_secret) == signature
    }
}
