//! # Types
//!
//! Configuration and message types for the consumer exchange. The message
//! types serialize to and from their wire field names in accordance with
//! the OAuth Core specification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifier::CanonicalUri;
use crate::message::{Message, PartSpec, ProtocolVersion, Transport};

/// Endpoints and parameters describing an OAuth service provider.
#[derive(Clone, Debug)]
pub struct ServiceDescription {
    /// Endpoint used to obtain an unauthorized request token.
    pub request_token_endpoint: CanonicalUri,

    /// Endpoint the user is redirected to for authorization.
    pub user_authorization_endpoint: CanonicalUri,

    /// Endpoint used to exchange an authorized request token for an access
    /// token.
    pub access_token_endpoint: CanonicalUri,

    /// Signature method advertised to the provider, e.g. `HMAC-SHA1`.
    pub signature_method: String,

    /// Protocol version spoken by the provider.
    pub version: ProtocolVersion,
}

/// Consumer (client) configuration.
///
/// Safe for concurrent use by multiple caller threads provided it is not
/// mutated after first use; this is a caller contract, not an internally
/// enforced lock.
#[derive(Clone, Debug)]
pub struct Consumer {
    /// The consumer key issued by the service provider.
    pub consumer_key: String,

    /// The consumer secret, passed to the signature provider.
    pub consumer_secret: String,

    /// The service provider's endpoints.
    pub service: ServiceDescription,
}

/// Direct request for an unauthorized request token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestTokenRequest {
    /// The consumer key.
    pub oauth_consumer_key: String,

    /// Signature method used to sign the request.
    pub oauth_signature_method: String,

    /// Signature over the remaining fields. Appended after signing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_signature: Option<String>,

    /// Seconds since the Unix epoch.
    pub oauth_timestamp: String,

    /// Single-use random string.
    pub oauth_nonce: String,

    /// Advertised protocol version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_version: Option<String>,

    /// Where the provider redirects the user after authorization (1.0a).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_callback: Option<String>,
}

impl Message for RequestTokenRequest {
    const TRANSPORT: Transport = Transport::Direct;
    const PARTS: &'static [PartSpec] = &[
        PartSpec::required("oauth_consumer_key"),
        PartSpec::required("oauth_signature_method"),
        PartSpec::new("oauth_signature", false, false),
        PartSpec::required("oauth_timestamp"),
        PartSpec::required("oauth_nonce"),
        PartSpec::optional("oauth_version"),
        PartSpec::new("oauth_callback", false, false),
    ];
}

/// Direct response carrying an unauthorized request token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UnauthorizedTokenResponse {
    /// The request token.
    pub oauth_token: String,

    /// The request token secret.
    pub oauth_token_secret: String,

    /// `true` when the provider acknowledged the callback (1.0a).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_callback_confirmed: Option<String>,
}

impl Message for UnauthorizedTokenResponse {
    const TRANSPORT: Transport = Transport::Direct;
    const PARTS: &'static [PartSpec] = &[
        PartSpec::required("oauth_token"),
        // a token secret may legitimately be empty
        PartSpec::new("oauth_token_secret", true, true),
        PartSpec::optional("oauth_callback_confirmed"),
    ];
}

/// Indirect message redirecting the user to the service provider to
/// authorize a request token.
#[derive(Clone, Debug, Serialize)]
pub struct UserAuthorizationRequest {
    /// The party the user agent is redirected to.
    #[serde(skip)]
    pub recipient: CanonicalUri,

    /// The request token awaiting authorization.
    pub oauth_token: String,

    /// Where the provider sends the user after authorization (1.0; 1.0a
    /// carries the callback on the request-token leg instead).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_callback: Option<String>,

    /// Consumer-supplied extra parameters, carried through verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Message for UserAuthorizationRequest {
    const TRANSPORT: Transport = Transport::Indirect;
    const PARTS: &'static [PartSpec] = &[
        PartSpec::required("oauth_token"),
        PartSpec::new("oauth_callback", false, false),
    ];

    fn recipient(&self) -> Option<&CanonicalUri> {
        Some(&self.recipient)
    }
}

/// Direct request exchanging an authorized request token for an access
/// token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccessTokenRequest {
    /// The consumer key.
    pub oauth_consumer_key: String,

    /// The authorized request token.
    pub oauth_token: String,

    /// Signature method used to sign the request.
    pub oauth_signature_method: String,

    /// Signature over the remaining fields. Appended after signing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_signature: Option<String>,

    /// Seconds since the Unix epoch.
    pub oauth_timestamp: String,

    /// Single-use random string.
    pub oauth_nonce: String,

    /// Verification code returned with the user (1.0a).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_verifier: Option<String>,

    /// Advertised protocol version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_version: Option<String>,
}

impl Message for AccessTokenRequest {
    const TRANSPORT: Transport = Transport::Direct;
    const PARTS: &'static [PartSpec] = &[
        PartSpec::required("oauth_consumer_key"),
        PartSpec::required("oauth_token"),
        PartSpec::required("oauth_signature_method"),
        PartSpec::new("oauth_signature", false, false),
        PartSpec::required("oauth_timestamp"),
        PartSpec::required("oauth_nonce"),
        PartSpec::new("oauth_verifier", false, false),
        PartSpec::optional("oauth_version"),
    ];
}

/// Direct response carrying an access token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccessTokenResponse {
    /// The access token.
    pub oauth_token: String,

    /// The access token secret.
    pub oauth_token_secret: String,
}

impl Message for AccessTokenResponse {
    const TRANSPORT: Transport = Transport::Direct;
    const PARTS: &'static [PartSpec] = &[
        PartSpec::required("oauth_token"),
        PartSpec::new("oauth_token_secret", true, true),
    ];
}
