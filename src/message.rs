//! # Protocol Messages
//!
//! A typed envelope describing a directed protocol message: its
//! required/optional named fields, its transport binding, and, for
//! indirect messages, the recipient the message is redirected to.
//!
//! A *direct* message is exchanged synchronously between two protocol
//! endpoints. An *indirect* message is routed through a third party's user
//! agent (typically the user's browser) and must carry the URI of the party
//! it is redirected to.
//!
//! Messages are ordinary serde types; [`serialize`] and [`deserialize`]
//! convert between a message and its named wire fields, validating the
//! message's part declarations in both directions so a shape violation is
//! always fatal and never silently defaulted.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::querystring;
use crate::identifier::CanonicalUri;

/// Message errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A required field is missing.
    #[error("required field `{0}` is missing")]
    MissingRequiredField(String),

    /// A field that must not be empty is present but empty.
    #[error("field `{0}` is unexpectedly empty")]
    UnexpectedEmptyField(String),

    /// An indirect message has no recipient to redirect to.
    #[error("indirect message has no recipient")]
    MissingRecipient,

    /// The message does not map to a flat set of named fields.
    #[error("issue serializing message: {0}")]
    Serialization(String),
}

/// Message result type.
pub type Result<T> = std::result::Result<T, Error>;

/// How a message travels between the two protocol endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// Exchanged synchronously between the two endpoints.
    Direct,

    /// Redirected through a third party's user agent.
    Indirect,
}

/// Protocol versions a message may be bound to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// OAuth Core 1.0.
    #[default]
    V10,

    /// OAuth Core 1.0 Revision A.
    V10a,
}

impl ProtocolVersion {
    /// The wire form of the version. Revision A does not change the
    /// advertised version number.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V10 | Self::V10a => "1.0",
        }
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares how a named message field is validated. Required and
/// allow-empty are independent: all four combinations are meaningful and
/// all four are enforced on both serialization and deserialization.
#[derive(Clone, Copy, Debug)]
pub struct PartSpec {
    /// Wire name of the field.
    pub name: &'static str,

    /// The field must be present.
    pub required: bool,

    /// An empty value is acceptable when the field is present.
    pub allow_empty: bool,
}

impl PartSpec {
    /// A part with explicit presence and emptiness rules.
    #[must_use]
    pub const fn new(name: &'static str, required: bool, allow_empty: bool) -> Self {
        Self { name, required, allow_empty }
    }

    /// A required part that must not be empty.
    #[must_use]
    pub const fn required(name: &'static str) -> Self {
        Self::new(name, true, false)
    }

    /// An optional part that may be empty.
    #[must_use]
    pub const fn optional(name: &'static str) -> Self {
        Self::new(name, false, true)
    }
}

/// A directed protocol message.
pub trait Message: Serialize + Clone + Debug + Send + Sync {
    /// Transport binding for the message type.
    const TRANSPORT: Transport;

    /// Field declarations validated on both serialization and
    /// deserialization.
    const PARTS: &'static [PartSpec];

    /// Protocol version the message speaks.
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V10
    }

    /// The party an indirect message is redirected to. Must be present when
    /// the transport is [`Transport::Indirect`].
    fn recipient(&self) -> Option<&CanonicalUri> {
        None
    }
}

/// Serializes a message into its named wire fields.
///
/// # Errors
///
/// Fails with `MissingRequiredField`/`UnexpectedEmptyField` when the
/// message violates its part declarations, and `MissingRecipient` when an
/// indirect message carries no recipient.
pub fn serialize<M: Message>(message: &M) -> Result<BTreeMap<String, String>> {
    if M::TRANSPORT == Transport::Indirect && message.recipient().is_none() {
        return Err(Error::MissingRecipient);
    }

    let value = serde_json::to_value(message).map_err(|e| Error::Serialization(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(Error::Serialization("message is not a set of named fields".into()));
    };

    let mut fields = BTreeMap::new();
    for (name, value) in object {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(Error::Serialization(format!("field `{name}` is not a scalar")));
            }
        };
        fields.insert(name, value);
    }

    validate(&fields, M::PARTS)?;
    Ok(fields)
}

/// Reconstructs a typed message from named wire fields.
///
/// The fields are validated against the message's part declarations before
/// construction, so no partially constructed message can escape.
///
/// # Errors
///
/// Fails with `MissingRequiredField`/`UnexpectedEmptyField` on a shape
/// violation, or `Serialization` when a field cannot be interpreted.
pub fn deserialize<M>(fields: &BTreeMap<String, String>) -> Result<M>
where
    M: Message + DeserializeOwned,
{
    validate(fields, M::PARTS)?;

    let object = fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    serde_json::from_value(Value::Object(object)).map_err(|e| Error::Serialization(e.to_string()))
}

/// The location an indirect message redirects the user agent to: the
/// recipient URI with the serialized fields appended as a query string.
///
/// # Errors
///
/// Fails with `MissingRecipient` for a message without a recipient, or any
/// error from [`serialize`].
pub fn redirect_location<M: Message>(message: &M) -> Result<String> {
    let Some(recipient) = message.recipient() else {
        return Err(Error::MissingRecipient);
    };
    let fields = serialize(message)?;

    let separator = if recipient.query().is_some() { '&' } else { '?' };
    Ok(format!("{recipient}{separator}{}", querystring::to_string(&fields)))
}

fn validate(fields: &BTreeMap<String, String>, parts: &[PartSpec]) -> Result<()> {
    for part in parts {
        match fields.get(part.name) {
            None => {
                if part.required {
                    return Err(Error::MissingRequiredField(part.name.to_string()));
                }
            }
            Some(value) => {
                if value.is_empty() && !part.allow_empty {
                    return Err(Error::UnexpectedEmptyField(part.name.to_string()));
                }
            }
        }
    }
    Ok(())
}
