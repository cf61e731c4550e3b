use serde::{Deserialize, Serialize};

use weft_shim::ChaincodeError;

/// Which way a registered client faces a topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// The client publishes to the topic.
    Pub,
    /// The client subscribes to the topic.
    Sub,
}

impl ClientKind {
    /// Parse the wire spelling, case-sensitively. Anything but the exact
    /// strings `"pub"` and `"sub"` is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "pub" => Some(Self::Pub),
            "sub" => Some(Self::Sub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pub => write!(f, "pub"),
            Self::Sub => write!(f, "sub"),
        }
    }
}

/// One ledger record of the topic registry.
///
/// Stored as a single JSON text value `{"type": "pub"|"sub", "topic": ...}`
/// under a caller-chosen key. Decoding is strict: a text with missing,
/// extra, or mis-cased fields fails rather than being silently accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicRecord {
    /// Publisher or subscriber, spelled `type` on the wire.
    #[serde(rename = "type")]
    pub kind: ClientKind,
    /// The topic the client is registered against.
    pub topic: String,
}

impl TopicRecord {
    pub fn new(kind: ClientKind, topic: impl Into<String>) -> Self {
        Self {
            kind,
            topic: topic.into(),
        }
    }

    /// Encode to the JSON text stored as the ledger value. Field order
    /// follows declaration order and is reproducible.
    pub fn to_json(&self) -> Result<String, ChaincodeError> {
        serde_json::to_string(self).map_err(|e| ChaincodeError::Internal(e.to_string()))
    }

    /// Decode a stored ledger value.
    pub fn from_json(text: &str) -> Result<Self, ChaincodeError> {
        serde_json::from_str(text).map_err(|e| ChaincodeError::Decode(e.to_string()))
    }
}
