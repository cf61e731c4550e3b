use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use weft_shim::ChaincodeError;

/// Role a client registers under, spelled capitalized on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientRole {
    Publisher,
    Subscriber,
}

impl ClientRole {
    /// Parse a role argument, ignoring ASCII case. `None` for anything
    /// that is not a spelling of the two roles.
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("publisher") {
            Some(Self::Publisher)
        } else if text.eq_ignore_ascii_case("subscriber") {
            Some(Self::Subscriber)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ClientRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Publisher => write!(f, "Publisher"),
            Self::Subscriber => write!(f, "Subscriber"),
        }
    }
}

/// One ledger record of the client registry.
///
/// Stored under the client's key, which doubles as `client_id` so that
/// rich-query results, which carry values only, stay self-describing.
/// `time` is the host's transaction timestamp at registration, encoded
/// RFC 3339. Decoding is strict: missing or extra fields fail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub topic: String,
    pub client_id: String,
    pub client_role: ClientRole,
    pub time: DateTime<Utc>,
}

impl Registration {
    pub fn new(
        topic: impl Into<String>,
        client_id: impl Into<String>,
        client_role: ClientRole,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            client_id: client_id.into(),
            client_role,
            time,
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
