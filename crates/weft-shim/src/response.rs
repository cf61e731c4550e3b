use crate::error::ChaincodeError;

/// Outcome of one chaincode invocation, as reported back to the host.
///
/// Exactly three categories exist, and the mapping from handler errors onto
/// them is the contract's one piece of real protocol logic: requester-caused
/// failures are bad requests, everything else is an internal error. The
/// host's transport attaches the conventional status codes (200/400/500) to
/// the categories; [`status`](Response::status) exposes them for embedders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// The invocation succeeded. `payload` may be empty.
    Success { payload: Vec<u8> },
    /// The request was malformed; the message names the offending detail.
    BadRequest { message: String },
    /// The invocation failed for reasons the requester did not cause.
    InternalError { detail: String },
}

impl Response {
    /// Success with an empty payload.
    pub fn success() -> Self {
        Self::Success {
            payload: Vec::new(),
        }
    }

    /// Success carrying payload bytes.
    pub fn success_with_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self::Success {
            payload: payload.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::InternalError {
            detail: detail.into(),
        }
    }

    /// Status code the host protocol attaches to this category.
    pub fn status(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::BadRequest { .. } => 400,
            Self::InternalError { .. } => 500,
        }
    }

    /// Returns `true` for successful invocations.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Payload bytes of a successful invocation, `None` otherwise.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Diagnostic text of a failed invocation, `None` on success.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::BadRequest { message } => Some(message),
            Self::InternalError { detail } => Some(detail),
        }
    }
}

impl From<ChaincodeError> for Response {
    /// The two-tier error mapping. Client faults keep their full message so
    /// the requester can correct the call; server faults keep their full
    /// diagnostic detail so nothing is silently swallowed.
    fn from(err: ChaincodeError) -> Self {
        if err.is_client_fault() {
            Self::BadRequest {
                message: err.to_string(),
            }
        } else {
            Self::InternalError {
                detail: err.to_string(),
            }
        }
    }
}

impl From<Result<Vec<u8>, ChaincodeError>> for Response {
    /// What dispatchers call on a handler result.
    fn from(result: Result<Vec<u8>, ChaincodeError>) -> Self {
        match result {
            Ok(payload) => Self::Success { payload },
            Err(err) => err.into(),
        }
    }
}
