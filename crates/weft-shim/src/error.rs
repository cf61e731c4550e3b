use thiserror::Error;

/// Failures of the host ledger accessor boundary.
///
/// These are faults of the ledger capability itself (or of a test double
/// standing in for it), never of the request that triggered the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The rich-query selector could not be understood.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// The backing store failed or is unavailable.
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Errors a contract handler can raise.
///
/// The split between client-caused and server-caused variants drives the
/// response category: variants for which
/// [`is_client_fault`](ChaincodeError::is_client_fault) returns true become
/// bad-request responses, everything else becomes an internal error. A
/// malformed request must never surface as an internal error and vice versa.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChaincodeError {
    /// The function name matched no entry in the routing table.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// The argument list had the wrong length for the matched handler.
    #[error("incorrect number of arguments: expecting {expected} as {usage}, got {actual}")]
    WrongArgumentCount {
        usage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An argument failed validation: an enumerated value outside the
    /// recognized set, or a non-numeric value where a number was required.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored ledger text could not be decoded into the record shape.
    #[error("malformed stored record: {0}")]
    Decode(String),

    /// A point read found no state under the key.
    #[error("no state found for key {0:?}")]
    KeyNotFound(String),

    /// The host ledger accessor failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Anything else: encode failures, poisoned test locks, bugs.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChaincodeError {
    /// Returns `true` when the requester caused the failure, i.e. the
    /// outcome must be reported as a bad request rather than an internal
    /// error.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::UnknownFunction(_) | Self::WrongArgumentCount { .. } | Self::InvalidArgument(_)
        )
    }
}

/// What a contract handler produces: success payload bytes, or an error the
/// dispatcher maps to a response category.
pub type HandlerResult = Result<Vec<u8>, ChaincodeError>;

/// Argument-count guard used by every handler before touching the ledger.
///
/// `usage` is the human-readable call shape echoed back to the requester,
/// e.g. `"init(key, type, topic)"`.
pub fn require_args(
    args: &[String],
    expected: usize,
    usage: &'static str,
) -> Result<(), ChaincodeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ChaincodeError::WrongArgumentCount {
            usage,
            expected,
            actual: args.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_are_exactly_the_request_shaped_variants() {
        assert!(ChaincodeError::UnknownFunction("x".into()).is_client_fault());
        assert!(ChaincodeError::WrongArgumentCount {
            usage: "delete(key)",
            expected: 1,
            actual: 3,
        }
        .is_client_fault());
        assert!(ChaincodeError::InvalidArgument("bad type".into()).is_client_fault());

        assert!(!ChaincodeError::Decode("eof".into()).is_client_fault());
        assert!(!ChaincodeError::KeyNotFound("k1".into()).is_client_fault());
        assert!(!ChaincodeError::Ledger(LedgerError::Backend("down".into())).is_client_fault());
        assert!(!ChaincodeError::Internal("bug".into()).is_client_fault());
    }

    #[test]
    fn unknown_function_message_carries_the_literal_name() {
        let err = ChaincodeError::UnknownFunction("transfer".into());
        assert!(err.to_string().contains("transfer"));
    }

    #[test]
    fn wrong_argument_count_message_echoes_usage_and_counts() {
        let err = ChaincodeError::WrongArgumentCount {
            usage: "init(key, type, topic)",
            expected: 3,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("init(key, type, topic)"));
        assert!(msg.contains('3'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn ledger_errors_convert_and_stay_server_faults() {
        let err: ChaincodeError = LedgerError::InvalidSelector("not json".into()).into();
        assert!(matches!(err, ChaincodeError::Ledger(_)));
        assert!(!err.is_client_fault());
    }

    #[test]
    fn require_args_accepts_exact_count() {
        let args = vec!["k1".to_string()];
        assert!(require_args(&args, 1, "delete(key)").is_ok());
    }

    #[test]
    fn require_args_rejects_wrong_count() {
        let args = vec!["k1".to_string(), "extra".to_string()];
        let err = require_args(&args, 1, "query(key)").unwrap_err();
        assert_eq!(
            err,
            ChaincodeError::WrongArgumentCount {
                usage: "query(key)",
                expected: 1,
                actual: 2,
            }
        );
    }
}
