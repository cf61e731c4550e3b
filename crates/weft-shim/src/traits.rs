use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::response::Response;

/// One historical version of a key, as yielded by the host history index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    /// The stored text at this version; empty for delete markers.
    pub value: String,
    /// Host-assigned commit timestamp of the writing transaction.
    pub timestamp: DateTime<Utc>,
    /// `true` when this version records a deletion.
    pub is_delete: bool,
}

/// One key/value pair yielded by a rich query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Sequence of historical versions of one key, oldest first in write order.
///
/// Forward-only and non-restartable: once consumed it cannot be rewound,
/// and callers must not assume the whole result set fits in memory.
pub type HistoryIter = Box<dyn Iterator<Item = Result<KeyModification, LedgerError>> + Send>;

/// Sequence of rich-query matches, with the same iteration contract as
/// [`HistoryIter`].
pub type QueryIter = Box<dyn Iterator<Item = Result<KeyValue, LedgerError>> + Send>;

/// Host ledger capability interface handed to a contract for the duration
/// of one transaction.
///
/// All implementations must satisfy these invariants:
/// - Durability, consensus, transaction ordering and isolation live behind
///   this boundary; from the contract's perspective every call takes effect
///   atomically or fails.
/// - A point read of a missing key is `Ok(None)`, never an error; callers
///   must not assume presence.
/// - Deleting an absent key succeeds (delete is idempotent).
/// - Historical versions survive overwrite and delete; the history index
///   yields them oldest first in write order, delete markers included.
/// - No call may be retried by the contract; every failure is terminal for
///   the invocation.
pub trait TransactionContext: Send + Sync {
    /// Upsert the value stored under `key`.
    fn put_state(&self, key: &str, value: &str) -> Result<(), LedgerError>;

    /// Point read. Returns `Ok(None)` if nothing is stored under `key`.
    fn get_state(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Remove `key` from current state. Succeeds even if absent.
    fn delete_state(&self, key: &str) -> Result<(), LedgerError>;

    /// Every historical version ever written under `key`, oldest first.
    fn history_for_key(&self, key: &str) -> Result<HistoryIter, LedgerError>;

    /// Rich query by a CouchDB-style JSON selector, e.g.
    /// `{"selector": {"topic": "news"}}`.
    fn query_result(&self, selector: &str) -> Result<QueryIter, LedgerError>;

    /// The host-assigned timestamp of the current transaction. Contracts
    /// use this instead of the wall clock so replays stay deterministic.
    fn tx_timestamp(&self) -> Result<DateTime<Utc>, LedgerError>;
}

/// A chaincode program: the two entry points the host invokes.
///
/// `init` runs during the ledger-initialization transaction phase, `invoke`
/// for regular transactions. Each entry point owns its own routing table
/// over function names and the tables stay disjoint, mirroring the host's
/// separate transaction phases. A function name with no entry produces a
/// bad-request response carrying the literal unknown name.
pub trait Chaincode: Send + Sync {
    /// Dispatch one initialization-phase call.
    fn init(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response;

    /// Dispatch one invocation-phase call.
    fn invoke(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response;
}
