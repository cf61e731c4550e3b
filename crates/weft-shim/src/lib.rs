//! Host interface shim for Weft contract programs.
//!
//! A contract program never talks to the host ledger directly. It receives a
//! [`TransactionContext`] capability, reads and writes state through it, and
//! reports its outcome as a [`Response`]. This crate defines that boundary
//! plus the pieces every contract shares:
//!
//! - [`TransactionContext`] -- state accessors granted to one invocation
//! - [`Chaincode`] -- the `init`/`invoke` entry points a contract exposes
//! - [`Response`] -- success, bad-request or internal-error outcome
//! - [`ChaincodeError`] -- handler failure taxonomy, mapped onto [`Response`]
//!   by who is at fault (caller vs. everything else)
//! - [`MemoryLedger`] -- in-process ledger for tests, demos and embedding
//!
//! # Design Rules
//!
//! 1. One invocation runs alone: no handler ever observes another mid-flight.
//! 2. State mutations take effect immediately and are visible to later reads
//!    in the same invocation.
//! 3. History and query results are forward-only streams, pulled lazily.
//! 4. A handler signals failure by returning an error, never by panicking.
//! 5. Malformed caller input maps to bad-request; everything else that goes
//!    wrong maps to internal-error.

pub mod error;
pub mod memory;
pub mod response;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{require_args, ChaincodeError, HandlerResult, LedgerError};
pub use memory::{LedgerSnapshot, MemoryLedger};
pub use response::Response;
pub use traits::{
    Chaincode, HistoryIter, KeyModification, KeyValue, QueryIter, TransactionContext,
};
