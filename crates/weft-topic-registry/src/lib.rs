//! Topic registry contract: the first, smaller of the two Weft example
//! contracts.
//!
//! Each ledger key holds one [`TopicRecord`], a pub/sub registration
//! `{"type": "pub"|"sub", "topic": ...}`. [`TopicRegistry`] implements the
//! [`Chaincode`](weft_shim::Chaincode) entry points:
//!
//! - `init(key, type, topic)` through the initialization table
//! - `invoke(key, type, topic)`, `delete(key)`, `query(key)` and
//!   `history(key)` through the invocation table
//!
//! `invoke` echoes the written JSON back as its payload; `query` re-shapes
//! the record with its key inlined; `history` reports every past value with
//! the host's timestamps, delete markers included.

pub mod contract;
pub mod record;

pub use contract::TopicRegistry;
pub use record::{ClientKind, TopicRecord};
