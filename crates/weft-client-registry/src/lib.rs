//! Client registry contract: the second Weft example contract, with
//! timestamped records and rich queries.
//!
//! Each ledger key holds one [`Registration`]: the client's topic, id,
//! [`ClientRole`] and the transaction time the host stamped on the write.
//! [`ClientRegistry`] implements the [`Chaincode`](weft_shim::Chaincode)
//! entry points:
//!
//! - `init(key, role, topic)` through the initialization table
//! - `invoke(key, role, topic)` (an alias of `init`), `delete(key)`,
//!   `query(key)`, `history(key)` and `queryByProperty(property, value)`
//!   through the invocation table
//!
//! `query` returns the stored text verbatim; `history` re-encodes every
//! surviving version, skipping delete markers; `queryByProperty` builds an
//! equality selector and delegates to the host's rich-query engine.

pub mod contract;
pub mod record;

pub use contract::ClientRegistry;
pub use record::{ClientRole, Registration};
