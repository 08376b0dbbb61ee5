//! Ledger interface boundaries for the attest engine.
//!
//! This crate provides:
//! - read/write trait boundaries for entity existence, costs, and creation
//! - the revert-reason taxonomy the engine classifies outcomes with
//! - an in-memory ledger implementation for tests, demos, and local use
//! - an HTTP RPC client for a remote ledger endpoint
//!
//! The ledger is the only authority on uniqueness: existence reads are
//! advisory, and a duplicate create is rejected by the ledger itself with a
//! machine-readable revert reason.

pub mod error;
pub mod memory;
pub mod receipt;
pub mod rpc;
pub mod traits;

pub use error::{LedgerError, RevertReason};
pub use memory::InMemoryLedger;
pub use receipt::WriteReceipt;
pub use rpc::HttpLedger;
pub use traits::{LedgerReader, LedgerWriter};
