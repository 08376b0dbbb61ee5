//! The attest claim-publishing engine.
//!
//! This crate turns caller-supplied claim metadata into ledger entities:
//! - pin metadata, derive the atom id, create the atom if absent
//! - resolve (subject, predicate, object) atoms and create the triple if
//!   absent
//! - batch many candidate triples into a single ledger transaction
//!
//! Check-then-create is optimistic, not locking: two writers may both observe
//! "absent" and both submit, and the ledger accepts exactly one. The engine
//! treats the loser's already-exists revert as success, so every public
//! operation is idempotent from the caller's point of view. Existence reads
//! are a cost optimization; the ledger's duplicate rejection is the
//! deduplication authority.

pub mod atom;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod existence;
pub mod publication;
pub mod submit;
pub mod triple;

pub use atom::AtomResolver;
pub use batch::{BatchOrchestrator, BatchOutcome};
pub use config::EngineConfig;
pub use engine::ClaimEngine;
pub use error::ResolveError;
pub use existence::ExistenceChecker;
pub use publication::{MemoryPublicationCache, NullSink, PublicationSink, SinkError};
pub use submit::{SubmitFailure, TxSubmitter};
pub use triple::{PreparedTriple, TripleResolver};
