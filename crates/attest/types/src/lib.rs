//! Core type definitions for the attest claim-publishing engine.
//!
//! This crate provides the shared vocabulary of the workspace: content URIs,
//! derived atom/triple identifiers, creation-cost amounts, claim metadata,
//! and the resolution/publication result types. Everything here is pure data;
//! no I/O happens below this line.

pub mod amount;
pub mod ids;
pub mod metadata;
pub mod resolution;

pub use amount::Amount;
pub use ids::{AtomId, ContentUri, EntityId, IdParseError, TripleId, TxHash};
pub use metadata::{AtomMetadata, CandidateTriple};
pub use resolution::{AtomResolution, Provenance, PublicationRecord, TripleResolution};
