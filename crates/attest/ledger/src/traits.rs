use async_trait::async_trait;

use attest_types::{Amount, AtomId, ContentUri, EntityId, TripleId};

use crate::error::LedgerError;
use crate::receipt::WriteReceipt;

/// Read boundary for ledger queries.
///
/// All reads are advisory with respect to writes: a `false` existence answer
/// can be stale by the time a create lands, and costs can change between
/// reads. Callers re-read costs immediately before each submission.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Whether an entity (atom or triple) has been created under `id`.
    async fn is_entity_created(&self, id: EntityId) -> Result<bool, LedgerError>;

    /// Current cost of creating one atom.
    async fn atom_cost(&self) -> Result<Amount, LedgerError>;

    /// Current cost of creating one triple.
    async fn triple_cost(&self) -> Result<Amount, LedgerError>;

    /// The (subject, predicate, object) atoms of a created triple.
    /// Reverts with [`RevertReason::UnknownEntity`] when absent.
    ///
    /// [`RevertReason::UnknownEntity`]: crate::error::RevertReason::UnknownEntity
    async fn triple(&self, id: TripleId) -> Result<(AtomId, AtomId, AtomId), LedgerError>;
}

/// Write boundary for entity creation.
///
/// Writes are atomic per transaction: either every entity in the call is
/// created and the sum of `costs` is charged, or the transaction reverts and
/// nothing is. Receipts list new ids in submission order.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Create one atom per content URI, paying `costs[i]` for `uris[i]`.
    async fn create_atoms(
        &self,
        uris: &[ContentUri],
        costs: &[Amount],
    ) -> Result<WriteReceipt<AtomId>, LedgerError>;

    /// Create one triple per (subject, predicate, object) column triple,
    /// paying `costs[i]` for position `i`. All referenced atoms must already
    /// exist.
    async fn create_triples(
        &self,
        subjects: &[AtomId],
        predicates: &[AtomId],
        objects: &[AtomId],
        costs: &[Amount],
    ) -> Result<WriteReceipt<TripleId>, LedgerError>;
}
