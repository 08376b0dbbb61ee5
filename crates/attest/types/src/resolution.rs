//! Outcomes of resolving atoms and triples against the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AtomId, ContentUri, TripleId, TxHash};

/// Whether a resolution created the entity or found it already on-ledger.
///
/// Callers must treat both as success; only display and cost accounting may
/// distinguish them ("created new" incurred a creation cost, "already
/// existed" did not).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// This call submitted the transaction that created the entity.
    Created,
    /// The entity was already on-ledger, created by an earlier call or
    /// another writer.
    Existing,
}

impl Provenance {
    pub fn is_existing(&self) -> bool {
        matches!(self, Provenance::Existing)
    }
}

/// Final outcome of one atom resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomResolution {
    pub id: AtomId,
    pub uri: ContentUri,
    pub provenance: Provenance,
    /// Present only when this call created the atom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl AtomResolution {
    pub fn created(id: AtomId, uri: ContentUri, tx_hash: TxHash) -> Self {
        Self {
            id,
            uri,
            provenance: Provenance::Created,
            tx_hash: Some(tx_hash),
        }
    }

    pub fn existing(id: AtomId, uri: ContentUri) -> Self {
        Self {
            id,
            uri,
            provenance: Provenance::Existing,
            tx_hash: None,
        }
    }
}

/// Final outcome of one triple resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleResolution {
    pub id: TripleId,
    pub subject: AtomId,
    pub predicate: AtomId,
    pub object: AtomId,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl TripleResolution {
    pub fn created(
        id: TripleId,
        subject: AtomId,
        predicate: AtomId,
        object: AtomId,
        tx_hash: TxHash,
    ) -> Self {
        Self {
            id,
            subject,
            predicate,
            object,
            provenance: Provenance::Created,
            tx_hash: Some(tx_hash),
        }
    }

    pub fn existing(id: TripleId, subject: AtomId, predicate: AtomId, object: AtomId) -> Self {
        Self {
            id,
            subject,
            predicate,
            object,
            provenance: Provenance::Existing,
            tx_hash: None,
        }
    }
}

/// Record handed to the local publication cache once a triple resolution
/// completes. The engine writes these; it never reads them back — the ledger
/// stays the source of truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Application-level id of the originating action, when the caller
    /// supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub triple_id: TripleId,
    pub subject_id: AtomId,
    pub predicate_id: AtomId,
    pub object_id: AtomId,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    pub published_at: DateTime<Utc>,
}

impl PublicationRecord {
    pub fn for_resolution(origin: Option<String>, resolution: &TripleResolution) -> Self {
        Self {
            origin,
            triple_id: resolution.id,
            subject_id: resolution.subject,
            predicate_id: resolution.predicate,
            object_id: resolution.object,
            provenance: resolution.provenance,
            tx_hash: resolution.tx_hash,
            published_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(seed: u8) -> AtomId {
        AtomId::from_bytes([seed; 32])
    }

    #[test]
    fn existing_resolutions_carry_no_tx_hash() {
        let triple = TripleResolution::existing(
            TripleId::derive(&atom(1), &atom(2), &atom(3)),
            atom(1),
            atom(2),
            atom(3),
        );
        assert!(triple.provenance.is_existing());
        assert!(triple.tx_hash.is_none());
    }

    #[test]
    fn publication_record_mirrors_the_resolution() {
        let triple = TripleResolution::created(
            TripleId::derive(&atom(1), &atom(2), &atom(3)),
            atom(1),
            atom(2),
            atom(3),
            TxHash::from_bytes([9; 32]),
        );
        let record = PublicationRecord::for_resolution(Some("action-7".into()), &triple);
        assert_eq!(record.triple_id, triple.id);
        assert_eq!(record.provenance, Provenance::Created);
        assert_eq!(record.tx_hash, triple.tx_hash);
        assert_eq!(record.origin.as_deref(), Some("action-7"));
    }
}
