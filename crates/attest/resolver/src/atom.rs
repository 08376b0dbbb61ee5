use std::sync::Arc;

use attest_pinning::PinningClient;
use attest_types::{AtomId, AtomMetadata, AtomResolution};

use crate::error::{classify_write_failure, ResolveError};
use crate::existence::ExistenceChecker;
use crate::submit::{SubmitFailure, TxSubmitter};

/// Resolves claim metadata to an atom id, creating the atom only if absent.
///
/// Pin, derive, check, create. The pre-create existence check is a cost
/// optimization; when it loses the race with another writer, the ledger's
/// already-exists revert is reclassified to a successful `Existing` result.
#[derive(Clone)]
pub struct AtomResolver {
    pinner: Arc<dyn PinningClient>,
    checker: ExistenceChecker,
    submitter: Arc<TxSubmitter>,
}

impl AtomResolver {
    pub fn new(
        pinner: Arc<dyn PinningClient>,
        checker: ExistenceChecker,
        submitter: Arc<TxSubmitter>,
    ) -> Self {
        Self {
            pinner,
            checker,
            submitter,
        }
    }

    pub async fn resolve(&self, metadata: &AtomMetadata) -> Result<AtomResolution, ResolveError> {
        let uri = self.pinner.pin(metadata).await?;
        let derived = AtomId::derive(&uri);

        // Repinning identical metadata is idempotent at the storage layer,
        // so an existing atom costs nothing beyond the read.
        if self.checker.exists(derived.into()).await? {
            tracing::debug!(atom = %derived, "atom already on-ledger");
            return Ok(AtomResolution::existing(derived, uri));
        }

        match self.submitter.create_atom(&uri).await {
            Ok(receipt) => {
                let id = match receipt.ids.first() {
                    Some(ledger_id) => {
                        if *ledger_id != derived {
                            tracing::warn!(
                                local = %derived,
                                ledger = %ledger_id,
                                "ledger-reported atom id differs from local derivation"
                            );
                        }
                        *ledger_id
                    }
                    None => {
                        tracing::warn!(
                            atom = %derived,
                            "receipt reported no id; falling back to local derivation"
                        );
                        derived
                    }
                };
                tracing::debug!(atom = %id, tx = %receipt.tx_hash, "atom created");
                Ok(AtomResolution::created(id, uri, receipt.tx_hash))
            }
            // The cost read failed before anything was submitted; nothing to
            // re-check.
            Err(SubmitFailure::Cost { attempts, source }) => {
                Err(ResolveError::Query { attempts, source })
            }
            Err(SubmitFailure::Write(error)) => match error.revert_reason() {
                // Lost the check-then-create race; the other writer's atom
                // is ours too.
                Some(reason) if reason.is_already_exists() => {
                    tracing::debug!(atom = %derived, "create reverted as duplicate; treating as existing");
                    Ok(AtomResolution::existing(derived, uri))
                }
                _ => Err(classify_write_failure(error)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attest_ledger::{InMemoryLedger, LedgerError, LedgerReader};
    use attest_pinning::{MemoryPinner, PinningError};
    use attest_types::{Amount, EntityId, Provenance, TripleId};

    use crate::config::EngineConfig;

    fn resolver(ledger: Arc<InMemoryLedger>, pinner: Arc<MemoryPinner>) -> AtomResolver {
        let config = EngineConfig::default();
        let checker = ExistenceChecker::new(ledger.clone(), &config);
        let submitter = Arc::new(TxSubmitter::new(ledger.clone(), ledger, &config));
        AtomResolver::new(pinner, checker, submitter)
    }

    #[tokio::test]
    async fn second_resolution_is_deduplicated_without_a_write() {
        let ledger = Arc::new(InMemoryLedger::default());
        let resolver = resolver(ledger.clone(), Arc::new(MemoryPinner::new()));
        let metadata = AtomMetadata::new("alice.eth", "https://example.com/alice");

        let first = resolver.resolve(&metadata).await.unwrap();
        assert_eq!(first.provenance, Provenance::Created);
        assert!(first.tx_hash.is_some());

        let second = resolver.resolve(&metadata).await.unwrap();
        assert_eq!(second.provenance, Provenance::Existing);
        assert_eq!(second.id, first.id);
        assert!(second.tx_hash.is_none());
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn losing_the_create_race_still_resolves() {
        let ledger = Arc::new(InMemoryLedger::default());
        let pinner = Arc::new(MemoryPinner::new());
        let resolver = resolver(ledger.clone(), pinner.clone());
        let metadata = AtomMetadata::new("contended", "https://example.com/contended");

        // The atom exists, but this resolver's existence read does not see
        // it yet — the optimistic race in miniature.
        let uri = pinner.pin(&metadata).await.unwrap();
        let first = resolver.resolve(&metadata).await.unwrap();
        ledger.conceal_from_reads(EntityId::from(AtomId::derive(&uri)));

        let raced = resolver.resolve(&metadata).await.unwrap();
        assert_eq!(raced.provenance, Provenance::Existing);
        assert_eq!(raced.id, first.id);
        assert_eq!(ledger.write_count(), 1);
    }

    struct UnreachableCosts {
        inner: Arc<InMemoryLedger>,
    }

    #[async_trait]
    impl LedgerReader for UnreachableCosts {
        async fn is_entity_created(&self, id: EntityId) -> Result<bool, LedgerError> {
            self.inner.is_entity_created(id).await
        }

        async fn atom_cost(&self) -> Result<Amount, LedgerError> {
            Err(LedgerError::transient("cost endpoint down"))
        }

        async fn triple_cost(&self) -> Result<Amount, LedgerError> {
            Err(LedgerError::transient("cost endpoint down"))
        }

        async fn triple(&self, id: TripleId) -> Result<(AtomId, AtomId, AtomId), LedgerError> {
            self.inner.triple(id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cost_read_outage_is_a_query_failure() {
        let ledger = Arc::new(InMemoryLedger::default());
        let reader = Arc::new(UnreachableCosts {
            inner: ledger.clone(),
        });
        let config = EngineConfig::default();
        let checker = ExistenceChecker::new(reader.clone(), &config);
        let submitter = Arc::new(TxSubmitter::new(reader, ledger.clone(), &config));
        let resolver = AtomResolver::new(Arc::new(MemoryPinner::new()), checker, submitter);

        // Nothing reached the ledger: the outcome is a retryable query
        // failure, not an ambiguous in-flight write.
        let error = resolver
            .resolve(&AtomMetadata::new("alice.eth", "https://example.com/alice"))
            .await
            .unwrap_err();
        assert!(matches!(error, ResolveError::Query { attempts: 3, .. }));
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn pinning_failure_is_fatal_to_the_resolution() {
        let ledger = Arc::new(InMemoryLedger::default());
        let pinner = Arc::new(MemoryPinner::new());
        pinner.fail_for("unpinnable");
        let resolver = resolver(ledger.clone(), pinner);

        let error = resolver
            .resolve(&AtomMetadata::new("unpinnable", "https://example.com/x"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ResolveError::Pinning(PinningError::Status { .. })
        ));
        assert_eq!(ledger.write_count(), 0);
    }
}
