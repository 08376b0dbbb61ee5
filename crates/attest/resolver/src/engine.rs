use std::sync::Arc;

use attest_ledger::{LedgerReader, LedgerWriter};
use attest_pinning::PinningClient;
use attest_types::{
    AtomMetadata, AtomResolution, CandidateTriple, PublicationRecord, TripleResolution,
};

use crate::atom::AtomResolver;
use crate::batch::{BatchOrchestrator, BatchOutcome};
use crate::config::EngineConfig;
use crate::error::ResolveError;
use crate::existence::ExistenceChecker;
use crate::publication::PublicationSink;
use crate::submit::TxSubmitter;
use crate::triple::TripleResolver;

/// The caller-facing claim-publishing engine.
///
/// Holds no long-lived entity state of its own — entities live on the
/// ledger, and the engine's only persistent output is publication records
/// handed to the injected sink. Each public operation is an independent
/// asynchronous unit of work; the only cross-operation coordination is the
/// submitter's per-account write serialization.
pub struct ClaimEngine {
    atoms: AtomResolver,
    triples: TripleResolver,
    orchestrator: BatchOrchestrator,
    sink: Arc<dyn PublicationSink>,
}

impl ClaimEngine {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        pinner: Arc<dyn PinningClient>,
        sink: Arc<dyn PublicationSink>,
        config: EngineConfig,
    ) -> Self {
        let checker = ExistenceChecker::new(reader.clone(), &config);
        let submitter = Arc::new(TxSubmitter::new(reader, writer, &config));
        let atoms = AtomResolver::new(pinner, checker.clone(), submitter.clone());
        let triples = TripleResolver::new(atoms.clone(), checker, submitter);
        let orchestrator = BatchOrchestrator::new(triples.clone());

        Self {
            atoms,
            triples,
            orchestrator,
            sink,
        }
    }

    /// Resolve claim metadata to an atom, creating it only if absent.
    pub async fn resolve_atom(
        &self,
        metadata: &AtomMetadata,
    ) -> Result<AtomResolution, ResolveError> {
        self.atoms.resolve(metadata).await
    }

    /// Resolve one claim to a triple, creating whatever is absent along the
    /// way. Emits a publication record on success.
    pub async fn resolve_triple(
        &self,
        subject_metadata: &AtomMetadata,
        candidate: &CandidateTriple,
    ) -> Result<TripleResolution, ResolveError> {
        let resolution = self.triples.resolve(subject_metadata, candidate).await?;
        self.publish(candidate.origin.clone(), &resolution).await;
        Ok(resolution)
    }

    /// Resolve a batch of claims sharing one subject, submitting at most one
    /// creation transaction. Emits a publication record per resolved entry.
    pub async fn resolve_batch(
        &self,
        subject_metadata: &AtomMetadata,
        candidates: &[CandidateTriple],
    ) -> Result<BatchOutcome, ResolveError> {
        let outcome = self
            .orchestrator
            .resolve_batch(subject_metadata, candidates)
            .await?;

        for (index, resolution) in outcome.resolved() {
            self.publish(candidates[index].origin.clone(), resolution)
                .await;
        }
        Ok(outcome)
    }

    async fn publish(&self, origin: Option<String>, resolution: &TripleResolution) {
        let record = PublicationRecord::for_resolution(origin, resolution);
        if let Err(error) = self.sink.record(&record).await {
            tracing::warn!(triple = %record.triple_id, %error, "publication sink failed");
        }
    }
}
