use std::sync::Arc;

use attest_types::{AtomId, AtomMetadata, CandidateTriple, TripleId, TripleResolution};

use crate::atom::AtomResolver;
use crate::error::ResolveError;
use crate::existence::ExistenceChecker;
use crate::submit::TxSubmitter;

/// A candidate whose atoms are resolved and whose triple id is derived,
/// awaiting either an existence shortcut or a creation transaction.
#[derive(Clone, Debug)]
pub struct PreparedTriple {
    pub origin: Option<String>,
    pub id: TripleId,
    pub subject: AtomId,
    pub predicate: AtomId,
    pub object: AtomId,
    pub exists: bool,
}

impl PreparedTriple {
    pub(crate) fn into_existing(self) -> TripleResolution {
        TripleResolution::existing(self.id, self.subject, self.predicate, self.object)
    }
}

/// Resolves one claim to a triple id, creating the triple only if absent.
///
/// Subject, predicate, and object atoms have no ordering dependency on each
/// other and resolve concurrently; the triple id derivation waits for all
/// three. Creation runs as a batch of size one so a single claim shares the
/// cost/submission/error-classification path with batches.
#[derive(Clone)]
pub struct TripleResolver {
    atoms: AtomResolver,
    checker: ExistenceChecker,
    submitter: Arc<TxSubmitter>,
}

impl TripleResolver {
    pub fn new(atoms: AtomResolver, checker: ExistenceChecker, submitter: Arc<TxSubmitter>) -> Self {
        Self {
            atoms,
            checker,
            submitter,
        }
    }

    pub(crate) fn atoms(&self) -> &AtomResolver {
        &self.atoms
    }

    pub(crate) fn checker(&self) -> &ExistenceChecker {
        &self.checker
    }

    pub(crate) fn submitter(&self) -> &TxSubmitter {
        &self.submitter
    }

    /// Resolve a candidate's predicate and object atoms against an
    /// already-resolved subject, derive the triple id, and check existence.
    pub async fn prepare(
        &self,
        subject: AtomId,
        candidate: &CandidateTriple,
    ) -> Result<PreparedTriple, ResolveError> {
        let predicate_metadata = AtomMetadata::for_predicate(&candidate.predicate);
        let (predicate, object) = futures::try_join!(
            self.atoms.resolve(&predicate_metadata),
            self.atoms.resolve(&candidate.object),
        )?;
        self.prepared(subject, predicate.id, object.id, candidate.origin.clone())
            .await
    }

    /// Full single-claim resolution: all three atoms concurrently, then
    /// check-or-create.
    pub async fn resolve(
        &self,
        subject_metadata: &AtomMetadata,
        candidate: &CandidateTriple,
    ) -> Result<TripleResolution, ResolveError> {
        let predicate_metadata = AtomMetadata::for_predicate(&candidate.predicate);
        let (subject, predicate, object) = futures::try_join!(
            self.atoms.resolve(subject_metadata),
            self.atoms.resolve(&predicate_metadata),
            self.atoms.resolve(&candidate.object),
        )?;

        let prepared = self
            .prepared(subject.id, predicate.id, object.id, candidate.origin.clone())
            .await?;
        if prepared.exists {
            tracing::debug!(triple = %prepared.id, "triple already on-ledger");
            return Ok(prepared.into_existing());
        }

        let mut outcomes =
            crate::batch::create_pending(&self.checker, &self.submitter, vec![prepared]).await;
        outcomes
            .pop()
            .expect("one pending entry yields exactly one outcome")
    }

    async fn prepared(
        &self,
        subject: AtomId,
        predicate: AtomId,
        object: AtomId,
        origin: Option<String>,
    ) -> Result<PreparedTriple, ResolveError> {
        let id = TripleId::derive(&subject, &predicate, &object);
        let exists = self.checker.exists(id.into()).await?;
        Ok(PreparedTriple {
            origin,
            id,
            subject,
            predicate,
            object,
            exists,
        })
    }
}
