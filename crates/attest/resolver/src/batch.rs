use futures::future::join_all;

use attest_ledger::RevertReason;
use attest_types::{AtomMetadata, CandidateTriple, TripleResolution};

use crate::error::{classify_write_failure, ResolveError};
use crate::existence::ExistenceChecker;
use crate::submit::{SubmitFailure, TxSubmitter};
use crate::triple::{PreparedTriple, TripleResolver};

/// Per-index outcomes of a batch resolution.
///
/// `results[i]` always corresponds to `candidates[i]` — never permuted.
/// A failed entry never implies anything about its siblings: pre-submission
/// failures are per-candidate, and a rejected ledger transaction creates
/// nothing at all.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<Result<TripleResolution, ResolveError>>,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Successfully resolved entries with their input indices.
    pub fn resolved(&self) -> impl Iterator<Item = (usize, &TripleResolution)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.as_ref().ok().map(|r| (index, r)))
    }

    /// Failed entries with their input indices.
    pub fn failed(&self) -> impl Iterator<Item = (usize, &ResolveError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.as_ref().err().map(|e| (index, e)))
    }
}

/// Resolves many candidate triples sharing one subject, submitting at most
/// one creation transaction for the whole set.
pub struct BatchOrchestrator {
    triples: TripleResolver,
}

impl BatchOrchestrator {
    pub fn new(triples: TripleResolver) -> Self {
        Self { triples }
    }

    /// Resolve every candidate against a shared subject.
    ///
    /// The subject atom is resolved once for the whole batch; a subject
    /// failure fails the batch, since no candidate can be derived without
    /// it. Everything after that is per-candidate: predicate/object
    /// resolution and the triple existence check run concurrently across
    /// candidates, pre-submission failures mark only their own index, and
    /// the entries still needing creation go to the ledger in one
    /// transaction whose receipt maps back to inputs by position.
    pub async fn resolve_batch(
        &self,
        subject_metadata: &AtomMetadata,
        candidates: &[CandidateTriple],
    ) -> Result<BatchOutcome, ResolveError> {
        if candidates.is_empty() {
            return Ok(BatchOutcome { results: vec![] });
        }

        let subject = self.triples.atoms().resolve(subject_metadata).await?;
        tracing::debug!(
            subject = %subject.id,
            candidates = candidates.len(),
            "resolving batch"
        );

        let prepared = join_all(
            candidates
                .iter()
                .map(|candidate| self.triples.prepare(subject.id, candidate)),
        )
        .await;

        let mut results: Vec<Option<Result<TripleResolution, ResolveError>>> =
            vec![None; candidates.len()];
        let mut pending: Vec<(usize, PreparedTriple)> = Vec::new();

        for (index, entry) in prepared.into_iter().enumerate() {
            match entry {
                Err(error) => results[index] = Some(Err(error)),
                Ok(p) if p.exists => results[index] = Some(Ok(p.into_existing())),
                Ok(p) => pending.push((index, p)),
            }
        }

        if !pending.is_empty() {
            let (indices, entries): (Vec<usize>, Vec<PreparedTriple>) =
                pending.into_iter().unzip();
            let outcomes =
                create_pending(self.triples.checker(), self.triples.submitter(), entries).await;
            for (index, outcome) in indices.into_iter().zip(outcomes) {
                results[index] = Some(outcome);
            }
        }

        Ok(BatchOutcome {
            results: results
                .into_iter()
                .map(|slot| slot.expect("every candidate index is filled exactly once"))
                .collect(),
        })
    }
}

/// Submit one creation transaction for the pending set and map the outcome
/// back onto it, index for index.
///
/// Two entries deriving the same triple id are the same claim; submitting
/// both would make the transaction collide with itself and revert. Each
/// distinct id goes to the ledger once and its outcome is fanned out to
/// every entry sharing it.
pub(crate) async fn create_pending(
    checker: &ExistenceChecker,
    submitter: &TxSubmitter,
    pending: Vec<PreparedTriple>,
) -> Vec<Result<TripleResolution, ResolveError>> {
    let mut distinct: Vec<PreparedTriple> = Vec::new();
    let mut slots = Vec::with_capacity(pending.len());
    for entry in &pending {
        match distinct.iter().position(|d| d.id == entry.id) {
            Some(slot) => slots.push(slot),
            None => {
                slots.push(distinct.len());
                distinct.push(entry.clone());
            }
        }
    }

    let outcomes = submit_distinct(checker, submitter, distinct).await;
    slots.into_iter().map(|slot| outcomes[slot].clone()).collect()
}

/// Submit one creation transaction for a set of distinct pending triples.
///
/// Ledger batches are atomic, so a revert means nothing was created. A
/// recognized already-exists revert does not say which entry won a race
/// elsewhere; each entry is re-checked to recover the winners, and the rest
/// stay failed-retryable so a caller's retry naturally shrinks the set.
async fn submit_distinct(
    checker: &ExistenceChecker,
    submitter: &TxSubmitter,
    pending: Vec<PreparedTriple>,
) -> Vec<Result<TripleResolution, ResolveError>> {
    let subjects: Vec<_> = pending.iter().map(|p| p.subject).collect();
    let predicates: Vec<_> = pending.iter().map(|p| p.predicate).collect();
    let objects: Vec<_> = pending.iter().map(|p| p.object).collect();

    match submitter.create_triples(&subjects, &predicates, &objects).await {
        Ok(receipt) => {
            if receipt.ids.len() != pending.len() {
                tracing::warn!(
                    expected = pending.len(),
                    reported = receipt.ids.len(),
                    "receipt id count does not match the submitted set"
                );
                let reason = RevertReason::Other(format!(
                    "receipt reported {} ids for {} submissions",
                    receipt.ids.len(),
                    pending.len()
                ));
                return pending
                    .iter()
                    .map(|_| Err(ResolveError::Reverted { reason: reason.clone() }))
                    .collect();
            }

            pending
                .into_iter()
                .zip(receipt.ids)
                .map(|(p, ledger_id)| {
                    if ledger_id != p.id {
                        tracing::warn!(
                            local = %p.id,
                            ledger = %ledger_id,
                            "ledger-reported triple id differs from local derivation"
                        );
                    }
                    Ok(TripleResolution::created(
                        ledger_id,
                        p.subject,
                        p.predicate,
                        p.object,
                        receipt.tx_hash,
                    ))
                })
                .collect()
        }
        Err(SubmitFailure::Cost { attempts, source }) => {
            // Nothing was submitted; the whole set is retryable.
            let classified = ResolveError::Query { attempts, source };
            tracing::warn!(%classified, pending = pending.len(), "cost read failed before submission");
            pending.iter().map(|_| Err(classified.clone())).collect()
        }
        Err(SubmitFailure::Write(error)) => {
            let reason = error.revert_reason().cloned();
            match reason {
                Some(reason) if reason.is_already_exists() => {
                    tracing::debug!(
                        pending = pending.len(),
                        "batch reverted as duplicate; re-checking each entry"
                    );
                    let mut outcomes = Vec::with_capacity(pending.len());
                    for p in pending {
                        let outcome = match checker.exists(p.id.into()).await {
                            Ok(true) => Ok(p.into_existing()),
                            Ok(false) => Err(ResolveError::Reverted {
                                reason: reason.clone(),
                            }),
                            Err(query) => Err(query),
                        };
                        outcomes.push(outcome);
                    }
                    outcomes
                }
                _ => {
                    let classified = classify_write_failure(error);
                    tracing::warn!(%classified, pending = pending.len(), "batch submission failed");
                    pending.iter().map(|_| Err(classified.clone())).collect()
                }
            }
        }
    }
}
