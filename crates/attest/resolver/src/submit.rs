use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;

use attest_ledger::{LedgerError, LedgerReader, LedgerWriter, WriteReceipt};
use attest_types::{Amount, AtomId, ContentUri, TripleId};

use crate::config::EngineConfig;

/// Failure on the submitter's path, split by whether a transaction actually
/// went out.
///
/// A cost-read failure happens strictly before submission: the ledger never
/// saw the write, so the caller may retry freely. A write failure happened
/// after, and only its revert reason says anything definitive about the
/// outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    #[error("cost read failed after {attempts} attempt(s): {source}")]
    Cost { attempts: u32, source: LedgerError },

    #[error(transparent)]
    Write(LedgerError),
}

enum CostKind {
    Atom,
    Triple,
}

/// The engine's single write path to the ledger.
///
/// Two rules live here and nowhere else:
/// - outbound writes from this process are serialized (one in-flight create
///   per account, since writes share the account's nonce), while reads stay
///   fully parallel;
/// - the creation cost is read fresh inside the write lock, immediately
///   before each submission — never cached across calls. The cost read is a
///   ledger read like any other and retries transient failures with the same
///   policy as existence checks.
///
/// Confirmation waits are bounded; on expiry the caller gets
/// [`LedgerError::ConfirmationTimeout`] and must re-check existence rather
/// than resubmit.
pub struct TxSubmitter {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    write_lock: Mutex<()>,
    confirmation_timeout: Duration,
    read_attempts: u32,
    retry_backoff: Duration,
}

impl TxSubmitter {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            write_lock: Mutex::new(()),
            confirmation_timeout: config.confirmation_timeout,
            read_attempts: config.read_attempts.max(1),
            retry_backoff: config.retry_backoff,
        }
    }

    async fn read_cost(&self, kind: CostKind) -> Result<Amount, SubmitFailure> {
        let mut delay = self.retry_backoff;
        for attempt in 1..=self.read_attempts {
            let read = match kind {
                CostKind::Atom => self.reader.atom_cost().await,
                CostKind::Triple => self.reader.triple_cost().await,
            };
            match read {
                Ok(cost) => return Ok(cost),
                Err(error) if error.is_transient() && attempt < self.read_attempts => {
                    tracing::warn!(attempt, %error, "cost read failed transiently; retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(error) => {
                    return Err(SubmitFailure::Cost {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
        unreachable!("loop returns on every attempt")
    }

    /// Submit a create-atom transaction for one pinned URI.
    pub async fn create_atom(
        &self,
        uri: &ContentUri,
    ) -> Result<WriteReceipt<AtomId>, SubmitFailure> {
        let _guard = self.write_lock.lock().await;
        let cost = self.read_cost(CostKind::Atom).await?;
        tracing::debug!(%uri, %cost, "submitting atom creation");

        timeout(
            self.confirmation_timeout,
            self.writer.create_atoms(std::slice::from_ref(uri), &[cost]),
        )
        .await
        .map_err(|_| SubmitFailure::Write(LedgerError::ConfirmationTimeout))?
        .map_err(SubmitFailure::Write)
    }

    /// Submit one transaction creating every triple in the given columns,
    /// paying the current per-triple cost for each.
    pub async fn create_triples(
        &self,
        subjects: &[AtomId],
        predicates: &[AtomId],
        objects: &[AtomId],
    ) -> Result<WriteReceipt<TripleId>, SubmitFailure> {
        let _guard = self.write_lock.lock().await;
        let cost = self.read_cost(CostKind::Triple).await?;
        let costs = vec![cost; subjects.len()];
        tracing::debug!(count = subjects.len(), %cost, "submitting triple creation batch");

        timeout(
            self.confirmation_timeout,
            self.writer
                .create_triples(subjects, predicates, objects, &costs),
        )
        .await
        .map_err(|_| SubmitFailure::Write(LedgerError::ConfirmationTimeout))?
        .map_err(SubmitFailure::Write)
    }
}
