use std::sync::Arc;
use std::time::Duration;

use attest_ledger::LedgerReader;
use attest_types::EntityId;

use crate::config::EngineConfig;
use crate::error::ResolveError;

/// Existence reads with bounded retry on transient RPC failure.
///
/// A definitive `false` and a failed read are different things: the former
/// says "not created as of this read", the latter says nothing. Only
/// transient failures are retried; exhaustion surfaces as
/// [`ResolveError::Query`] so callers never mistake an outage for absence.
#[derive(Clone)]
pub struct ExistenceChecker {
    reader: Arc<dyn LedgerReader>,
    attempts: u32,
    backoff: Duration,
}

impl ExistenceChecker {
    pub fn new(reader: Arc<dyn LedgerReader>, config: &EngineConfig) -> Self {
        Self {
            reader,
            attempts: config.read_attempts.max(1),
            backoff: config.retry_backoff,
        }
    }

    pub async fn exists(&self, id: EntityId) -> Result<bool, ResolveError> {
        let mut delay = self.backoff;
        for attempt in 1..=self.attempts {
            match self.reader.is_entity_created(id).await {
                Ok(found) => return Ok(found),
                Err(error) if error.is_transient() && attempt < self.attempts => {
                    tracing::warn!(
                        id = %id,
                        attempt,
                        %error,
                        "existence read failed transiently; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(error) => {
                    return Err(ResolveError::Query {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
        unreachable!("loop returns on every attempt")
    }
}
