use thiserror::Error;

use attest_ledger::{LedgerError, RevertReason};
use attest_pinning::PinningError;

/// Errors surfaced by the engine's public operations.
///
/// An already-exists revert is deliberately absent: it is reclassified to a
/// successful `Existing` resolution before reaching the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Metadata could not be pinned; fatal to the atom resolution that
    /// needed it.
    #[error("pinning failed: {0}")]
    Pinning(#[from] PinningError),

    /// A ledger read kept failing transiently, or failed outright. Safe to
    /// retry the whole operation; says nothing about existence.
    #[error("ledger query failed after {attempts} attempt(s): {source}")]
    Query { attempts: u32, source: LedgerError },

    /// The write reverted before execution because the account cannot cover
    /// the transaction's total cost. Not retryable until funding changes.
    #[error("insufficient funds for creation")]
    InsufficientFunds,

    /// The write reverted for a reason the engine does not recognize as
    /// deduplication. Retrying the operation re-checks existence and so
    /// naturally shrinks the work.
    #[error("ledger write reverted: {reason}")]
    Reverted { reason: RevertReason },

    /// Confirmation wait ran out or the transport dropped mid-write; the
    /// transaction may still land. Re-check existence before retrying —
    /// never resubmit blindly.
    #[error("write outcome unknown; re-check existence before retrying")]
    OutcomeUnknown,
}

/// Classify a write-path ledger failure that is not an already-exists revert.
pub(crate) fn classify_write_failure(error: LedgerError) -> ResolveError {
    match error {
        LedgerError::Reverted {
            reason: RevertReason::InsufficientFunds,
        } => ResolveError::InsufficientFunds,
        LedgerError::Reverted { reason } => ResolveError::Reverted { reason },
        // A write whose transport failed or whose response we could not read
        // may still have landed; both are ambiguous outcomes.
        LedgerError::ConfirmationTimeout
        | LedgerError::Transient { .. }
        | LedgerError::Decode(_) => ResolveError::OutcomeUnknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_is_lifted_out_of_the_revert() {
        let classified =
            classify_write_failure(LedgerError::reverted(RevertReason::InsufficientFunds));
        assert_eq!(classified, ResolveError::InsufficientFunds);
    }

    #[test]
    fn ambiguous_write_failures_map_to_outcome_unknown() {
        assert_eq!(
            classify_write_failure(LedgerError::ConfirmationTimeout),
            ResolveError::OutcomeUnknown
        );
        assert_eq!(
            classify_write_failure(LedgerError::transient("socket closed")),
            ResolveError::OutcomeUnknown
        );
    }

    #[test]
    fn unrecognized_reverts_keep_their_reason() {
        let classified =
            classify_write_failure(LedgerError::reverted(RevertReason::Other("oops".into())));
        assert_eq!(
            classified,
            ResolveError::Reverted {
                reason: RevertReason::Other("oops".into())
            }
        );
    }
}
