use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable reason attached to a rejected ledger write.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertReason {
    #[error("atom already exists")]
    AtomExists,

    #[error("triple already exists")]
    TripleExists,

    #[error("account balance below the transaction's total cost")]
    InsufficientFunds,

    #[error("triple references an atom that has not been created")]
    MissingAtom,

    #[error("no entity is registered under the given id")]
    UnknownEntity,

    #[error("ledger revert: {0}")]
    Other(String),
}

impl RevertReason {
    /// True when the revert encodes "the entity you tried to create is
    /// already on-ledger" — the engine reclassifies these as success.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, RevertReason::AtomExists | RevertReason::TripleExists)
    }
}

/// Errors returned by ledger read and write boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A read failed for network/RPC reasons. Retryable; says nothing about
    /// whether the queried entity exists.
    #[error("transient ledger query failure: {message}")]
    Transient { message: String },

    /// The ledger rejected a write before or during execution.
    #[error("ledger write reverted: {reason}")]
    Reverted { reason: RevertReason },

    /// The confirmation wait ran out. The transaction may still land, so the
    /// outcome is unknown: re-check existence, never resubmit blindly.
    #[error("transaction confirmation timed out; outcome unknown")]
    ConfirmationTimeout,

    #[error("malformed ledger response: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn reverted(reason: RevertReason) -> Self {
        Self::Reverted { reason }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transient { .. })
    }

    /// The revert reason, when this error is a revert.
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            LedgerError::Reverted { reason } => Some(reason),
            _ => None,
        }
    }
}
