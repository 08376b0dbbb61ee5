use serde::{Deserialize, Serialize};

use attest_types::TxHash;

/// Result of a confirmed ledger write transaction.
///
/// `ids` holds the ledger-assigned identifier of every entity the
/// transaction created, **in the order they were submitted**. Batch
/// orchestration maps results back to inputs by index, so an implementation
/// that reorders ids violates the write contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt<T> {
    pub ids: Vec<T>,
    pub tx_hash: TxHash,
}

impl<T> WriteReceipt<T> {
    pub fn new(ids: Vec<T>, tx_hash: TxHash) -> Self {
        Self { ids, tx_hash }
    }
}
