use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use attest_types::PublicationRecord;

/// Failure to persist a publication record.
///
/// Sink failures never fail a resolution: the entities are on the ledger
/// either way, and the ledger stays the source of truth. The engine logs and
/// moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("publication sink failure: {0}")]
pub struct SinkError(pub String);

/// Local publication cache boundary.
///
/// The engine emits a record after every successful or deduped triple
/// resolution so the cache can prevent the same application-level action
/// from re-submitting and can display outcomes. The engine never reads this
/// cache for its own correctness decisions.
#[async_trait]
pub trait PublicationSink: Send + Sync {
    async fn record(&self, record: &PublicationRecord) -> Result<(), SinkError>;
}

/// Sink for callers that keep no local cache.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PublicationSink for NullSink {
    async fn record(&self, _record: &PublicationRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory publication cache for tests and local demos.
///
/// Records with an origin are write-once per origin: re-publishing the same
/// application action keeps the first record.
#[derive(Default)]
pub struct MemoryPublicationCache {
    inner: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    records: Vec<PublicationRecord>,
    by_origin: HashMap<String, usize>,
}

impl MemoryPublicationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PublicationRecord> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .records
            .clone()
    }

    pub fn by_origin(&self, origin: &str) -> Option<PublicationRecord> {
        let state = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state
            .by_origin
            .get(origin)
            .and_then(|index| state.records.get(*index))
            .cloned()
    }
}

#[async_trait]
impl PublicationSink for MemoryPublicationCache {
    async fn record(&self, record: &PublicationRecord) -> Result<(), SinkError> {
        let mut state = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(origin) = &record.origin {
            if state.by_origin.contains_key(origin) {
                tracing::debug!(%origin, "publication already recorded; keeping the first");
                return Ok(());
            }
            let index = state.records.len();
            state.by_origin.insert(origin.clone(), index);
        }
        state.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::{AtomId, Provenance, TripleId, TripleResolution};

    fn record(origin: Option<&str>) -> PublicationRecord {
        let (s, p, o) = (
            AtomId::from_bytes([1; 32]),
            AtomId::from_bytes([2; 32]),
            AtomId::from_bytes([3; 32]),
        );
        let resolution = TripleResolution::existing(TripleId::derive(&s, &p, &o), s, p, o);
        PublicationRecord::for_resolution(origin.map(String::from), &resolution)
    }

    #[tokio::test]
    async fn records_are_write_once_per_origin() {
        let cache = MemoryPublicationCache::new();
        cache.record(&record(Some("action-1"))).await.unwrap();
        cache.record(&record(Some("action-1"))).await.unwrap();
        cache.record(&record(None)).await.unwrap();

        assert_eq!(cache.records().len(), 2);
        let found = cache.by_origin("action-1").unwrap();
        assert_eq!(found.provenance, Provenance::Existing);
    }
}
