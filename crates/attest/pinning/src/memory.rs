use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use attest_types::{AtomMetadata, ContentUri};

use crate::error::PinningError;
use crate::PinningClient;

/// Content-addressed in-memory pinner for tests and local demos.
///
/// The URI is derived from the canonical JSON of the metadata, so identical
/// metadata always pins to the same URI — the idempotency the engine expects
/// from the real storage layer.
pub struct MemoryPinner {
    failing_names: RwLock<HashSet<String>>,
    pin_count: RwLock<usize>,
}

impl Default for MemoryPinner {
    fn default() -> Self {
        Self {
            failing_names: RwLock::new(HashSet::new()),
            pin_count: RwLock::new(0),
        }
    }
}

impl MemoryPinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every pin of metadata with this `name` fail, for tests that need
    /// one candidate in a batch to drop out before submission.
    pub fn fail_for(&self, name: impl Into<String>) {
        self.failing_names
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into());
    }

    pub fn pin_count(&self) -> usize {
        *self
            .pin_count
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn content_uri(metadata: &AtomMetadata) -> Result<ContentUri, PinningError> {
        let canonical = serde_json::to_vec(metadata)
            .map_err(|error| PinningError::Malformed(error.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"attest-pin-v1:");
        hasher.update(&canonical);
        let digest = hasher.finalize();
        Ok(ContentUri::new(format!("ipfs://b3/{}", hex::encode(digest.as_bytes()))))
    }
}

#[async_trait]
impl PinningClient for MemoryPinner {
    async fn pin(&self, metadata: &AtomMetadata) -> Result<ContentUri, PinningError> {
        if self
            .failing_names
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&metadata.name)
        {
            return Err(PinningError::Status {
                status: 503,
                body: format!("pinning unavailable for {}", metadata.name),
            });
        }

        *self
            .pin_count
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;

        Self::content_uri(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_metadata_pins_to_the_same_uri() {
        let pinner = MemoryPinner::new();
        let metadata = AtomMetadata::new("alice.eth", "https://example.com/alice");

        let first = pinner.pin(&metadata).await.unwrap();
        let second = pinner.pin(&metadata).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(pinner.pin_count(), 2);
    }

    #[tokio::test]
    async fn different_metadata_pins_to_different_uris() {
        let pinner = MemoryPinner::new();
        let alice = pinner
            .pin(&AtomMetadata::new("alice.eth", "https://example.com/alice"))
            .await
            .unwrap();
        let bob = pinner
            .pin(&AtomMetadata::new("bob.eth", "https://example.com/bob"))
            .await
            .unwrap();
        assert_ne!(alice, bob);
    }

    #[tokio::test]
    async fn failure_lever_hits_only_the_named_metadata() {
        let pinner = MemoryPinner::new();
        pinner.fail_for("broken");

        let error = pinner
            .pin(&AtomMetadata::new("broken", "https://example.com/broken"))
            .await
            .unwrap_err();
        assert!(matches!(error, PinningError::Status { status: 503, .. }));

        pinner
            .pin(&AtomMetadata::new("fine", "https://example.com/fine"))
            .await
            .unwrap();
    }
}
