//! Content-pinning boundary for claim metadata.
//!
//! Pinning turns claim metadata into a canonical content URI; the atom id is
//! derived from that URI. The storage layer is content-addressed, so pinning
//! identical metadata twice returns the same URI and is safe and cheap. A
//! pinning failure is fatal to the single atom resolution that needed it — no
//! atom id can be derived without a URI.

pub mod error;
pub mod http;
pub mod memory;

pub use error::PinningError;
pub use http::HttpPinningClient;
pub use memory::MemoryPinner;

use async_trait::async_trait;

use attest_types::{AtomMetadata, ContentUri};

/// Pinning service boundary.
#[async_trait]
pub trait PinningClient: Send + Sync {
    /// Pin metadata and return its canonical content URI.
    async fn pin(&self, metadata: &AtomMetadata) -> Result<ContentUri, PinningError>;
}
