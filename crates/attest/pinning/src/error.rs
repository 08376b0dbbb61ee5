use thiserror::Error;

/// Errors surfaced by pinning clients. Not retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PinningError {
    #[error("pinning transport failure: {0}")]
    Transport(String),

    #[error("pinning service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed pinning response: {0}")]
    Malformed(String),
}
