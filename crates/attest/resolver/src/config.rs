use std::time::Duration;

/// Immutable engine configuration, supplied at construction.
///
/// Collaborators (ledger, pinning, publication cache) are injected as trait
/// objects alongside this struct; nothing in the engine reads module-level
/// globals, so tests run entirely against in-memory implementations.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound on a single write transaction's confirmation wait. On
    /// expiry the outcome is unknown, not failed.
    pub confirmation_timeout: Duration,
    /// Total attempts for an existence read, including the first.
    pub read_attempts: u32,
    /// Delay before the first read retry; doubles per retry.
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(60),
            read_attempts: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}
