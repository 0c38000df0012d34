//! Error types for helm-rs.

use thiserror::Error;

/// Errors that can occur when building or using a Helm controller.
///
/// Oracle anomalies (no model, stale model, out-of-range policy index) are
/// deliberately absent: they are recovered locally by falling back to the
/// default action and never surface as errors.
#[derive(Debug, Error)]
pub enum HelmError {
    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Error building the rayon thread pool backing the CPU executor.
    #[error("failed to build executor thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Error registering metrics with a Prometheus registry.
    #[error("metrics registration error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Device executor failure (kernel launch or stream synchronization).
    ///
    /// Propagated unmodified to the caller; the owning region's `end()`
    /// notification has already run by the time this is observed.
    #[error("device executor error: {0}")]
    Device(String),
}

/// Result type alias for Helm operations.
pub type Result<T> = std::result::Result<T, HelmError>;
