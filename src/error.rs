//! Error types for sampler construction and optimization.

use thiserror::Error;

/// Error variants for construction, optimization, and interchange.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested divergence has no closed-form kernel.
    #[error("divergence kernel not implemented: {0}")]
    UnimplementedKernel(&'static str),

    /// Pruning exceeded its theoretical iteration bound, which indicates
    /// inconsistent marginal costs from the kernel evaluation.
    #[error("numerical instability: pruning exceeded {0} iterations")]
    NumericalInstability(usize),

    /// An internal invariant was broken during construction.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed caller input: bad precision parameters or an
    /// unnormalized target distribution.
    #[error("domain error: {0}")]
    DomainError(String),

    /// The bit budget cannot represent the support of the target
    /// distribution under a strict-support divergence.
    #[error("insufficient precision: {0}")]
    InsufficientPrecision(String),

    /// Malformed text in a serialized sampler file.
    #[error("parse error: {0}")]
    Parse(String),

    /// An I/O error occurred while reading or writing a sampler.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for sampler operations.
pub type Result<T> = std::result::Result<T, Error>;
