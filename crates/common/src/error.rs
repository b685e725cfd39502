use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Not enough candles for a computation. Callers skip the instrument for
    /// the cycle; never fatal.
    #[error("insufficient data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Rate limit, timeout, upstream hiccup. Retry once, then skip for this
    /// cycle.
    #[error("transient upstream error: {0}")]
    Transient(String),

    /// Invalid instrument, rejected order. Drop the instrument / abandon the
    /// attempt and continue the loop.
    #[error("permanent error: {0}")]
    Permanent(String),

    /// A state transition that the pre-checks should have made impossible.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the single-retry policy applies.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
