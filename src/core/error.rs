// src/core/error.rs

use thiserror::Error;

/// Error taxonomy for the factoring core.
///
/// Internal invariant violations (`b² ≢ kN (mod a)`, a residual that fails
/// exact trial division, `Y·Y ≠ Y²`) are programming errors: in debug
/// builds they trip a `debug_assert!` and panic before this type is ever
/// constructed. `InternalInvariant` exists so the driver can still report
/// a clean error if such a check is compiled out or caught at the session
/// boundary, per the "release builds may elide the checks but must not
/// produce incorrect results" language in the error-handling design.
#[derive(Debug, Error)]
pub enum MpqsError {
    /// N is prime, a perfect power, has a factor ≤ the factor-base bound,
    /// or no multiplier k satisfies kN ≡ 1 (mod 8). Caller's responsibility.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    /// Ran out of polynomials or retry rounds without splitting N.
    /// Recoverable: the caller may raise parameters and retry.
    #[error("exhausted retry budget without finding a factor: {0}")]
    Exhaustion(String),

    /// An invariant the algorithm depends on did not hold. Indicates a bug.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    /// Cooperative cancellation via the session's stop flag.
    #[error("factoring cancelled")]
    Cancelled,

    /// Persisted-state (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure while loading/saving persisted state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MpqsResult<T> = Result<T, MpqsError>;
