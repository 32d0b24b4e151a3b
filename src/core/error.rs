use thiserror::Error;

/// Failure taxonomy of the engine. Every error is scoped to a single
/// invocation; the caller fixes the offending input and re-invokes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    /// Internal assertion: the balance left the valid range. Should be
    /// unreachable while the simulator's clamps hold.
    #[error("inconsistent schedule: {0}")]
    InconsistentSchedule(String),
}
