//! Engine error taxonomy.
//!
//! Every fallible engine operation rejects before mutating state. The only
//! sanctioned swallow is cron's per-task skip-and-continue, which records the
//! error in the run's diagnostics instead of propagating it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed recurrence or value input, rejected before any state change.
    #[error("validation: {0}")]
    Validation(String),

    /// Recurrence pattern produced no occurrence within the scan horizon.
    #[error("unresolvable recurrence: {0}")]
    UnresolvableRecurrence(String),

    /// Operation incompatible with current task/user state.
    #[error("precondition violated: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
