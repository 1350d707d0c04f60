//! Error Types for the Fuzzing Engine.
//!
//! Three recoverable error sources: configuration, backend failures (carried
//! with the trace position at which they occurred), and trace parsing during
//! replay. Generator-internal invariant violations are not represented here;
//! those abort via `panic!`/`assert!` with the violated invariant.

use thiserror::Error;

use crate::solver::SolverError;

/// Errors surfaced to the caller of the fuzzing engine.
#[derive(Debug, Error)]
pub enum SkelterError {
    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A backend call failed during generation or replay.
    ///
    /// `n_actions` is the number of actions fully executed before the
    /// failing one; together with the flushed trace this reproduces the
    /// finding.
    #[error("after {n_actions} actions, action `{action}`: {source}")]
    Backend {
        /// Trace tag of the failing action.
        action: String,
        /// Actions completed before the failure.
        n_actions: u64,
        /// The backend error.
        source: SolverError,
    },

    /// A trace line could not be parsed or replayed.
    #[error("untrace error at line {line}: {message}")]
    Untrace {
        /// 1-based line number in the trace stream.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Trace I/O failure.
    #[error("trace i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl SkelterError {
    /// Build a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        SkelterError::Config(message.into())
    }

    /// Build an untrace error for a trace line.
    #[must_use]
    pub fn untrace(line: usize, message: impl Into<String>) -> Self {
        SkelterError::Untrace {
            line,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, SkelterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_position() {
        let err = SkelterError::Backend {
            action: "check_sat".into(),
            n_actions: 17,
            source: SolverError::new("mock", "check_sat", "boom"),
        };
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("check_sat"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_untrace_error_carries_line() {
        let err = SkelterError::untrace(42, "unknown id t9");
        assert!(err.to_string().contains("line 42"));
    }
}
