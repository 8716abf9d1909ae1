//! Error handling for tool life forecasting
//!
//! Provides error types for both layers the forecast touches:
//! - Lookup errors (collaborators: repositories, catalogs, estimators)
//! - Estimation errors (broken invariants inside the engine)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Lookup error type
///
/// Represents failures of the collaborators the engine reads from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The entity was invalidated by a concurrent data change
    #[error("Stale {entity} {id}")]
    Stale {
        /// Kind of entity (machine, operation, ...)
        entity: String,
        /// Entity identifier
        id: String,
    },

    /// The entity does not exist (anymore)
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity
        entity: String,
        /// Entity identifier
        id: String,
    },

    /// The backing store failed
    #[error("Store error: {reason}")]
    Store {
        /// The reason of the failure
        reason: String,
    },
}

/// Estimation error type
///
/// Raised when a precondition of the engine does not hold. These are
/// programming errors, never a normal absence of data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    /// Progress data was required but is not available
    #[error("Machine module progress unavailable for tool {tool_number}")]
    ProgressUnavailable {
        /// The tool number being estimated
        tool_number: String,
    },

    /// The sequence walk ran out of sequences before consuming the tool life
    #[error("Sequence walk for tool {tool_number} did not resolve ({remaining_ms}ms left)")]
    UnresolvedDurationWalk {
        /// The tool number being estimated
        tool_number: String,
        /// Tool life left when the walk ended, in milliseconds
        remaining_ms: i64,
    },

    /// A remaining time range could not be projected on the wall clock
    #[error("Inconsistent remaining time range for {display}: {range}")]
    InconsistentRange {
        /// Display of the tool
        display: String,
        /// Textual range
        range: String,
    },
}

/// Main error type
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup error
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Estimation error
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a stale entity error
    pub fn stale(entity: impl Into<String>, id: impl ToString) -> Self {
        Error::Lookup(LookupError::Stale {
            entity: entity.into(),
            id: id.to_string(),
        })
    }

    /// Check if the error reports a stale entity
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::Lookup(LookupError::Stale { .. }))
    }

    /// Check if this is a broken engine invariant
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::Estimation(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::stale("machine", 4);
        assert_eq!(err.to_string(), "Stale machine 4");
        assert!(err.is_stale());

        let err: Error = EstimationError::ProgressUnavailable {
            tool_number: "12".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Machine module progress unavailable for tool 12"
        );
        assert!(err.is_invariant_violation());
        assert!(!err.is_stale());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));

        let err: Error = LookupError::Store {
            reason: "closed".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Store error: closed");
    }
}
