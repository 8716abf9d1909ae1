//! Computation budget
//!
//! A forecast is cooperative: the budget is checked between loop iterations
//! and stages, and exceeding it stops the forecast with [`Halt::Timeout`].

use std::time::{Duration, Instant};

use toollife_core::{Error, EstimationError, LookupError};

/// Why a forecast stopped before completion
#[derive(thiserror::Error, Debug)]
pub enum Halt {
    /// The computation budget is exceeded
    #[error("Forecast timeout")]
    Timeout,

    /// A collaborator or an invariant failed
    #[error(transparent)]
    Failed(#[from] Error),
}

impl From<LookupError> for Halt {
    fn from(err: LookupError) -> Self {
        Halt::Failed(err.into())
    }
}

impl From<EstimationError> for Halt {
    fn from(err: EstimationError) -> Self {
        Halt::Failed(err.into())
    }
}

/// Elapsed time limit of one forecast
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBudget {
    started: Instant,
    limit: Duration,
}

impl TimeoutBudget {
    /// Start counting now
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Time spent since the start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Configured limit
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Is the budget exhausted? A zero budget is always exhausted.
    pub fn is_exceeded(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// Stop with [`Halt::Timeout`] once the budget is exhausted
    pub fn check(&self, stage: &'static str) -> Result<(), Halt> {
        if self.is_exceeded() {
            tracing::debug!(
                stage,
                elapsed_ms = self.elapsed().as_millis() as u64,
                limit_ms = self.limit.as_millis() as u64,
                "Timeout budget exceeded"
            );
            return Err(Halt::Timeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_times_out() {
        let budget = TimeoutBudget::start(Duration::ZERO);
        assert!(budget.is_exceeded());
        assert!(matches!(budget.check("test"), Err(Halt::Timeout)));
    }

    #[test]
    fn test_budget_within_limit() {
        let budget = TimeoutBudget::start(Duration::from_secs(60));
        assert!(budget.check("test").is_ok());
        assert_eq!(budget.limit(), Duration::from_secs(60));
    }

    #[test]
    fn test_halt_conversion() {
        let halt: Halt = EstimationError::ProgressUnavailable {
            tool_number: "3".into(),
        }
        .into();
        assert!(matches!(halt, Halt::Failed(ref e) if e.is_invariant_violation()));
        assert_eq!(
            halt.to_string(),
            "Machine module progress unavailable for tool 3"
        );
    }
}
