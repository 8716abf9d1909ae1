//! Forecast outcome

use chrono::{DateTime, TimeDelta, Utc};

/// Why a forecast is not available yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingHint {
    /// Date/time up to which the machine data was processed
    pub detection_date_time: Option<DateTime<Utc>>,
    /// Suggested delay before asking again
    pub retry_after: TimeDelta,
}

/// Result kind of a forecast request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Complete answer
    Final(T),
    /// The machine has no tool life at all
    NoData,
    /// The computation budget was exceeded, try again
    Timeout,
    /// The request does not apply to this machine
    NotApplicable,
    /// The machine data is lagging, try again later
    Pending(PendingHint),
}

impl<T> Outcome<T> {
    /// Is it a complete answer?
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }

    /// The answer, if complete
    pub fn as_final(&self) -> Option<&T> {
        match self {
            Self::Final(value) => Some(value),
            _ => None,
        }
    }

    /// Consume into the answer, if complete
    pub fn into_final(self) -> Option<T> {
        match self {
            Self::Final(value) => Some(value),
            _ => None,
        }
    }

    /// Should the caller ask again later?
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Pending(_))
    }

    /// May the outcome be cached?
    pub fn is_cacheable(&self) -> bool {
        !self.is_retryable()
    }

    /// Transform the complete answer
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Final(value) => Outcome::Final(f(value)),
            Self::NoData => Outcome::NoData,
            Self::Timeout => Outcome::Timeout,
            Self::NotApplicable => Outcome::NotApplicable,
            Self::Pending(hint) => Outcome::Pending(hint),
        }
    }

    /// Short name, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Final(_) => "final",
            Self::NoData => "no_data",
            Self::Timeout => "timeout",
            Self::NotApplicable => "not_applicable",
            Self::Pending(_) => "pending",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kinds() {
        let outcome: Outcome<u32> = Outcome::Final(3);
        assert!(outcome.is_final());
        assert!(outcome.is_cacheable());
        assert_eq!(outcome.clone().map(|v| v * 2).into_final(), Some(6));

        let timeout: Outcome<u32> = Outcome::Timeout;
        assert!(timeout.is_retryable());
        assert!(!timeout.is_cacheable());
        assert_eq!(timeout.as_final(), None);

        let pending: Outcome<u32> = Outcome::Pending(PendingHint {
            detection_date_time: None,
            retry_after: TimeDelta::minutes(3),
        });
        assert_eq!(pending.kind(), "pending");
        assert!(!pending.is_cacheable());
        assert!(Outcome::<u32>::NoData.is_cacheable());
    }
}
