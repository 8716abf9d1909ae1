//! Per request computation context

use chrono::{DateTime, TimeDelta, Utc};

use toollife_core::{Collaborators, Machine, Operation, ProgressMode, ProgressSnapshot, Result};
use toollife_settings::ExpirationSettings;

use crate::budget::TimeoutBudget;

/// Everything a forecast step reads, fixed for one request
pub(crate) struct ForecastContext<'a> {
    pub collaborators: &'a Collaborators,
    pub settings: &'a ExpirationSettings,
    pub machine: &'a Machine,
    pub operation: Option<&'a Operation>,
    pub now: DateTime<Utc>,
    pub max_expiration_time: Option<TimeDelta>,
    pub budget: &'a TimeoutBudget,
}

/// Progress of the machine, estimated at most once per request
#[derive(Debug, Default)]
pub(crate) struct ProgressMemo {
    snapshot: Option<ProgressSnapshot>,
}

impl ProgressMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress of the configured estimator, an empty progress without estimator
    pub fn get(&mut self, ctx: &ForecastContext<'_>) -> Result<&ProgressSnapshot> {
        if self.snapshot.is_none() {
            let snapshot = match ctx.settings.progress_mode {
                ProgressMode::None => ProgressSnapshot::deactivated(),
                mode => {
                    tracing::debug!(%mode, "Estimate the machine progress");
                    ctx.collaborators.progress.estimate(ctx.machine, mode)?
                }
            };
            self.snapshot = Some(snapshot);
        }
        Ok(&*self
            .snapshot
            .get_or_insert_with(ProgressSnapshot::deactivated))
    }
}
