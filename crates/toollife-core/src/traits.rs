//! Collaborator interfaces
//!
//! The forecast only reads. Persistence, progress estimation and the wall
//! clock are provided by the host through these traits, which makes the
//! engine testable with in-memory doubles.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::{
    Machine, MachineId, MachineModule, MachineModuleId, Operation, OperationSlot, Sequence,
    ToolLife,
};
use crate::error::Result;
use crate::progress::{ProgressMode, ProgressSnapshot};

/// Machine lookups
pub trait MachineRepository: Send + Sync {
    /// Reload a machine by id
    fn find_by_id(&self, id: MachineId) -> Result<Option<Machine>>;

    /// Load the modules of a machine.
    ///
    /// May fail with a stale error if the machine was changed concurrently.
    fn load_modules(&self, machine: &Machine) -> Result<Vec<MachineModule>>;
}

/// Tool life lookups
pub trait ToolLifeRepository: Send + Sync {
    /// All the tool lives of a machine
    fn find_all_by_machine(&self, machine: &Machine) -> Result<Vec<ToolLife>>;
}

/// Tool life event lookups
pub trait ToolLifeEventRepository: Send + Sync {
    /// Date/time of the last "expiration reached" event of a tool
    fn last_expiration(
        &self,
        machine_module: MachineModuleId,
        tool_id: &str,
    ) -> Result<Option<DateTime<Utc>>>;
}

/// Operation slot lookups
pub trait OperationSlotRepository: Send + Sync {
    /// Most recent effective operation slot not older than `max_age` at `at`
    fn last_effective(
        &self,
        machine: &Machine,
        max_age: TimeDelta,
        at: DateTime<Utc>,
    ) -> Result<Option<OperationSlot>>;

    /// Date/time up to which the operation and cycle data were processed
    fn detection_date_time(&self, _machine: &Machine) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

/// Operation structure lookups
pub trait OperationCatalog: Send + Sync {
    /// Distinct tool numbers used by any sequence of the operation
    fn operation_tools(&self, operation: &Operation) -> Result<BTreeSet<String>>;

    /// Sequences of the operation using the tool number
    fn operation_tool_sequences(
        &self,
        operation: &Operation,
        tool_number: &str,
    ) -> Result<Vec<Sequence>>;

    /// Standard machining time of a sequence
    fn sequence_standard_time(&self, sequence: &Sequence) -> Option<TimeDelta>;

    /// Standard duration of one cycle of the operation on the machine
    fn standard_cycle_duration(&self, operation: &Operation, machine: &Machine)
        -> Option<TimeDelta>;
}

/// Progress estimation
pub trait ProgressEstimator: Send + Sync {
    /// Estimate the progress of the machine with the requested estimator
    fn estimate(&self, machine: &Machine, mode: ProgressMode) -> Result<ProgressSnapshot>;
}

/// Wall clock
pub trait Clock: Send + Sync {
    /// Current UTC date/time
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given date/time
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Every collaborator the forecast needs, shareable across threads
#[derive(Clone)]
pub struct Collaborators {
    /// Machine lookups
    pub machines: Arc<dyn MachineRepository>,
    /// Tool life lookups
    pub tool_lives: Arc<dyn ToolLifeRepository>,
    /// Tool life event lookups
    pub tool_life_events: Arc<dyn ToolLifeEventRepository>,
    /// Operation slot lookups
    pub operation_slots: Arc<dyn OperationSlotRepository>,
    /// Operation structure lookups
    pub operations: Arc<dyn OperationCatalog>,
    /// Progress estimation
    pub progress: Arc<dyn ProgressEstimator>,
    /// Wall clock
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
