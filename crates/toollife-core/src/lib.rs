//! # Toollife Core
//!
//! Core types, traits, and utilities for tool life forecasting.
//! Provides range arithmetic, the machine/operation/tool life data
//! models, progress snapshots and the collaborator interfaces the
//! forecast reads through.

pub mod data;
pub mod error;
pub mod progress;
pub mod range;
pub mod traits;

pub use data::{
    IntermediateWorkPiece, Machine, MachineId, MachineModule, MachineModuleId, Operation,
    OperationId, OperationSlot, Sequence, SequenceId, ToolLife, ToolLifeDirection, ToolPosition,
    ToolUnit,
};

pub use error::{Error, EstimationError, LookupError, Result};

pub use progress::{ModuleProgress, ProgressMode, ProgressSnapshot};

pub use range::Range;

pub use traits::{
    Clock, Collaborators, FixedClock, MachineRepository, OperationCatalog,
    OperationSlotRepository, ProgressEstimator, SystemClock, ToolLifeEventRepository,
    ToolLifeRepository,
};
