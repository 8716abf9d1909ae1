//! Data models for machines, operations and tool lives
//!
//! This module provides:
//! - Machine and machine module identity
//! - Operations with their intermediate work pieces
//! - Sequences (one tool path step of an operation)
//! - Operation slots (time range a machine ran an operation)
//! - Tool life snapshots

pub mod tool_life;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::range::Range;

pub use tool_life::{ToolLife, ToolLifeDirection, ToolPosition, ToolUnit};

/// Machine identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Machine module identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineModuleId(pub u32);

impl fmt::Display for MachineModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(pub u32);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub u32);

/// One module (path, spindle, turret) of a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineModule {
    /// Module identifier
    pub id: MachineModuleId,
    /// Module name
    pub name: String,
}

/// A monitored machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Machine identifier
    pub id: MachineId,
    /// Machine name
    pub name: String,
    /// Is the machine monitored?
    pub monitored: bool,
    /// Machine modules, `None` until they are loaded
    #[serde(default)]
    pub modules: Option<Vec<MachineModule>>,
}

impl Machine {
    /// Create a monitored machine whose modules are not loaded yet
    pub fn new(id: MachineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            monitored: true,
            modules: None,
        }
    }

    /// Are the machine modules loaded?
    pub fn has_modules_loaded(&self) -> bool {
        self.modules.is_some()
    }
}

/// Intermediate work piece made by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateWorkPiece {
    /// Work piece name
    pub name: String,
    /// Number of pieces made in one cycle
    pub quantity: u32,
}

/// An operation (part program) run by a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation identifier
    pub id: OperationId,
    /// Operation name
    pub name: String,
    /// Intermediate work pieces made in one cycle
    #[serde(default)]
    pub intermediate_work_pieces: Vec<IntermediateWorkPiece>,
}

impl Operation {
    /// Create an operation without work pieces
    pub fn new(id: OperationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            intermediate_work_pieces: Vec::new(),
        }
    }

    /// Add an intermediate work piece
    pub fn with_work_piece(mut self, name: impl Into<String>, quantity: u32) -> Self {
        self.intermediate_work_pieces.push(IntermediateWorkPiece {
            name: name.into(),
            quantity,
        });
        self
    }

    /// Total number of intermediate work pieces made in one cycle
    pub fn total_intermediate_work_pieces(&self) -> u32 {
        self.intermediate_work_pieces
            .iter()
            .map(|piece| piece.quantity)
            .sum()
    }
}

/// One step of an operation, machined with a single tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence identifier
    pub id: SequenceId,
    /// Position of the sequence in the cycle
    pub order: i32,
    /// Tool number used by the sequence, if any
    pub tool_number: Option<String>,
    /// Sequence name
    #[serde(default)]
    pub name: String,
}

impl Sequence {
    /// Create a sequence using a tool
    pub fn new(id: u32, order: i32, tool_number: impl Into<String>) -> Self {
        Self {
            id: SequenceId(id),
            order,
            tool_number: Some(tool_number.into()),
            name: String::new(),
        }
    }

    /// Does the sequence use this tool number? (case insensitive)
    pub fn uses_tool(&self, tool_number: &str) -> bool {
        self.tool_number
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(tool_number))
    }
}

/// Time range during which a machine ran an operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSlot {
    /// Operation, `None` for a slot without any operation
    pub operation: Option<Operation>,
    /// UTC date/time range of the slot
    pub range: Range<DateTime<Utc>>,
}
