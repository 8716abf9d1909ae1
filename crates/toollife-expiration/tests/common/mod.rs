//! In-memory collaborators for the forecast tests
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use toollife_core::{
    Collaborators, Error, FixedClock, Machine, MachineId, MachineModule, MachineModuleId,
    MachineRepository, ModuleProgress, Operation, OperationCatalog, OperationId, OperationSlot,
    OperationSlotRepository, ProgressEstimator, ProgressMode, ProgressSnapshot, Range, Result,
    Sequence, ToolLife, ToolLifeEventRepository, ToolLifeRepository, ToolPosition, ToolUnit,
};

pub const MODULE: MachineModuleId = MachineModuleId(1);

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_772_438_400, 0).unwrap()
}

pub fn machine() -> Machine {
    Machine::new(MachineId(1), "Lathe 1")
}

pub fn operation() -> Operation {
    Operation::new(OperationId(10), "OP10")
}

pub fn tool_life(tool_id: &str, tool_number: &str, pot: i32, unit: ToolUnit, value: f64) -> ToolLife {
    ToolLife::new(
        MODULE,
        ToolPosition::new(tool_id, tool_number).with_pot(pot),
        unit,
        value,
    )
}

/// Every collaborator backed by plain data
pub struct Fake {
    pub machine: Option<Machine>,
    pub modules: Vec<MachineModule>,
    pub stale_once: AtomicBool,
    pub tool_lives: Vec<ToolLife>,
    pub lookup_delay: Option<Duration>,
    pub expirations: HashMap<String, DateTime<Utc>>,
    pub operation: Option<Operation>,
    pub detection: Option<DateTime<Utc>>,
    pub operation_tools: BTreeSet<String>,
    pub sequences: Vec<Sequence>,
    pub standard_times: HashMap<u32, TimeDelta>,
    pub cycle_duration: Option<TimeDelta>,
    pub progress: ProgressSnapshot,
    pub estimate_calls: AtomicUsize,
    pub load_modules_calls: AtomicUsize,
    pub find_all_calls: AtomicUsize,
}

impl Default for Fake {
    fn default() -> Self {
        Self {
            machine: Some(machine()),
            modules: vec![MachineModule {
                id: MODULE,
                name: "Main".to_string(),
            }],
            stale_once: AtomicBool::new(false),
            tool_lives: Vec::new(),
            lookup_delay: None,
            expirations: HashMap::new(),
            operation: None,
            detection: None,
            operation_tools: BTreeSet::new(),
            sequences: Vec::new(),
            standard_times: HashMap::new(),
            cycle_duration: None,
            progress: ProgressSnapshot::deactivated(),
            estimate_calls: AtomicUsize::new(0),
            load_modules_calls: AtomicUsize::new(0),
            find_all_calls: AtomicUsize::new(0),
        }
    }
}

impl Fake {
    pub fn with_tools(tool_lives: Vec<ToolLife>) -> Self {
        Self {
            tool_lives,
            ..Self::default()
        }
    }

    /// Current operation with a standard cycle duration
    pub fn running(mut self, operation: Operation, cycle_duration: TimeDelta) -> Self {
        self.operation = Some(operation);
        self.cycle_duration = Some(cycle_duration);
        self
    }

    /// Add a sequence of the operation with its standard time
    pub fn sequence(mut self, id: u32, order: i32, tool_number: &str, standard: TimeDelta) -> Self {
        self.sequences.push(Sequence::new(id, order, tool_number));
        self.standard_times.insert(id, standard);
        self
    }

    /// Progress of the only machine module, in the sequence `current`
    pub fn in_sequence(mut self, current: u32, elapsed: TimeDelta) -> Self {
        let current = self.sequences.iter().find(|s| s.id.0 == current).cloned();
        let standard = current
            .as_ref()
            .and_then(|s| self.standard_times.get(&s.id.0).copied());
        let module = ModuleProgress {
            sequences: self.sequences.clone(),
            current_sequence: current,
            current_sequence_elapsed: Some(elapsed),
            current_sequence_standard_time: standard,
        };
        self.progress.machine_modules = Some(BTreeMap::from([(MODULE, module)]));
        self
    }

    pub fn into_collaborators(self) -> (Arc<Fake>, Collaborators) {
        let fake = Arc::new(self);
        let collaborators = Collaborators {
            machines: fake.clone(),
            tool_lives: fake.clone(),
            tool_life_events: fake.clone(),
            operation_slots: fake.clone(),
            operations: fake.clone(),
            progress: fake.clone(),
            clock: Arc::new(FixedClock(now())),
        };
        (fake, collaborators)
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }

    pub fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }
}

impl MachineRepository for Fake {
    fn find_by_id(&self, id: MachineId) -> Result<Option<Machine>> {
        Ok(self.machine.clone().filter(|m| m.id == id))
    }

    fn load_modules(&self, machine: &Machine) -> Result<Vec<MachineModule>> {
        self.load_modules_calls.fetch_add(1, Ordering::SeqCst);
        if self.stale_once.swap(false, Ordering::SeqCst) {
            return Err(Error::stale("machine", machine.id));
        }
        Ok(self.modules.clone())
    }
}

impl ToolLifeRepository for Fake {
    fn find_all_by_machine(&self, _machine: &Machine) -> Result<Vec<ToolLife>> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            std::thread::sleep(delay);
        }
        Ok(self.tool_lives.clone())
    }
}

impl ToolLifeEventRepository for Fake {
    fn last_expiration(
        &self,
        _machine_module: MachineModuleId,
        tool_id: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self.expirations.get(tool_id).copied())
    }
}

impl OperationSlotRepository for Fake {
    fn last_effective(
        &self,
        _machine: &Machine,
        max_age: TimeDelta,
        at: DateTime<Utc>,
    ) -> Result<Option<OperationSlot>> {
        Ok(self.operation.clone().map(|operation| OperationSlot {
            operation: Some(operation),
            range: Range::half_open(at - max_age / 2, at),
        }))
    }

    fn detection_date_time(&self, _machine: &Machine) -> Result<Option<DateTime<Utc>>> {
        Ok(self.detection)
    }
}

impl OperationCatalog for Fake {
    fn operation_tools(&self, _operation: &Operation) -> Result<BTreeSet<String>> {
        Ok(self.operation_tools.clone())
    }

    fn operation_tool_sequences(
        &self,
        _operation: &Operation,
        tool_number: &str,
    ) -> Result<Vec<Sequence>> {
        Ok(self
            .sequences
            .iter()
            .filter(|s| s.uses_tool(tool_number))
            .cloned()
            .collect())
    }

    fn sequence_standard_time(&self, sequence: &Sequence) -> Option<TimeDelta> {
        self.standard_times.get(&sequence.id.0).copied()
    }

    fn standard_cycle_duration(
        &self,
        _operation: &Operation,
        _machine: &Machine,
    ) -> Option<TimeDelta> {
        self.cycle_duration
    }
}

impl ProgressEstimator for Fake {
    fn estimate(&self, _machine: &Machine, _mode: ProgressMode) -> Result<ProgressSnapshot> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.progress.clone())
    }
}
