//! # Toollife
//!
//! Tool life expiration forecasting for machine tools:
//! - Expired and warning tools, with the date of the last expiration
//! - Sister tool groups, active tool and next tool
//! - Remaining time from cycle, part or use counters
//! - Remaining time from machining time counters, refined by the machine progress
//!
//! ## Architecture
//!
//! Toollife is organized as a workspace with multiple crates:
//!
//! 1. **toollife-core** - Ranges, data model, collaborator traits, errors
//! 2. **toollife-settings** - Configuration set and expiration settings
//! 3. **toollife-expiration** - Forecast engine, request wrapper and cache
//! 4. **toollife** - Facade that re-exports the crates and sets up logging
//!
//! ## Example
//!
//! ```no_run
//! use toollife::{Collaborators, ConfigSet, Machine, MachineId, ToolLivesByMachine};
//!
//! fn forecast(collaborators: &Collaborators) -> anyhow::Result<()> {
//!     let config = ConfigSet::load_default()?;
//!     let request = ToolLivesByMachine::new(Machine::new(MachineId(1), "Lathe 1"));
//!     if let Some(response) = request.get(collaborators, &config)?.into_final() {
//!         for tool in &response.tools {
//!             println!("{} expires at {:?}", tool.display, tool.expiration_date_time);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub use toollife_core::{
    data, Clock, Collaborators, Error, EstimationError, FixedClock, LookupError, Machine,
    MachineId, MachineModule, MachineModuleId, MachineRepository, ModuleProgress, Operation,
    OperationCatalog, OperationId, OperationSlot, OperationSlotRepository, ProgressEstimator,
    ProgressMode, ProgressSnapshot, Range, Result, Sequence, SystemClock, ToolLife,
    ToolLifeDirection, ToolLifeEventRepository, ToolLifeRepository, ToolPosition, ToolUnit,
};

pub use toollife_settings::{
    keys, ConfigSet, ExpirationOverrides, ExpirationSettings, SettingsError, SisterToolsOrdering,
};

pub use toollife_expiration::{
    ForecastCache, Halt, Outcome, PendingHint, TimeoutBudget, ToolLifeResponse,
    ToolLivesByMachine, ToolLivesByMachineResponse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
/// - INFO level by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Initialize logging as JSON lines, for services whose logs are collected
pub fn init_logging_json() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let fmt_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
}
