//! # Toollife Expiration
//!
//! Forecast of the tool expirations of a machine.
//!
//! For each tool life of the machine: is it expired, in warning, and when
//! will it expire. Sister tools (backup tools sharing a tool number) are
//! grouped, the active one is identified and a group aggregate is added.
//! Remaining times are estimated from the remaining cycles, parts or uses,
//! or from the remaining machining time, with the standard cycle duration
//! of the current operation and the progress of the machine.
//!
//! The entry point is [`ToolLivesByMachine`]. [`ForecastCache`] caches its
//! outcomes.

mod assembly;
mod by_cycle;
mod by_duration;
mod classify;
mod context;
mod grouping;
mod ordering;

pub mod budget;
pub mod cache;
pub mod outcome;
pub mod request;
pub mod response;

pub use budget::{Halt, TimeoutBudget};
pub use cache::ForecastCache;
pub use outcome::{Outcome, PendingHint};
pub use request::ToolLivesByMachine;
pub use response::{ToolLifeResponse, ToolLivesByMachineResponse};
