//! Tool lives by machine request
//!
//! Entry point of the forecast. Loads the machine context through the
//! collaborators, runs the estimators within the timeout budget and
//! assembles the ordered response.

use chrono::TimeDelta;

use toollife_core::{Collaborators, Error, LookupError, Machine, MachineRepository, Result};
use toollife_settings::{ConfigSet, ExpirationOverrides, ExpirationSettings};

use crate::assembly::{
    complete_expiration_date_time, complete_expired_warning_status, create_responses,
    filter_with_max_expiration_time, select_tool_lives, summary,
};
use crate::budget::{Halt, TimeoutBudget};
use crate::by_cycle::{self, set_remaining_time_if_by_cycle};
use crate::by_duration::{self, set_remaining_time_if_by_duration};
use crate::context::{ForecastContext, ProgressMemo};
use crate::grouping::{create_groups, set_sister_tool_properties};
use crate::ordering::sort_tools;
use crate::outcome::{Outcome, PendingHint};
use crate::response::ToolLivesByMachineResponse;

/// Prefix of the cache keys of this request
pub const CACHE_KEY_PREFIX: &str = "Business.Tool.ToolLivesByMachine";

/// Forecast of the tool expirations of one machine
#[derive(Debug, Clone)]
pub struct ToolLivesByMachine {
    machine: Machine,
    max_expiration_time: Option<TimeDelta>,
    overrides: ExpirationOverrides,
}

impl ToolLivesByMachine {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            max_expiration_time: None,
            overrides: ExpirationOverrides::default(),
        }
    }

    /// Only keep the tools that may expire within `max`
    pub fn with_max_expiration_time(mut self, max: TimeDelta) -> Self {
        self.max_expiration_time = Some(max);
        self
    }

    /// Override the configuration for this request only
    pub fn with_overrides(mut self, overrides: ExpirationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn max_expiration_time(&self) -> Option<TimeDelta> {
        self.max_expiration_time
    }

    /// Settings of this request: overrides, then `config`, then defaults
    pub fn settings(&self, config: &ConfigSet) -> Result<ExpirationSettings> {
        Ok(ExpirationSettings::resolve(config, &self.overrides)?)
    }

    /// Cache key, unique per machine and max expiration time
    pub fn cache_key(&self) -> String {
        match self.max_expiration_time {
            Some(max) => format!(
                "{}.{}?MaxExpirationTime={}",
                CACHE_KEY_PREFIX,
                self.machine.id,
                max.num_seconds()
            ),
            None => format!("{}.{}", CACHE_KEY_PREFIX, self.machine.id),
        }
    }

    /// Cache timeout of a response: up to the next expiration, capped by the
    /// short timeout, or the long timeout if nothing is about to expire
    pub fn cache_timeout(
        response: &ToolLivesByMachineResponse,
        settings: &ExpirationSettings,
    ) -> TimeDelta {
        let nearest = response
            .tools
            .iter()
            .filter(|t| !t.expired)
            .filter_map(|t| t.remaining_time.or_else(|| t.remaining_time_range.lower()))
            .min();
        match nearest {
            Some(nearest) => settings
                .cache_timeout_short
                .min(nearest.max(TimeDelta::zero())),
            None => settings.cache_timeout_long,
        }
    }

    /// Cache timeout of an outcome, `None` if it must not be cached
    pub fn outcome_cache_timeout(
        outcome: &Outcome<ToolLivesByMachineResponse>,
        settings: &ExpirationSettings,
    ) -> Option<TimeDelta> {
        match outcome {
            Outcome::Final(response) => Some(Self::cache_timeout(response, settings)),
            Outcome::NoData | Outcome::NotApplicable => Some(settings.cache_timeout_short),
            Outcome::Timeout | Outcome::Pending(_) => None,
        }
    }

    /// Run the forecast
    pub fn get(
        &self,
        collaborators: &Collaborators,
        config: &ConfigSet,
    ) -> Result<Outcome<ToolLivesByMachineResponse>> {
        let settings = self.settings(config)?;
        self.get_with_settings(collaborators, &settings)
    }

    /// Run the forecast with already resolved settings
    pub fn get_with_settings(
        &self,
        collaborators: &Collaborators,
        settings: &ExpirationSettings,
    ) -> Result<Outcome<ToolLivesByMachineResponse>> {
        let span = tracing::info_span!("tool_lives_by_machine", machine_id = %self.machine.id);
        let _enter = span.enter();

        let budget = TimeoutBudget::start(settings.timeout_budget);
        match self.compute(collaborators, settings, &budget) {
            Ok(outcome) => {
                tracing::debug!(
                    kind = outcome.kind(),
                    elapsed_ms = budget.elapsed().as_millis() as u64,
                    "Forecast completed"
                );
                Ok(outcome)
            }
            Err(Halt::Timeout) => {
                tracing::warn!(
                    limit_ms = budget.limit().as_millis() as u64,
                    "Forecast timeout"
                );
                Ok(Outcome::Timeout)
            }
            Err(Halt::Failed(err)) => {
                tracing::error!(error = %err, "Forecast failed");
                Err(err)
            }
        }
    }

    /// Run the forecast on the blocking thread pool
    pub async fn get_async(
        &self,
        collaborators: Collaborators,
        config: ConfigSet,
    ) -> Result<Outcome<ToolLivesByMachineResponse>> {
        let request = self.clone();
        tokio::task::spawn_blocking(move || request.get(&collaborators, &config))
            .await
            .map_err(|e| Error::other(format!("Forecast task failed: {}", e)))?
    }

    fn compute(
        &self,
        collaborators: &Collaborators,
        settings: &ExpirationSettings,
        budget: &TimeoutBudget,
    ) -> std::result::Result<Outcome<ToolLivesByMachineResponse>, Halt> {
        let machine = self.initialize_machine(collaborators.machines.as_ref())?;
        if !machine.monitored || machine.modules.as_ref().is_none_or(Vec::is_empty) {
            tracing::debug!("Machine not monitored or without any module");
            return Ok(Outcome::NotApplicable);
        }

        let now = collaborators.clock.now();

        if let Some(max_lag) = settings.detection_max_lag {
            if let Some(watermark) = collaborators.operation_slots.detection_date_time(&machine)? {
                if max_lag < now - watermark {
                    tracing::info!(%watermark, "Machine data is lagging");
                    return Ok(Outcome::Pending(PendingHint {
                        detection_date_time: Some(watermark),
                        retry_after: settings.cache_timeout_short,
                    }));
                }
            }
        }
        budget.check("machine")?;

        let operation = collaborators
            .operation_slots
            .last_effective(&machine, settings.effective_operation_max_age, now)?
            .and_then(|slot| slot.operation);

        let tool_lives = collaborators.tool_lives.find_all_by_machine(&machine)?;
        if tool_lives.is_empty() {
            tracing::debug!("No tool life");
            return Ok(Outcome::NoData);
        }

        let ctx = ForecastContext {
            collaborators,
            settings,
            machine: &machine,
            operation: operation.as_ref(),
            now,
            max_expiration_time: self.max_expiration_time,
            budget,
        };

        let tool_lives = select_tool_lives(&ctx, tool_lives)?;
        let mut tools = create_responses(tool_lives);
        complete_expired_warning_status(&ctx, &mut tools)?;
        set_sister_tool_properties(&mut tools, budget)?;

        let mut progress = ProgressMemo::new();
        if by_cycle::applies(&tools) {
            set_remaining_time_if_by_cycle(&ctx, &mut tools, &mut progress)?;
        }
        if operation.is_some() && by_duration::applies(&tools) {
            set_remaining_time_if_by_duration(&ctx, &mut tools, &mut progress)?;
        }
        budget.check("estimates")?;

        if let Some(max) = self.max_expiration_time {
            filter_with_max_expiration_time(&mut tools, max);
        }
        create_groups(&mut tools, budget)?;
        complete_expiration_date_time(now, &mut tools);

        let (expired, warning, min_remaining_time) = summary(&tools);
        sort_tools(&mut tools, settings.valid_sister_tools_ordering);

        Ok(Outcome::Final(ToolLivesByMachineResponse {
            machine_id: machine.id,
            operation,
            tools,
            date_time: now,
            expired,
            warning,
            min_remaining_time,
        }))
    }

    /// The machine with its modules, reloaded once if it is stale
    fn initialize_machine(
        &self,
        machines: &dyn MachineRepository,
    ) -> std::result::Result<Machine, Halt> {
        if self.machine.has_modules_loaded() {
            return Ok(self.machine.clone());
        }

        let mut machine = self.machine.clone();
        match machines.load_modules(&machine) {
            Ok(modules) => machine.modules = Some(modules),
            Err(err) if err.is_stale() => {
                tracing::warn!(error = %err, "Stale machine, reload it");
                let Some(mut reloaded) = machines.find_by_id(machine.id)? else {
                    return Err(LookupError::NotFound {
                        entity: "machine".to_string(),
                        id: machine.id.to_string(),
                    }
                    .into());
                };
                reloaded.modules = Some(machines.load_modules(&reloaded)?);
                machine = reloaded;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(machine)
    }
}
