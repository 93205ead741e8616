use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::error::{ModelError, Result};
use crate::network::EntityKind;

/// Predefined objective functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectiveFunction {
    /// Total system cost: operation, emissions, slack penalties and annuities.
    #[default]
    MinimizeCost,
    /// No cost terms; any dispatch satisfying the balances is optimal.
    BalanceOnly,
}

/// Selects which cost and revenue terms enter the objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ObjectiveOptions {
    pub function: ObjectiveFunction,
    /// Entity kinds whose cost terms are included. `None` includes all.
    pub cost_objects: Option<Vec<EntityKind>>,
    /// Entity kinds whose revenue terms are included. `None` includes all.
    pub revenue_objects: Option<Vec<EntityKind>>,
    /// Price per unit of emitted CO2.
    pub co2_price: f64,
}

impl ObjectiveOptions {
    pub fn balance_only() -> Self {
        Self {
            function: ObjectiveFunction::BalanceOnly,
            ..Default::default()
        }
    }

    pub fn includes_costs(&self, kind: EntityKind) -> bool {
        self.function == ObjectiveFunction::MinimizeCost
            && self.cost_objects.as_ref().map_or(true, |k| k.contains(&kind))
    }

    pub fn includes_revenues(&self, kind: EntityKind) -> bool {
        self.function == ObjectiveFunction::MinimizeCost
            && self.revenue_objects.as_ref().map_or(true, |k| k.contains(&kind))
    }
}

fn default_solver() -> String {
    "clarabel".into()
}

fn default_resolution() -> i64 {
    60
}

/// Deserializable simulation settings, e.g. the `[simulation]` table of a
/// scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    #[serde(default = "default_solver")]
    #[validate(length(min = 1))]
    pub solver: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub stream_solver_output: bool,
    #[serde(default)]
    pub duals: bool,
    #[serde(default)]
    pub objective_options: ObjectiveOptions,
    pub start: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub periods: usize,
    #[serde(default = "default_resolution")]
    #[validate(range(min = 1))]
    pub resolution_minutes: i64,
}

/// Solver and horizon configuration, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    solver: String,
    debug: bool,
    stream_solver_output: bool,
    duals: bool,
    objective_options: ObjectiveOptions,
    timesteps: Vec<DateTime<Utc>>,
}

impl Simulation {
    /// Fails when `timesteps` is empty.
    pub fn new(timesteps: Vec<DateTime<Utc>>) -> Result<Self> {
        if timesteps.is_empty() {
            return Err(ModelError::Configuration("No timesteps defined".into()));
        }
        Ok(Self {
            solver: default_solver(),
            debug: false,
            stream_solver_output: false,
            duals: false,
            objective_options: ObjectiveOptions::default(),
            timesteps,
        })
    }

    /// `periods` hourly timesteps starting at `start`.
    pub fn hourly(start: DateTime<Utc>, periods: usize) -> Result<Self> {
        Self::new(regular(start, periods, Duration::hours(1)))
    }

    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = solver.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_stream_solver_output(mut self, stream: bool) -> Self {
        self.stream_solver_output = stream;
        self
    }

    pub fn with_duals(mut self, duals: bool) -> Self {
        self.duals = duals;
        self
    }

    pub fn with_objective_options(mut self, options: ObjectiveOptions) -> Self {
        self.objective_options = options;
        self
    }

    pub fn solver(&self) -> &str {
        &self.solver
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn stream_solver_output(&self) -> bool {
        self.stream_solver_output
    }

    pub fn duals(&self) -> bool {
        self.duals
    }

    pub fn objective_options(&self) -> &ObjectiveOptions {
        &self.objective_options
    }

    pub fn timesteps(&self) -> &[DateTime<Utc>] {
        &self.timesteps
    }

    pub fn horizon(&self) -> usize {
        self.timesteps.len()
    }
}

impl TryFrom<SimulationSettings> for Simulation {
    type Error = ModelError;

    fn try_from(settings: SimulationSettings) -> Result<Self> {
        settings.validate()?;
        let step = Duration::minutes(settings.resolution_minutes);
        Ok(Self::new(regular(settings.start, settings.periods, step))?
            .with_solver(settings.solver)
            .with_debug(settings.debug)
            .with_stream_solver_output(settings.stream_solver_output)
            .with_duals(settings.duals)
            .with_objective_options(settings.objective_options))
    }
}

fn regular(start: DateTime<Utc>, periods: usize, step: Duration) -> Vec<DateTime<Utc>> {
    (0..periods)
        .scan(start, |t, _| {
            let current = *t;
            *t = current + step;
            Some(current)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_simulation_requires_timesteps() {
        let err = Simulation::new(Vec::new()).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Configuration);
    }

    #[test]
    fn test_hourly_timesteps() {
        let sim = Simulation::hourly(start(), 3).unwrap();
        assert_eq!(sim.horizon(), 3);
        assert_eq!(sim.timesteps()[2], start() + Duration::hours(2));
        assert_eq!(sim.solver(), "clarabel");
        assert!(!sim.duals());
    }

    #[test]
    fn test_settings_are_validated() {
        let settings = SimulationSettings {
            solver: "microlp".into(),
            debug: true,
            stream_solver_output: false,
            duals: false,
            objective_options: ObjectiveOptions::balance_only(),
            start: start(),
            periods: 0,
            resolution_minutes: 15,
        };
        assert!(Simulation::try_from(settings.clone()).is_err());

        let sim = Simulation::try_from(SimulationSettings { periods: 4, ..settings }).unwrap();
        assert_eq!(sim.solver(), "microlp");
        assert!(sim.debug());
        assert_eq!(sim.timesteps()[1] - sim.timesteps()[0], Duration::minutes(15));
    }

    #[test]
    fn test_cost_object_filter() {
        let options = ObjectiveOptions {
            cost_objects: Some(vec![EntityKind::Source]),
            ..Default::default()
        };
        assert!(options.includes_costs(EntityKind::Source));
        assert!(!options.includes_costs(EntityKind::Simple));
        assert!(options.includes_revenues(EntityKind::Simple));
        assert!(!ObjectiveOptions::balance_only().includes_costs(EntityKind::Source));
    }
}
