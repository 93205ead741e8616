use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::PathBuf;

use crate::energy_system::SimulationSettings;

/// Runtime configuration of the command line tool.
///
/// Read from `config/default.toml`, overridden by `OEM__`-prefixed
/// environment variables (`OEM__SOLVER__NAME=microlp`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    pub path: PathBuf,
    /// Overrides the scenario's reference year.
    #[serde(default)]
    pub year: Option<i32>,
}

/// Solver settings; unset values keep what the scenario says.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverConfig {
    pub name: Option<String>,
    pub duals: Option<bool>,
    pub debug: Option<bool>,
    pub stream_output: Option<bool>,
}

impl SolverConfig {
    pub fn apply(&self, settings: &mut SimulationSettings) {
        if let Some(name) = &self.name {
            settings.solver = name.clone();
        }
        if let Some(duals) = self.duals {
            settings.duals = duals;
        }
        if let Some(debug) = self.debug {
            settings.debug = debug;
        }
        if let Some(stream) = self.stream_output {
            settings.stream_solver_output = stream;
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::file("config/default.toml")))
    }

    fn from_figment(base: Figment) -> Result<Self> {
        let figment = base.merge(Env::prefixed("OEM__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_solver_overrides_only_set_values() {
        let mut settings = SimulationSettings {
            solver: "clarabel".into(),
            debug: false,
            stream_solver_output: false,
            duals: false,
            objective_options: Default::default(),
            start: Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap(),
            periods: 3,
            resolution_minutes: 60,
        };
        let overrides = SolverConfig {
            name: Some("microlp".into()),
            duals: None,
            debug: Some(true),
            stream_output: None,
        };
        overrides.apply(&mut settings);
        assert_eq!(settings.solver, "microlp");
        assert!(settings.debug);
        assert!(!settings.duals);
        assert!(!settings.stream_solver_output);
    }

    #[test]
    fn test_config_from_toml() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [scenario]
            path = "scenarios/simple.toml"
            year = 2030

            [solver]
            duals = true
            "#,
        ));
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.scenario.path, PathBuf::from("scenarios/simple.toml"));
        assert_eq!(config.scenario.year, Some(2030));
        assert_eq!(config.solver.duals, Some(true));
        assert!(config.solver.name.is_none());
    }
}
