use std::time::Duration;

use serde::Serialize;

use super::RawSolution;
use crate::components::ComponentResults;
use crate::model::{BuiltModel, FlowKey, VarId};
use crate::network::{BusResults, EntityGraph};

/// Outcome of the last successful solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveSummary {
    pub solver: String,
    pub objective: f64,
    pub variables: usize,
    pub constraints: usize,
    pub milp: bool,
    pub timesteps: usize,
    pub wall_time_ms: u64,
}

impl SolveSummary {
    pub(crate) fn new(solver: &str, built: &BuiltModel, solution: &RawSolution, elapsed: Duration) -> Self {
        Self {
            solver: solver.to_string(),
            objective: built.model.objective().evaluate(&solution.primal),
            variables: built.model.variables().len(),
            constraints: built.model.constraints().len(),
            milp: built.model.has_integers(),
            timesteps: built.horizon,
            wall_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Writes primal and dual values back onto the entities of `graph`.
///
/// Every vector is aligned with the simulation timesteps; storage state of
/// charge is reported at the end of each timestep.
pub(crate) fn write_back(graph: &mut EntityGraph, built: &BuiltModel, solution: &RawSolution) {
    let index = &built.index;
    let values = |vars: &[VarId]| -> Vec<f64> { vars.iter().map(|v| solution.primal[v.index()]).collect() };
    let duals = |key: &FlowKey| -> Option<Vec<f64>> {
        let duals = solution.duals.as_ref()?;
        let ids = index.capacities.get(key)?;
        Some(ids.iter().map(|c| duals[c.index()]).collect())
    };

    for component in graph.components_mut() {
        let uid = component.uid().to_string();
        let mut results = ComponentResults::default();
        for bus in component.inputs() {
            if let Some(vars) = index.flow(bus, &uid) {
                results.inputs.insert(bus.clone(), values(vars));
            }
        }
        for bus in component.outputs() {
            let key = FlowKey::new(uid.as_str(), bus.as_str());
            if let Some(vars) = index.flows.get(&key) {
                results.outputs.insert(bus.clone(), values(vars.as_slice()));
            }
            if let Some(duals) = duals(&key) {
                results.capacity_duals.insert(bus.clone(), duals);
            }
        }
        results.soc = index.soc.get(&uid).map(|vars| values(&vars[1..]));
        results.status = index.status.get(&uid).map(|vars| values(vars.as_slice()));
        results.invest = index.invest.get(&uid).map(|v| solution.primal[v.index()]);
        *component.results_mut() = results;
    }

    for bus in graph.buses_mut() {
        let uid = bus.uid().to_string();
        let results = BusResults {
            duals: solution.duals.as_ref().and_then(|duals| {
                index
                    .balances
                    .get(&uid)
                    .map(|ids| ids.iter().map(|c| duals[c.index()]).collect())
            }),
            excess: index.excess.get(&uid).map(|vars| values(vars.as_slice())),
            shortage: index.shortage.get(&uid).map(|vars| values(vars.as_slice())),
        };
        *bus.results_mut() = results;
    }
}
