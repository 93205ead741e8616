//! Solve/result adapter
//!
//! Hands a built model to a named backend, checks that the backend can solve
//! what was asked for, and maps the returned values back onto entities.
//!
//! Backends implement [`SolverBackend`] and are looked up by name in a
//! [`SolverRegistry`]. Built-ins wrap `good_lp`:
//! - `clarabel`: interior point LP solver, reports duals
//! - `microlp`: simplex with branch and bound, supports binaries, no duals

pub mod backends;
pub mod registry;
pub mod results;

pub use backends::*;
pub use registry::*;
pub use results::*;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::energy_system::Simulation;
use crate::error::{ModelError, Result};
use crate::model::OptimizationModel;

/// What a backend can handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverCapabilities {
    /// Integer and binary variables.
    pub integers: bool,
    /// Constraint dual values.
    pub duals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveRequest {
    pub solver: String,
    /// Dump the model before and every primal value after solving.
    pub debug: bool,
    /// Report solver progress at info level.
    pub stream_output: bool,
    pub duals: bool,
}

impl From<&Simulation> for SolveRequest {
    fn from(simulation: &Simulation) -> Self {
        Self {
            solver: simulation.solver().to_string(),
            debug: simulation.debug(),
            stream_output: simulation.stream_solver_output(),
            duals: simulation.duals(),
        }
    }
}

/// Values returned by a backend, indexed like the model's variables and
/// constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSolution {
    pub primal: Vec<f64>,
    pub duals: Option<Vec<f64>>,
}

#[cfg_attr(test, mockall::automock)]
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> SolverCapabilities;

    /// Solves `model`. Infeasibility is reported as [`ModelError::Infeasible`],
    /// every other failure as [`ModelError::Solver`].
    fn solve(&self, model: &OptimizationModel, request: &SolveRequest) -> Result<RawSolution>;
}

/// Runs `backend` on `model` and validates the shape of its answer.
///
/// Blocks until the backend returns; there is no retry.
pub fn run(backend: &dyn SolverBackend, model: &OptimizationModel, request: &SolveRequest) -> Result<RawSolution> {
    let solver = backend.name();
    let capabilities = backend.capabilities();
    let fail = |message: String| ModelError::Solver {
        solver: solver.to_string(),
        message,
    };
    if model.has_integers() && !capabilities.integers {
        return Err(fail("model has binary variables but the solver only handles LPs".into()));
    }
    if request.duals && !capabilities.duals {
        return Err(fail("duals were requested but the solver does not report them".into()));
    }

    if request.debug {
        debug!(solver, model = %model.to_lp_string(), "canonical model");
    }
    if request.stream_output {
        info!(
            solver,
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "solver started"
        );
    }

    let started = Instant::now();
    let outcome = backend.solve(model, request);
    if request.stream_output {
        let status = match &outcome {
            Ok(_) => "optimal",
            Err(ModelError::Infeasible) => "infeasible",
            Err(_) => "error",
        };
        info!(solver, status, elapsed_ms = started.elapsed().as_millis() as u64, "solver finished");
    }
    let solution = outcome?;

    if solution.primal.len() != model.variables().len() {
        return Err(fail(format!(
            "malformed result: {} primal values for {} variables",
            solution.primal.len(),
            model.variables().len()
        )));
    }
    if solution.primal.iter().any(|v| !v.is_finite()) {
        return Err(fail("malformed result: non-finite primal value".into()));
    }
    match (&solution.duals, request.duals) {
        (Some(duals), true) if duals.len() != model.constraints().len() => {
            return Err(fail(format!(
                "malformed result: {} duals for {} constraints",
                duals.len(),
                model.constraints().len()
            )));
        }
        (None, true) => return Err(fail("malformed result: duals missing".into())),
        _ => {}
    }

    if request.debug {
        for (variable, value) in model.variables().iter().zip(&solution.primal) {
            debug!(solver, variable = %variable.name, value, "primal value");
        }
    }
    Ok(solution)
}
