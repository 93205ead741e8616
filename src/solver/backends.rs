//! `good_lp` backed solvers

use good_lp::constraint::{self, ConstraintReference};
use good_lp::{variable, Expression, ProblemVariables, ResolutionError, SolverModel, Variable as LpVariable};

use super::{RawSolution, SolveRequest, SolverBackend, SolverCapabilities};
use crate::error::{ModelError, Result};
use crate::model::{Domain, LinearExpr, OptimizationModel, Relation};

fn variables(model: &OptimizationModel) -> (ProblemVariables, Vec<LpVariable>) {
    let mut vars = ProblemVariables::new();
    let handles = model
        .variables()
        .iter()
        .map(|v| {
            let mut definition = variable().name(v.name.clone()).min(v.lower);
            if let Some(upper) = v.upper {
                definition = definition.max(upper);
            }
            definition = match v.domain {
                Domain::Continuous => definition,
                Domain::Binary => definition.binary(),
            };
            vars.add(definition)
        })
        .collect();
    (vars, handles)
}

fn expression(expr: &LinearExpr, handles: &[LpVariable]) -> Expression {
    let mut out = Expression::from(expr.constant_value());
    for (var, coef) in expr.terms() {
        out += *coef * handles[var.index()];
    }
    out
}

fn add_constraints<M: SolverModel>(
    problem: &mut M,
    model: &OptimizationModel,
    handles: &[LpVariable],
) -> Vec<ConstraintReference> {
    model
        .constraints()
        .iter()
        .map(|c| {
            let lhs = expression(&c.expr, handles);
            let constraint = match c.relation {
                Relation::Eq => constraint::eq(lhs, c.rhs),
                Relation::Le => constraint::leq(lhs, c.rhs),
                Relation::Ge => constraint::geq(lhs, c.rhs),
            };
            problem.add_constraint(constraint)
        })
        .collect()
}

fn map_error(solver: &str, err: ResolutionError) -> ModelError {
    match err {
        ResolutionError::Infeasible => ModelError::Infeasible,
        ResolutionError::Unbounded => ModelError::Solver {
            solver: solver.to_string(),
            message: "problem is unbounded".into(),
        },
        other => ModelError::Solver {
            solver: solver.to_string(),
            message: other.to_string(),
        },
    }
}

/// Interior point LP solver; reports constraint duals.
#[cfg(feature = "clarabel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelBackend;

#[cfg(feature = "clarabel")]
impl SolverBackend for ClarabelBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn capabilities(&self) -> SolverCapabilities {
        SolverCapabilities {
            integers: false,
            duals: true,
        }
    }

    fn solve(&self, model: &OptimizationModel, request: &SolveRequest) -> Result<RawSolution> {
        use ::clarabel::solver::SolverStatus;
        use good_lp::solvers::clarabel::clarabel;
        use good_lp::solvers::{DualValues, SolutionWithDual};
        use good_lp::Solution;

        let (vars, handles) = variables(model);
        let mut problem = vars
            .minimise(expression(model.objective(), &handles))
            .using(clarabel);
        let references = add_constraints(&mut problem, model, &handles);
        let mut solution = problem.solve().map_err(|e| map_error(self.name(), e))?;
        // good_lp hands dual infeasible (unbounded) runs back as solutions
        if matches!(
            solution.inner().status,
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible
        ) {
            return Err(map_error(self.name(), ResolutionError::Unbounded));
        }

        let primal = handles.iter().map(|h| solution.value(*h)).collect();
        let duals = request.duals.then(|| {
            let duals = solution.compute_dual();
            references.iter().map(|c| duals.dual(c.clone())).collect()
        });
        Ok(RawSolution { primal, duals })
    }
}

/// Pure Rust simplex with branch and bound for binaries; no duals.
#[cfg(feature = "microlp")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

#[cfg(feature = "microlp")]
impl SolverBackend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn capabilities(&self) -> SolverCapabilities {
        SolverCapabilities {
            integers: true,
            duals: false,
        }
    }

    fn solve(&self, model: &OptimizationModel, _request: &SolveRequest) -> Result<RawSolution> {
        use good_lp::solvers::microlp::microlp;
        use good_lp::Solution;

        let (vars, handles) = variables(model);
        let mut problem = vars
            .minimise(expression(model.objective(), &handles))
            .using(microlp);
        add_constraints(&mut problem, model, &handles);
        let solution = problem.solve().map_err(|e| map_error(self.name(), e))?;
        Ok(RawSolution {
            primal: handles.iter().map(|h| solution.value(*h)).collect(),
            duals: None,
        })
    }
}
