use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{ConstraintFamily, ConstraintId, FlowKey, LinearExpr, ModelIndex, OptimizationModel, Relation, VarId};
use crate::components::{Component, ComponentType, Technology};
use crate::energy_system::Simulation;
use crate::error::{ModelError, Result};
use crate::network::{EntityGraph, EntityKind};

/// An assembled model together with the lookup tables needed to map solver
/// values back onto entities.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: OptimizationModel,
    pub index: ModelIndex,
    pub horizon: usize,
}

/// Translates `graph` into an optimization model over the timesteps of
/// `simulation`.
pub fn build_model(graph: &EntityGraph, simulation: &Simulation) -> Result<BuiltModel> {
    ModelBuilder::new(graph, simulation).build()
}

pub(crate) struct ModelBuilder<'a> {
    pub(super) graph: &'a EntityGraph,
    pub(super) simulation: &'a Simulation,
    pub(super) model: OptimizationModel,
    pub(super) index: ModelIndex,
    pub(super) horizon: usize,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(graph: &'a EntityGraph, simulation: &'a Simulation) -> Self {
        Self {
            graph,
            simulation,
            model: OptimizationModel::new(),
            index: ModelIndex::default(),
            horizon: simulation.horizon(),
        }
    }

    pub(crate) fn build(mut self) -> Result<BuiltModel> {
        let graph = self.graph;
        graph.check_references()?;
        for component in graph.components() {
            self.families(component)?;
        }

        for component in graph.components() {
            self.add_flows(component);
        }
        for component in graph.components() {
            match component.component_type() {
                ComponentType::Sink(sink) => self.add_sink(component, sink)?,
                ComponentType::Source(source) => self.add_source(component, source)?,
                ComponentType::Transformer(transformer) => match transformer.technology() {
                    Technology::Storage(storage) => self.add_storage(component, transformer, storage)?,
                    _ => self.add_transformer(component, transformer)?,
                },
                ComponentType::Transport(transport) => self.add_transport(component, transport)?,
            }
        }
        for bus in graph.buses() {
            self.add_bus(bus);
        }

        info!(
            variables = self.model.variables().len(),
            constraints = self.model.constraints().len(),
            timesteps = self.horizon,
            milp = self.model.has_integers(),
            "built optimization model"
        );
        Ok(BuiltModel {
            model: self.model,
            index: self.index,
            horizon: self.horizon,
        })
    }

    /// Resolves the constraint families active for `component`: those
    /// requested in its options plus those implied by its parameters.
    pub(super) fn families(&self, component: &Component) -> Result<BTreeSet<ConstraintFamily>> {
        let kind = component.kind();
        let uid = component.uid();
        let options = component.options();
        let mut requested: BTreeSet<ConstraintFamily> = options.constraints.iter().copied().collect();
        if options.milp {
            requested.insert(ConstraintFamily::Status);
        }

        let Some(transformer) = component.as_transformer() else {
            if let Some(family) = requested.into_iter().next() {
                return Err(ModelError::IncompatibleConstraint {
                    kind,
                    uid: uid.to_string(),
                    family,
                });
            }
            return Ok(BTreeSet::new());
        };

        let p = transformer.params();
        let mut active = requested.clone();
        if p.grad_pos.is_some() || p.grad_neg.is_some() || p.ramp_costs.is_some() {
            active.insert(ConstraintFamily::Ramping);
        }
        if p.t_min_on.is_some() || p.t_min_off.is_some() {
            active.insert(ConstraintFamily::MinUpDown);
        }
        if p.start_costs.is_some() || p.stop_costs.is_some() {
            active.insert(ConstraintFamily::StartStop);
        }
        if p.outages.is_some() {
            active.insert(ConstraintFamily::Outages);
        }

        if kind == EntityKind::Storage {
            if let Some(family) = active.iter().find(|f| **f != ConstraintFamily::Outages) {
                return Err(ModelError::IncompatibleConstraint {
                    kind,
                    uid: uid.to_string(),
                    family: *family,
                });
            }
        }

        for family in &active {
            if family.requires_milp() && !active.contains(&ConstraintFamily::Status) {
                return Err(ModelError::RequiresMilp {
                    uid: uid.to_string(),
                    family: *family,
                });
            }
        }
        let missing = |attribute| Err(ModelError::missing(kind, uid, attribute));
        if requested.contains(&ConstraintFamily::Ramping)
            && p.grad_pos.is_none()
            && p.grad_neg.is_none()
            && p.ramp_costs.is_none()
        {
            return missing("grad_pos");
        }
        if requested.contains(&ConstraintFamily::MinUpDown) && p.t_min_on.is_none() && p.t_min_off.is_none() {
            return missing("t_min_on");
        }
        if requested.contains(&ConstraintFamily::Outages) && p.outages.is_none() {
            return missing("outages");
        }
        if (active.contains(&ConstraintFamily::Status) || p.grad_pos.is_some() || p.grad_neg.is_some())
            && p.out_max.is_empty()
        {
            return missing("out_max");
        }
        if active.contains(&ConstraintFamily::Status) && p.invest && p.add_out_limit.is_none() {
            return missing("add_out_limit");
        }
        Ok(active)
    }

    fn add_flows(&mut self, component: &Component) {
        let uid = component.uid();
        for bus in component.inputs() {
            let vars = self.series(uid, &format!("in_{bus}"), None);
            self.index.flows.insert(FlowKey::new(bus.as_str(), uid), vars);
        }
        for bus in component.outputs() {
            let vars = self.series(uid, &format!("out_{bus}"), None);
            self.index.flows.insert(FlowKey::new(uid, bus.as_str()), vars);
        }
    }

    /// One non-negative continuous variable per timestep.
    pub(super) fn series(&mut self, uid: &str, role: &str, upper: Option<f64>) -> Vec<VarId> {
        (0..self.horizon)
            .map(|t| self.model.continuous(format!("{uid}_{role}_{t}"), upper))
            .collect()
    }

    pub(super) fn flow(&self, source: &str, target: &str) -> Vec<VarId> {
        self.index.flow(source, target).map(<[VarId]>::to_vec).unwrap_or_default()
    }

    /// Input flow variables of `component`, one vector per input bus.
    pub(super) fn inputs(&self, component: &Component) -> Vec<Vec<VarId>> {
        component
            .inputs()
            .iter()
            .map(|bus| self.flow(bus, component.uid()))
            .collect()
    }

    /// Output flow variables of `component`, one vector per output bus.
    pub(super) fn outputs(&self, component: &Component) -> Vec<Vec<VarId>> {
        component
            .outputs()
            .iter()
            .map(|bus| self.flow(component.uid(), bus))
            .collect()
    }

    /// Profile values must cover the horizon exactly.
    pub(super) fn profile<'p>(&self, uid: &str, attribute: &'static str, values: &'p [f64]) -> Result<&'p [f64]> {
        if values.len() != self.horizon {
            return Err(ModelError::ProfileLength {
                uid: uid.to_string(),
                attribute,
                expected: self.horizon,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Bounds `var <= capacity`.
    ///
    /// A constant capacity becomes a variable bound unless `explicit` asks
    /// for a named constraint, which is returned so its dual can be read.
    pub(super) fn limit(
        &mut self,
        name: String,
        var: VarId,
        capacity: LinearExpr,
        explicit: bool,
    ) -> Option<ConstraintId> {
        if capacity.terms().is_empty() && !explicit {
            self.model.cap_variable(var, capacity.constant_value());
            return None;
        }
        Some(
            self.model
                .add_constraint(name, LinearExpr::from(var) - capacity, Relation::Le, 0.0),
        )
    }

    /// Output capacity limit of a component to bus edge.
    ///
    /// Emitted as explicit constraints when duals are requested so the shadow
    /// price of capacity can be reported.
    pub(super) fn limit_output(&mut self, uid: &str, bus: &str, t: usize, var: VarId, capacity: LinearExpr) {
        let explicit = self.simulation.duals();
        if let Some(id) = self.limit(format!("{uid}_capacity_{bus}_{t}"), var, capacity, explicit) {
            if explicit {
                self.index
                    .capacities
                    .entry(FlowKey::new(uid, bus))
                    .or_default()
                    .push(id);
            }
        }
    }

    /// Investment variable for additional capacity.
    pub(super) fn invest(&mut self, uid: &str, limit: Option<f64>) -> VarId {
        let var = self.model.continuous(format!("{uid}_invest"), limit);
        self.index.invest.insert(uid.to_string(), var);
        var
    }

    pub(super) fn cost(&mut self, kind: EntityKind, expr: LinearExpr) {
        if self.simulation.objective_options().includes_costs(kind) {
            self.model.add_objective(expr);
        }
    }

    pub(super) fn revenue(&mut self, kind: EntityKind, expr: LinearExpr) {
        if self.simulation.objective_options().includes_revenues(kind) {
            self.model.add_objective(-expr);
        }
    }

    pub(super) fn co2_price(&self) -> f64 {
        self.simulation.objective_options().co2_price
    }

    /// Pins every flow of `component` to zero on its outage timesteps.
    pub(super) fn apply_outages(&mut self, component: &Component, steps: &[usize]) {
        if steps.is_empty() {
            return;
        }
        debug!(uid = component.uid(), outages = steps.len(), "applying outages");
        let flows: Vec<Vec<VarId>> = self
            .inputs(component)
            .into_iter()
            .chain(self.outputs(component))
            .collect();
        for vars in flows {
            for &t in steps {
                self.model.fix_variable(vars[t], 0.0);
            }
        }
    }
}

/// Sum of the `t`-th variable of every series.
pub(super) fn sum_at(series: &[Vec<VarId>], t: usize) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for vars in series {
        expr += vars[t];
    }
    expr
}

/// Sum over all timesteps of a series, scaled by `coef`.
pub(super) fn total(vars: &[VarId], coef: f64) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for var in vars {
        expr.add_term(*var, coef);
    }
    expr
}
