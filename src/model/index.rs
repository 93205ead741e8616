use std::collections::BTreeMap;

use serde::Serialize;

use super::{ConstraintId, VarId};

/// Directed edge between a bus and a component, named by uid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowKey {
    pub source: String,
    pub target: String,
}

impl FlowKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Maps entities and edges to the variables and constraints built for them.
///
/// Every per-timestep vector has one entry per simulation timestep, except
/// `soc` which carries the initial state in front.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelIndex {
    pub flows: BTreeMap<FlowKey, Vec<VarId>>,
    pub soc: BTreeMap<String, Vec<VarId>>,
    pub status: BTreeMap<String, Vec<VarId>>,
    pub invest: BTreeMap<String, VarId>,
    pub excess: BTreeMap<String, Vec<VarId>>,
    pub shortage: BTreeMap<String, Vec<VarId>>,
    /// Bus balance constraints.
    pub balances: BTreeMap<String, Vec<ConstraintId>>,
    /// Explicit output capacity constraints, keyed by component to bus edge.
    pub capacities: BTreeMap<FlowKey, Vec<ConstraintId>>,
}

impl ModelIndex {
    pub fn flow(&self, source: &str, target: &str) -> Option<&[VarId]> {
        self.flows
            .get(&FlowKey::new(source, target))
            .map(Vec::as_slice)
    }
}
