//! Component type hierarchy
//!
//! Components are the non-bus nodes of the graph. Every variant validates its
//! edge cardinality and mandatory technology parameters when it is created:
//!
//! | Variant     | inputs | outputs |
//! |-------------|--------|---------|
//! | Sink        | >= 0   | 0       |
//! | Source      | 0      | >= 0    |
//! | Transformer | >= 1   | >= 1    |
//! | Transport   | 1      | 1       |
//!
//! Transformer technologies narrow this further (Simple: one output, CHP and
//! SimpleExtractionCHP: two outputs, Storage: one input and one output).

pub mod costs;
pub mod sink;
pub mod source;
pub mod storage;
pub mod transformer;
pub mod transport;

pub use costs::*;
pub use sink::*;
pub use source::*;
pub use storage::*;
pub use transformer::*;
pub use transport::*;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EdgeSide, ModelError, Result};
use crate::model::ConstraintFamily;
use crate::network::{Entity, EntityKind};

/// Per-instance optimization options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OptimizationOptions {
    /// Use binary on/off status variables (mixed-integer formulation).
    pub milp: bool,
    /// Constraint families requested on top of those implied by parameters.
    pub constraints: Vec<ConstraintFamily>,
}

/// Per-timestep results written back after a solve, keyed by bus uid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentResults {
    pub inputs: BTreeMap<String, Vec<f64>>,
    pub outputs: BTreeMap<String, Vec<f64>>,
    /// State of charge at the end of each timestep.
    pub soc: Option<Vec<f64>>,
    /// On/off status (milp formulation).
    pub status: Option<Vec<f64>>,
    /// Optimal additional capacity.
    pub invest: Option<f64>,
    /// Shadow prices of the output capacity limits.
    pub capacity_duals: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ComponentType {
    Sink(Sink),
    Source(Source),
    Transformer(Transformer),
    Transport(Transport),
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    #[serde(flatten)]
    entity: Entity,
    #[serde(rename = "type")]
    kind: ComponentType,
    options: OptimizationOptions,
    results: ComponentResults,
}

impl Component {
    pub fn sink(
        uid: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        params: SinkParams,
    ) -> Result<Self> {
        let uid = uid.into();
        let kind = EntityKind::Sink;
        check_edges(kind, &uid, EdgeSide::Input, &inputs, 0, None)?;
        check_edges(kind, &uid, EdgeSide::Output, &outputs, 0, Some(0))?;
        if let Some(in_max) = params.in_max {
            non_negative(kind, &uid, "in_max", &[in_max])?;
        }
        if let Some(val) = &params.val {
            non_negative(kind, &uid, "val", val)?;
        }
        Ok(Self::assemble(uid, inputs, outputs, ComponentType::Sink(Sink { params })))
    }

    pub fn source(
        uid: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        params: SourceParams,
    ) -> Result<Self> {
        let uid = uid.into();
        let kind = EntityKind::Source;
        check_edges(kind, &uid, EdgeSide::Input, &inputs, 0, Some(0))?;
        check_edges(kind, &uid, EdgeSide::Output, &outputs, 0, None)?;
        validate_costs(kind, &uid, &params.costs)?;
        if let Some(out_max) = params.out_max {
            non_negative(kind, &uid, "out_max", &[out_max])?;
        }
        if let Some(val) = &params.val {
            non_negative(kind, &uid, "val", val)?;
        }
        if (params.fixed || params.val.is_some()) && params.out_max.is_none() && !params.invest {
            return Err(ModelError::missing(kind, &uid, "out_max"));
        }
        let annuity = if params.invest {
            Some(investment_annuity(kind, &uid, &params.costs)?)
        } else {
            None
        };
        Ok(Self::assemble(
            uid,
            inputs,
            outputs,
            ComponentType::Source(Source { params, annuity }),
        ))
    }

    pub fn transformer(
        uid: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        mut params: TransformerParams,
        technology: TechnologyParams,
    ) -> Result<Self> {
        let uid = uid.into();
        let (kind, n_in, n_out) = match &technology {
            TechnologyParams::Simple(_) => (EntityKind::Simple, None, Some(1)),
            TechnologyParams::Chp(_) => (EntityKind::Chp, None, Some(2)),
            TechnologyParams::SimpleExtractionChp(_) => (EntityKind::SimpleExtractionChp, None, Some(2)),
            TechnologyParams::Storage(_) => (EntityKind::Storage, Some(1), Some(1)),
        };
        check_edges(kind, &uid, EdgeSide::Input, &inputs, n_in.unwrap_or(1), n_in)?;
        check_edges(kind, &uid, EdgeSide::Output, &outputs, n_out.unwrap_or(1), n_out)?;
        validate_costs(kind, &uid, &params.costs)?;

        let technology = match technology {
            TechnologyParams::Simple(p) => Technology::Simple {
                eta: efficiency(kind, &uid, "eta", p.eta)?,
            },
            TechnologyParams::Chp(p) => {
                let [eta_el, eta_th] = p.eta.ok_or_else(|| ModelError::missing(kind, &uid, "eta"))?;
                Technology::Chp {
                    eta: [
                        efficiency(kind, &uid, "eta", Some(eta_el))?,
                        efficiency(kind, &uid, "eta", Some(eta_th))?,
                    ],
                }
            }
            TechnologyParams::SimpleExtractionChp(p) => {
                if params.in_max.is_empty() {
                    return Err(ModelError::missing(kind, &uid, "in_max"));
                }
                let eta_el_cond = efficiency(kind, &uid, "eta_el_cond", p.eta_el_cond)?;
                let beta = p.beta.ok_or_else(|| ModelError::missing(kind, &uid, "beta"))?;
                let sigma = p.sigma.ok_or_else(|| ModelError::missing(kind, &uid, "sigma"))?;
                non_negative(kind, &uid, "beta", &[beta])?;
                if sigma <= 0.0 || !sigma.is_finite() {
                    return Err(ModelError::invalid(kind, &uid, "sigma", "must be positive"));
                }
                Technology::SimpleExtractionChp {
                    eta_el_cond,
                    beta,
                    sigma,
                }
            }
            TechnologyParams::Storage(p) => Technology::Storage(Storage::resolve(&uid, &p, &mut params)?),
        };

        for (attribute, limits, edges) in [
            ("in_max", &params.in_max, &inputs),
            ("in_min", &params.in_min, &inputs),
            ("out_max", &params.out_max, &outputs),
            ("out_min", &params.out_min, &outputs),
        ] {
            edge_limits(kind, &uid, attribute, limits, edges.len())?;
        }
        for (attribute, value) in [("grad_pos", params.grad_pos), ("grad_neg", params.grad_neg)] {
            if let Some(grad) = value {
                if !(0.0..=1.0).contains(&grad) {
                    return Err(ModelError::invalid(kind, &uid, attribute, "must lie within [0, 1]"));
                }
            }
        }
        if let Some(Outages::Share(share)) = &params.outages {
            if !(0.0..=1.0).contains(share) {
                return Err(ModelError::invalid(kind, &uid, "outages", "share must lie within [0, 1]"));
            }
        }

        let annuity = if params.invest {
            if kind != EntityKind::Storage && params.out_max.is_empty() {
                return Err(ModelError::missing(kind, &uid, "out_max"));
            }
            Some(investment_annuity(kind, &uid, &params.costs)?)
        } else {
            None
        };

        Ok(Self::assemble(
            uid,
            inputs,
            outputs,
            ComponentType::Transformer(Transformer {
                params,
                technology,
                annuity,
            }),
        ))
    }

    pub fn transport(
        uid: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        params: TransportParams,
    ) -> Result<Self> {
        let uid = uid.into();
        let kind = EntityKind::Transport;
        check_edges(kind, &uid, EdgeSide::Input, &inputs, 1, Some(1))?;
        check_edges(kind, &uid, EdgeSide::Output, &outputs, 1, Some(1))?;
        if inputs[0] == outputs[0] {
            return Err(ModelError::EdgeCardinality {
                kind,
                uid,
                side: EdgeSide::Output,
                reason: "input and output must be different buses".into(),
            });
        }
        efficiency(kind, &uid, "eta", Some(params.eta))?;
        for (attribute, value) in [("in_max", params.in_max), ("out_max", params.out_max)] {
            if let Some(v) = value {
                non_negative(kind, &uid, attribute, &[v])?;
            }
        }
        Ok(Self::assemble(
            uid,
            inputs,
            outputs,
            ComponentType::Transport(Transport { params }),
        ))
    }

    /// Replaces the optimization options of this instance.
    pub fn with_options(mut self, options: OptimizationOptions) -> Self {
        self.options = options;
        self
    }

    fn assemble(uid: String, inputs: Vec<String>, outputs: Vec<String>, kind: ComponentType) -> Self {
        Self {
            entity: Entity::new(uid, inputs, outputs),
            kind,
            options: OptimizationOptions::default(),
            results: ComponentResults::default(),
        }
    }

    pub fn uid(&self) -> &str {
        self.entity.uid()
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub(crate) fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    pub fn inputs(&self) -> &[String] {
        self.entity.inputs()
    }

    pub fn outputs(&self) -> &[String] {
        self.entity.outputs()
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.kind
    }

    pub fn kind(&self) -> EntityKind {
        match &self.kind {
            ComponentType::Sink(_) => EntityKind::Sink,
            ComponentType::Source(_) => EntityKind::Source,
            ComponentType::Transport(_) => EntityKind::Transport,
            ComponentType::Transformer(t) => match t.technology {
                Technology::Simple { .. } => EntityKind::Simple,
                Technology::Chp { .. } => EntityKind::Chp,
                Technology::SimpleExtractionChp { .. } => EntityKind::SimpleExtractionChp,
                Technology::Storage(_) => EntityKind::Storage,
            },
        }
    }

    pub fn as_transformer(&self) -> Option<&Transformer> {
        match &self.kind {
            ComponentType::Transformer(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_transport(&self) -> Option<&Transport> {
        match &self.kind {
            ComponentType::Transport(t) => Some(t),
            _ => None,
        }
    }

    pub fn options(&self) -> &OptimizationOptions {
        &self.options
    }

    pub fn results(&self) -> &ComponentResults {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut ComponentResults {
        &mut self.results
    }
}

fn check_edges(
    kind: EntityKind,
    uid: &str,
    side: EdgeSide,
    edges: &[String],
    min: usize,
    max: Option<usize>,
) -> Result<()> {
    let err = |reason: String| ModelError::EdgeCardinality {
        kind,
        uid: uid.to_string(),
        side,
        reason,
    };
    if edges.len() < min || max.is_some_and(|max| edges.len() > max) {
        let expected = match max {
            Some(max) if max == min => format!("exactly {min}"),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        return Err(err(format!("expected {expected}, got {:?}", edges)));
    }
    let mut seen = HashSet::new();
    for edge in edges {
        if edge.is_empty() {
            return Err(err("empty bus uid".into()));
        }
        if !seen.insert(edge.as_str()) {
            return Err(err(format!("duplicate edge to '{edge}'")));
        }
    }
    Ok(())
}

fn efficiency(kind: EntityKind, uid: &str, attribute: &'static str, eta: Option<f64>) -> Result<f64> {
    let eta = eta.ok_or_else(|| ModelError::missing(kind, uid, attribute))?;
    if !(eta > 0.0 && eta.is_finite()) {
        return Err(ModelError::invalid(kind, uid, attribute, "must be positive"));
    }
    Ok(eta)
}

fn non_negative(kind: EntityKind, uid: &str, attribute: &'static str, values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
        return Err(ModelError::invalid(kind, uid, attribute, "values must be non-negative"));
    }
    Ok(())
}

fn edge_limits(kind: EntityKind, uid: &str, attribute: &'static str, limits: &[f64], edges: usize) -> Result<()> {
    if !limits.is_empty() && limits.len() != edges {
        return Err(ModelError::invalid(
            kind,
            uid,
            attribute,
            format!("expected one value per edge ({edges}), got {}", limits.len()),
        ));
    }
    non_negative(kind, uid, attribute, limits)
}

fn validate_costs(kind: EntityKind, uid: &str, costs: &CostParams) -> Result<()> {
    costs
        .validate()
        .map_err(|e| ModelError::invalid(kind, uid, "costs", e.to_string()))
}

fn investment_annuity(kind: EntityKind, uid: &str, costs: &CostParams) -> Result<f64> {
    if costs.capex.is_none() {
        return Err(ModelError::missing(kind, uid, "capex"));
    }
    costs
        .annuity(uid)
        .ok_or_else(|| ModelError::missing(kind, uid, "crf"))
}
