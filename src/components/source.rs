use serde::{Deserialize, Serialize};

use super::CostParams;

/// A Source only produces and as a consequence has no input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceParams {
    /// Installed output capacity.
    pub out_max: Option<f64>,
    /// Normalized availability per timestep, multiplies `out_max`.
    pub val: Option<Vec<f64>>,
    /// Dispatch must follow `val * out_max` exactly.
    pub fixed: bool,
    /// Cost per unit of available but unused output.
    pub curtail_costs: f64,
    /// Allow investment into additional output capacity.
    pub invest: bool,
    /// Upper bound on additional output capacity.
    pub add_out_limit: Option<f64>,
    pub costs: CostParams,
}

impl SourceParams {
    /// Dispatchable source with capacity `out_max` and variable cost `opex_var`.
    pub fn dispatchable(out_max: f64, opex_var: f64) -> Self {
        Self {
            out_max: Some(out_max),
            costs: CostParams {
                opex_var,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub(crate) params: SourceParams,
    /// `capex * crf`, present when the source may invest.
    pub(crate) annuity: Option<f64>,
}

impl Source {
    pub fn params(&self) -> &SourceParams {
        &self.params
    }

    pub fn annuity(&self) -> Option<f64> {
        self.annuity
    }

    /// Available output at timestep `t` relative to the installed capacity.
    pub fn availability(&self, t: usize) -> f64 {
        self.params
            .val
            .as_ref()
            .and_then(|v| v.get(t).copied())
            .unwrap_or(1.0)
    }
}
