use serde::{Deserialize, Serialize};

/// A Sink only consumes; its list of outputs has to be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SinkParams {
    /// Fixed demand per timestep. When set, consumption equals this profile.
    pub val: Option<Vec<f64>>,
    /// Upper bound for free (non-fixed) consumption.
    pub in_max: Option<f64>,
    /// Cost per unit consumed; negative values are revenue.
    pub opex_var: f64,
}

impl SinkParams {
    /// Sink with a fixed demand profile.
    pub fn demand(val: Vec<f64>) -> Self {
        Self {
            val: Some(val),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sink {
    pub(crate) params: SinkParams,
}

impl Sink {
    pub fn params(&self) -> &SinkParams {
        &self.params
    }
}
