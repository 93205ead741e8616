use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{CostParams, Storage, StorageParams};

/// Outage schedule of a transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outages {
    /// Explicit timestep positions, e.g. `[1, 4, 200]`.
    Timesteps(Vec<usize>),
    /// Share of the horizon (0..=1), spread evenly over it.
    Share(f64),
}

impl Outages {
    /// Timestep positions that are out of service within a horizon of `n`.
    pub fn resolve(&self, n: usize) -> Vec<usize> {
        match self {
            Outages::Timesteps(steps) => steps.iter().copied().filter(|t| *t < n).sorted_unstable().dedup().collect(),
            Outages::Share(share) => {
                let count = (share.clamp(0.0, 1.0) * n as f64).round() as usize;
                if count == 0 {
                    return Vec::new();
                }
                (0..count).map(|i| i * n / count).collect()
            }
        }
    }
}

/// Operating parameters common to all transformer technologies.
///
/// Edge limits are positional: `out_max[i]` bounds the flow into
/// `outputs[i]`. An empty list leaves the edges unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TransformerParams {
    pub in_max: Vec<f64>,
    pub out_max: Vec<f64>,
    pub in_min: Vec<f64>,
    pub out_min: Vec<f64>,
    /// Maximum increase of the first output between timesteps, relative to its `out_max`.
    pub grad_pos: Option<f64>,
    /// Maximum decrease of the first output between timesteps, relative to its `out_max`.
    pub grad_neg: Option<f64>,
    /// Minimum number of timesteps to stay on after a start.
    pub t_min_on: Option<usize>,
    /// Minimum number of timesteps to stay off after a stop.
    pub t_min_off: Option<usize>,
    pub outages: Option<Outages>,
    /// Cost per unit of input, on top of `opex_var`.
    pub input_costs: f64,
    pub start_costs: Option<f64>,
    pub stop_costs: Option<f64>,
    /// Cost per unit of output change between timesteps.
    pub ramp_costs: Option<f64>,
    /// Revenue per unit of the first output.
    pub output_price: f64,
    pub invest: bool,
    pub add_out_limit: Option<f64>,
    pub costs: CostParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SimpleParams {
    /// Constant efficiency output / input.
    pub eta: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChpParams {
    /// Efficiencies of the first (electrical) and second (thermal) output.
    pub eta: Option<[f64; 2]>,
}

/// Extraction turbine with a constant power-to-heat ratio in backpressure mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExtractionChpParams {
    /// Electrical efficiency in condensing mode.
    pub eta_el_cond: Option<f64>,
    /// Power loss index.
    pub beta: Option<f64>,
    /// Power-to-heat ratio in backpressure mode.
    pub sigma: Option<f64>,
}

/// Technology-specific parameters selecting the transformer variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TechnologyParams {
    Simple(SimpleParams),
    Chp(ChpParams),
    SimpleExtractionChp(ExtractionChpParams),
    Storage(StorageParams),
}

/// Validated technology of a transformer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Technology {
    Simple {
        eta: f64,
    },
    Chp {
        eta: [f64; 2],
    },
    SimpleExtractionChp {
        eta_el_cond: f64,
        beta: f64,
        sigma: f64,
    },
    Storage(Storage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transformer {
    pub(crate) params: TransformerParams,
    pub(crate) technology: Technology,
    pub(crate) annuity: Option<f64>,
}

impl Transformer {
    pub fn params(&self) -> &TransformerParams {
        &self.params
    }

    pub fn technology(&self) -> &Technology {
        &self.technology
    }

    pub fn storage(&self) -> Option<&Storage> {
        match &self.technology {
            Technology::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    pub fn in_max(&self) -> &[f64] {
        &self.params.in_max
    }

    pub fn out_max(&self) -> &[f64] {
        &self.params.out_max
    }

    pub fn annuity(&self) -> Option<f64> {
        self.annuity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_outages_are_clipped_to_horizon() {
        let outages = Outages::Timesteps(vec![200, 4, 1, 4]);
        assert_eq!(outages.resolve(10), vec![1, 4]);
    }

    #[test]
    fn test_outage_share_is_spread() {
        assert_eq!(Outages::Share(0.25).resolve(8), vec![0, 4]);
        assert!(Outages::Share(0.0).resolve(8).is_empty());
        assert_eq!(Outages::Share(1.0).resolve(3), vec![0, 1, 2]);
    }
}
