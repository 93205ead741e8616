use serde::{Deserialize, Serialize};

/// How a transport moves its commodity between two buses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum TransportKind {
    /// Lossy transfer within the same timestep.
    #[default]
    Simple,
    /// Lossy transfer arriving `steps` timesteps later.
    Delayed { steps: usize },
}

impl TransportKind {
    pub fn delay(&self) -> usize {
        match self {
            TransportKind::Simple => 0,
            TransportKind::Delayed { steps } => *steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TransportParams {
    pub in_max: Option<f64>,
    pub out_max: Option<f64>,
    /// Constant efficiency output / input.
    pub eta: f64,
    pub kind: TransportKind,
    /// Cost per unit transported.
    pub opex_var: f64,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            in_max: None,
            out_max: None,
            eta: 1.0,
            kind: TransportKind::Simple,
            opex_var: 0.0,
        }
    }
}

/// Moves one commodity between exactly one input and one output bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transport {
    pub(crate) params: TransportParams,
}

impl Transport {
    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    pub fn in_max(&self) -> Option<f64> {
        self.params.in_max
    }

    pub fn out_max(&self) -> Option<f64> {
        self.params.out_max
    }

    pub fn eta(&self) -> f64 {
        self.params.eta
    }

    pub fn kind(&self) -> TransportKind {
        self.params.kind
    }
}
