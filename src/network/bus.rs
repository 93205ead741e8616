use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, EntityKind};
use crate::error::{ModelError, Result};

/// Options of a commodity bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct BusParams {
    /// Commodity carried by the bus (electricity, heat, gas, ...).
    pub commodity: String,
    /// Unbalanced buses impose no balance and act as an unlimited supply.
    pub balanced: bool,
    /// Penalty per unit of surplus. `Some` adds an excess slack.
    pub excess: Option<f64>,
    /// Penalty per unit of deficit. `Some` adds a shortage slack.
    pub shortage: Option<f64>,
    /// Price charged for every unit drawn from the bus.
    #[validate(range(min = 0.0))]
    pub price: f64,
}

impl Default for BusParams {
    fn default() -> Self {
        Self {
            commodity: String::new(),
            balanced: true,
            excess: None,
            shortage: None,
            price: 0.0,
        }
    }
}

/// Per-timestep results written back after a solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusResults {
    /// Shadow price of the balance constraint.
    pub duals: Option<Vec<f64>>,
    pub excess: Option<Vec<f64>>,
    pub shortage: Option<Vec<f64>>,
}

/// A commodity-homogeneous node that balances in- and outflows.
#[derive(Debug, Clone, Serialize)]
pub struct Bus {
    #[serde(flatten)]
    entity: Entity,
    params: BusParams,
    results: BusResults,
}

impl Bus {
    pub fn new(uid: impl Into<String>, params: BusParams) -> Result<Self> {
        let uid = uid.into();
        if uid.is_empty() {
            return Err(ModelError::invalid(EntityKind::Bus, &uid, "uid", "must not be empty"));
        }
        params
            .validate()
            .map_err(|e| ModelError::invalid(EntityKind::Bus, &uid, "price", e.to_string()))?;
        for (attribute, value) in [("excess", params.excess), ("shortage", params.shortage)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ModelError::invalid(EntityKind::Bus, &uid, attribute, "must be finite"));
            }
        }
        Ok(Self {
            entity: Entity::new(uid, Vec::new(), Vec::new()),
            params,
            results: BusResults::default(),
        })
    }

    /// Balanced bus for `commodity` without slacks.
    pub fn commodity(uid: impl Into<String>, commodity: impl Into<String>) -> Result<Self> {
        Self::new(
            uid,
            BusParams {
                commodity: commodity.into(),
                ..Default::default()
            },
        )
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

    pub fn params(&self) -> &BusParams {
        &self.params
    }

    pub fn results(&self) -> &BusResults {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut BusResults {
        &mut self.results
    }
}
