//! Optimization model builder
//!
//! Walks the entity graph and emits variables, constraints and objective
//! terms into a canonical [`OptimizationModel`]. Construction is deterministic:
//! nodes are visited in insertion order and every variable and constraint is
//! named `{uid}_{role}_{t}`.
//!
//! Families of optional constraints:
//! - `status`: binary on/off variables (milp formulation)
//! - `ramping`: gradient limits and ramp costs
//! - `min_up_down`: minimum up and down times
//! - `start_stop`: start/stop variables and their costs
//! - `outages`: forced zero flows on scheduled timesteps

pub mod algebra;
pub mod builder;
pub mod index;

mod buses;
mod sources_sinks;
mod storage;
mod transformers;
mod transport;

pub use algebra::*;
pub use builder::*;
pub use index::*;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Optional constraint families a component may request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintFamily {
    Status,
    Ramping,
    MinUpDown,
    StartStop,
    Outages,
}

impl ConstraintFamily {
    /// Families that only make sense with binary status variables.
    pub fn requires_milp(&self) -> bool {
        matches!(self, ConstraintFamily::MinUpDown | ConstraintFamily::StartStop)
    }
}
