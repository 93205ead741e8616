//! Open Energy Modeller
//!
//! Describes an energy supply network as a graph of buses and components,
//! compiles it into a linear or mixed-integer dispatch and investment model,
//! solves it and writes per-timestep results back onto the entities.
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use open_energy_modeller::prelude::*;
//!
//! # fn main() -> open_energy_modeller::error::Result<()> {
//! let simulation = Simulation::hourly(Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap(), 3)?;
//! let mut es = EnergySystem::new(simulation, Some(2012));
//! es.add_bus(Bus::commodity("b_el", "electricity")?)?;
//! es.add_component(Component::source("pp", vec![], vec!["b_el".into()], SourceParams::dispatchable(50.0, 20.0))?)?;
//! es.add_component(Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(vec![10.0, 20.0, 30.0]))?)?;
//! let summary = es.optimize()?;
//! println!("total cost: {}", summary.objective);
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod config;
pub mod energy_system;
pub mod error;
pub mod model;
pub mod network;
pub mod scenario;
pub mod solver;
pub mod telemetry;

pub mod prelude {
    pub use crate::components::{
        ChpParams, Component, CostParams, ExtractionChpParams, OptimizationOptions, Outages, SimpleParams,
        SinkParams, SourceParams, StorageParams, TechnologyParams, TransformerParams, TransportKind,
        TransportParams,
    };
    pub use crate::energy_system::{EnergySystem, ObjectiveFunction, ObjectiveOptions, Region, Simulation};
    pub use crate::error::{ErrorClass, ModelError};
    pub use crate::model::ConstraintFamily;
    pub use crate::network::{Bus, BusParams, EntityKind};
}
