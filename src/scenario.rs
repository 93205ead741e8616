//! Scenario files
//!
//! A scenario describes a complete study in TOML: simulation settings, buses,
//! components, bidirectional connections and regions. Loading only feeds the
//! construction API, so every structural check applies as if the entities were
//! created in code.
//!
//! ```toml
//! year = 2012
//!
//! [simulation]
//! start = "2012-01-01T00:00:00Z"
//! periods = 24
//!
//! [[buses]]
//! uid = "b_el"
//! commodity = "electricity"
//!
//! [[components]]
//! type = "simple"
//! uid = "pp_gas"
//! inputs = ["b_gas"]
//! outputs = ["b_el"]
//! technology = { eta = 0.58 }
//! params = { out_max = [100.0] }
//! ```

use std::path::Path;

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;
use tracing::info;

use crate::components::{
    ChpParams, Component, ExtractionChpParams, OptimizationOptions, SimpleParams, SinkParams, SourceParams,
    StorageParams, TechnologyParams, TransformerParams, TransportKind, TransportParams,
};
use crate::energy_system::{EnergySystem, Region, Simulation, SimulationSettings};
use crate::error::{ModelError, Result};
use crate::network::{Bus, BusParams};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub year: Option<i32>,
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub buses: Vec<BusSpec>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusSpec {
    pub uid: String,
    pub commodity: String,
    #[serde(default = "default_true")]
    pub balanced: bool,
    #[serde(default)]
    pub excess: Option<f64>,
    #[serde(default)]
    pub shortage: Option<f64>,
    #[serde(default)]
    pub price: f64,
}

fn default_true() -> bool {
    true
}

/// Edges and options shared by every component entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec<P> {
    pub uid: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub params: P,
    #[serde(default)]
    pub options: OptimizationOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformerSpec<T> {
    pub uid: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub params: TransformerParams,
    #[serde(default)]
    pub technology: T,
    #[serde(default)]
    pub options: OptimizationOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentSpec {
    Sink(NodeSpec<SinkParams>),
    Source(NodeSpec<SourceParams>),
    Simple(TransformerSpec<SimpleParams>),
    Chp(TransformerSpec<ChpParams>),
    SimpleExtractionChp(TransformerSpec<ExtractionChpParams>),
    Storage(TransformerSpec<StorageParams>),
    Transport(NodeSpec<TransportParams>),
}

impl ComponentSpec {
    pub fn into_component(self) -> Result<Component> {
        fn transformer<T>(spec: TransformerSpec<T>, technology: fn(T) -> TechnologyParams) -> Result<Component> {
            Ok(
                Component::transformer(spec.uid, spec.inputs, spec.outputs, spec.params, technology(spec.technology))?
                    .with_options(spec.options),
            )
        }
        match self {
            ComponentSpec::Sink(s) => Ok(Component::sink(s.uid, s.inputs, s.outputs, s.params)?.with_options(s.options)),
            ComponentSpec::Source(s) => {
                Ok(Component::source(s.uid, s.inputs, s.outputs, s.params)?.with_options(s.options))
            }
            ComponentSpec::Transport(s) => {
                Ok(Component::transport(s.uid, s.inputs, s.outputs, s.params)?.with_options(s.options))
            }
            ComponentSpec::Simple(s) => transformer(s, TechnologyParams::Simple),
            ComponentSpec::Chp(s) => transformer(s, TechnologyParams::Chp),
            ComponentSpec::SimpleExtractionChp(s) => transformer(s, TechnologyParams::SimpleExtractionChp),
            ComponentSpec::Storage(s) => transformer(s, TechnologyParams::Storage),
        }
    }
}

/// A bidirectional link created with [`EnergySystem::connect`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSpec {
    pub bus_a: String,
    pub bus_b: String,
    pub in_max: f64,
    pub out_max: f64,
    #[serde(default = "default_eta")]
    pub eta: f64,
    #[serde(default)]
    pub kind: TransportKind,
}

fn default_eta() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSpec {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    /// WKT geometry, kept as is.
    #[serde(default)]
    pub geom: Option<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ModelError::Configuration(format!(
                "scenario file {} does not exist",
                path.display()
            )));
        }
        Self::extract(Figment::from(Toml::file(path)))
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::extract(Figment::from(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| ModelError::Configuration(e.to_string()))
    }

    /// Creates the energy system, adding buses, components, connections and
    /// regions in file order.
    pub fn into_energy_system(self) -> Result<EnergySystem> {
        let simulation = Simulation::try_from(self.simulation)?;
        let mut es = EnergySystem::new(simulation, self.year);
        for bus in self.buses {
            let params = BusParams {
                commodity: bus.commodity,
                balanced: bus.balanced,
                excess: bus.excess,
                shortage: bus.shortage,
                price: bus.price,
            };
            es.add_bus(Bus::new(bus.uid, params)?)?;
        }
        for component in self.components {
            es.add_component(component.into_component()?)?;
        }
        for c in self.connections {
            es.connect(&c.bus_a, &c.bus_b, c.in_max, c.out_max, c.eta, c.kind)?;
        }
        for r in self.regions {
            let id = es.add_region(Region::new(r.name, r.code, r.geom));
            let members: Vec<&str> = r.entities.iter().map(String::as_str).collect();
            es.assign_region(id, &members)?;
        }
        info!(
            entities = es.graph().len(),
            regions = es.regions().len(),
            timesteps = es.simulation().horizon(),
            "scenario loaded"
        );
        Ok(es)
    }
}
