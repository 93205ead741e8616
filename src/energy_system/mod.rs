//! Energy system container
//!
//! The aggregate root of a study: owns the entity graph, the regions, the
//! simulation settings and, once built, the optimization model. Building and
//! solving are synchronous and not reentrant; independent studies should use
//! independent instances.

pub mod region;
pub mod simulation;

pub use region::*;
pub use simulation::*;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::components::{Component, TransportKind, TransportParams};
use crate::error::{ModelError, Result};
use crate::model::{build_model, BuiltModel};
use crate::network::{Bus, EntityGraph};
use crate::solver::{self, SolveRequest, SolveSummary, SolverBackend, SolverRegistry};

#[derive(Debug)]
pub struct EnergySystem {
    graph: EntityGraph,
    regions: Vec<Region>,
    simulation: Simulation,
    year: Option<i32>,
    registry: SolverRegistry,
    model: Option<BuiltModel>,
    summary: Option<SolveSummary>,
}

impl EnergySystem {
    pub fn new(simulation: Simulation, year: Option<i32>) -> Self {
        Self {
            graph: EntityGraph::new(),
            regions: Vec::new(),
            simulation,
            year,
            registry: SolverRegistry::with_defaults(),
            model: None,
            summary: None,
        }
    }

    /// Makes `backend` available under its name, e.g. for the simulation's
    /// `solver` setting.
    pub fn register_solver(&mut self, backend: Arc<dyn SolverBackend>) {
        self.registry.register(backend);
    }

    pub fn add_bus(&mut self, bus: Bus) -> Result<()> {
        self.warn_if_built(bus.uid());
        self.graph.add_bus(bus)
    }

    pub fn add_component(&mut self, component: Component) -> Result<()> {
        self.warn_if_built(component.uid());
        self.graph.add_component(component)
    }

    fn warn_if_built(&self, uid: &str) {
        if self.model.is_some() {
            warn!(uid, "entity added after the model was built; call reset_model() to include it");
        }
    }

    /// Registers an empty region; members are added with [`Self::assign_region`].
    pub fn add_region(&mut self, region: Region) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(region);
        id
    }

    /// Adds existing entities to a region and records the region on them.
    pub fn assign_region(&mut self, id: RegionId, uids: &[&str]) -> Result<()> {
        let region = self
            .regions
            .get_mut(id.0)
            .ok_or_else(|| ModelError::Configuration(format!("unknown region {}", id.0)))?;
        for uid in uids {
            let entity = self.graph.entity_mut(uid).ok_or_else(|| ModelError::DanglingReference {
                entity: region.name().to_string(),
                reference: uid.to_string(),
            })?;
            entity.add_region(id);
            region.push_entity(uid);
        }
        Ok(())
    }

    /// Connects two buses of the same commodity in both directions.
    ///
    /// Creates transports `bus_a + bus_b` (from `bus_b` into `bus_a`) and
    /// `bus_b + bus_a` (from `bus_a` into `bus_b`), both with the given limits
    /// and efficiency. Returns their uids.
    pub fn connect(
        &mut self,
        bus_a: &str,
        bus_b: &str,
        in_max: f64,
        out_max: f64,
        eta: f64,
        kind: TransportKind,
    ) -> Result<[String; 2]> {
        let uid = format!("{bus_a}{bus_b}");
        let (a, b) = match (self.graph.bus(bus_a), self.graph.bus(bus_b)) {
            (Some(a), Some(b)) => (a, b),
            (None, _) => {
                return Err(ModelError::DanglingReference {
                    entity: uid,
                    reference: bus_a.to_string(),
                })
            }
            (_, None) => {
                return Err(ModelError::DanglingReference {
                    entity: uid,
                    reference: bus_b.to_string(),
                })
            }
        };
        if a.params().commodity != b.params().commodity {
            return Err(ModelError::CommodityMismatch {
                bus_a: bus_a.to_string(),
                commodity_a: a.params().commodity.clone(),
                bus_b: bus_b.to_string(),
                commodity_b: b.params().commodity.clone(),
            });
        }

        let params = TransportParams {
            in_max: Some(in_max),
            out_max: Some(out_max),
            eta,
            kind,
            ..Default::default()
        };
        let transports = [(bus_a, bus_b), (bus_b, bus_a)].map(|(to, from)| {
            Component::transport(format!("{to}{from}"), vec![from.to_string()], vec![to.to_string()], params.clone())
        });
        let [forward, backward] = transports;
        let (forward, backward) = (forward?, backward?);
        for transport in [&forward, &backward] {
            if self.graph.contains(transport.uid()) {
                return Err(ModelError::DuplicateUid(transport.uid().to_string()));
            }
        }
        let uids = [forward.uid().to_string(), backward.uid().to_string()];
        self.add_component(forward)?;
        self.add_component(backward)?;
        debug!(bus_a, bus_b, ?kind, "connected buses");
        Ok(uids)
    }

    /// Builds the optimization model unless a cached one exists.
    pub fn build_model(&mut self) -> Result<&BuiltModel> {
        let built = match self.model.take() {
            Some(built) => {
                debug!("reusing cached optimization model");
                built
            }
            None => build_model(&self.graph, &self.simulation)?,
        };
        Ok(self.model.insert(built))
    }

    /// Drops the cached model so the next build reflects the current graph.
    pub fn reset_model(&mut self) {
        self.model = None;
    }

    /// Builds the model on first use, solves it with the configured solver
    /// and writes the results back onto buses and components.
    pub fn optimize(&mut self) -> Result<&SolveSummary> {
        let request = SolveRequest::from(&self.simulation);
        let backend = self.registry.get(&request.solver)?;
        let built = match self.model.take() {
            Some(built) => built,
            None => build_model(&self.graph, &self.simulation)?,
        };

        let started = Instant::now();
        let outcome = solver::run(backend.as_ref(), &built.model, &request);
        let summary = outcome.map(|solution| {
            solver::write_back(&mut self.graph, &built, &solution);
            SolveSummary::new(backend.name(), &built, &solution, started.elapsed())
        });
        self.model = Some(built);
        let summary = summary?;

        info!(
            solver = %summary.solver,
            objective = summary.objective,
            wall_time_ms = summary.wall_time_ms,
            "optimization finished"
        );
        Ok(self.summary.insert(summary))
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn bus(&self, uid: &str) -> Option<&Bus> {
        self.graph.bus(uid)
    }

    pub fn component(&self, uid: &str) -> Option<&Component> {
        self.graph.component(uid)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn model(&self) -> Option<&BuiltModel> {
        self.model.as_ref()
    }

    pub fn summary(&self) -> Option<&SolveSummary> {
        self.summary.as_ref()
    }
}
