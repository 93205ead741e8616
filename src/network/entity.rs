use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::energy_system::RegionId;

/// Concrete kind of a network node.
///
/// Doubles as the class filter of the objective options, so the string forms
/// are what scenario files and `cost_objects` lists use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum EntityKind {
    Bus,
    Sink,
    Source,
    Simple,
    #[strum(serialize = "CHP")]
    #[serde(rename = "CHP")]
    Chp,
    #[strum(serialize = "SimpleExtractionCHP")]
    #[serde(rename = "SimpleExtractionCHP")]
    SimpleExtractionChp,
    Storage,
    Transport,
}

/// Identity and topology shared by every node of the graph.
///
/// Edges name their endpoints by uid; regions are weak back-references into
/// the owning energy system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    uid: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    #[serde(skip)]
    regions: Vec<RegionId>,
}

impl Entity {
    pub fn new(uid: impl Into<String>, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            uid: uid.into(),
            inputs,
            outputs,
            regions: Vec::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    pub(crate) fn push_input(&mut self, uid: &str) {
        if !self.inputs.iter().any(|u| u == uid) {
            self.inputs.push(uid.to_string());
        }
    }

    pub(crate) fn push_output(&mut self, uid: &str) {
        if !self.outputs.iter().any(|u| u == uid) {
            self.outputs.push(uid.to_string());
        }
    }

    pub(crate) fn add_region(&mut self, region: RegionId) {
        if !self.regions.contains(&region) {
            self.regions.push(region);
        }
    }
}
