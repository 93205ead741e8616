use std::collections::HashMap;

use super::{Bus, Entity};
use crate::components::Component;
use crate::error::{ModelError, Result};

/// Position of a node inside an [`EntityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeRef {
    Bus(usize),
    Component(usize),
}

/// Insertion-ordered store of buses and components with a uid index.
///
/// Bus edge lists mirror the component edge lists: a component listing a bus
/// among its outputs appears among that bus' inputs and vice versa. Linking
/// happens whenever either side is added, so insertion order is free.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    buses: Vec<Bus>,
    components: Vec<Component>,
    index: HashMap<String, NodeRef>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bus(&mut self, mut bus: Bus) -> Result<()> {
        self.reserve(bus.uid())?;
        for component in &self.components {
            let uid = bus.uid().to_string();
            if component.outputs().contains(&uid) {
                bus.entity_mut().push_input(component.uid());
            }
            if component.inputs().contains(&uid) {
                bus.entity_mut().push_output(component.uid());
            }
        }
        self.index
            .insert(bus.uid().to_string(), NodeRef::Bus(self.buses.len()));
        self.buses.push(bus);
        Ok(())
    }

    pub fn add_component(&mut self, component: Component) -> Result<()> {
        self.reserve(component.uid())?;
        let uid = component.uid();
        for input in component.inputs() {
            if let Some(bus) = self.bus_index(input).map(|i| &mut self.buses[i]) {
                bus.entity_mut().push_output(uid);
            }
        }
        for output in component.outputs() {
            if let Some(bus) = self.bus_index(output).map(|i| &mut self.buses[i]) {
                bus.entity_mut().push_input(uid);
            }
        }
        self.index.insert(
            component.uid().to_string(),
            NodeRef::Component(self.components.len()),
        );
        self.components.push(component);
        Ok(())
    }

    fn reserve(&self, uid: &str) -> Result<()> {
        if self.index.contains_key(uid) {
            return Err(ModelError::DuplicateUid(uid.to_string()));
        }
        Ok(())
    }

    fn bus_index(&self, uid: &str) -> Option<usize> {
        match self.index.get(uid) {
            Some(NodeRef::Bus(i)) => Some(*i),
            _ => None,
        }
    }

    /// Every component edge must name a bus of this graph.
    pub fn check_references(&self) -> Result<()> {
        for component in &self.components {
            for edge in component.inputs().iter().chain(component.outputs()) {
                if self.bus_index(edge).is_none() {
                    return Err(ModelError::DanglingReference {
                        entity: component.uid().to_string(),
                        reference: edge.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn bus(&self, uid: &str) -> Option<&Bus> {
        self.bus_index(uid).map(|i| &self.buses[i])
    }

    pub fn component(&self, uid: &str) -> Option<&Component> {
        match self.index.get(uid) {
            Some(NodeRef::Component(i)) => Some(&self.components[*i]),
            _ => None,
        }
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub(crate) fn buses_mut(&mut self) -> &mut [Bus] {
        &mut self.buses
    }

    pub(crate) fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub(crate) fn entity_mut(&mut self, uid: &str) -> Option<&mut Entity> {
        match self.index.get(uid)? {
            NodeRef::Bus(i) => Some(self.buses[*i].entity_mut()),
            NodeRef::Component(i) => Some(self.components[*i].entity_mut()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
