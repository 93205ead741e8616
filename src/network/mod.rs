//! Entity graph
//!
//! Buses and components are the nodes of the energy system; edges are the
//! ordered input/output lists of each node, naming the other end by uid.
//! Only component-to-bus and bus-to-component edges exist.

pub mod bus;
pub mod entity;
pub mod graph;

pub use bus::*;
pub use entity::*;
pub use graph::*;
