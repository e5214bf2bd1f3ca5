// src/dag/mod.rs

//! Build graph: orders `build` tasks into parallel stages from their `after`
//! dependencies.

pub mod graph;

pub use graph::BuildGraph;
