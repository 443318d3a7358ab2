//! UI components.

pub mod cola_graph;
