//! Force-directed graph visualisation components.

pub mod force_graph;
