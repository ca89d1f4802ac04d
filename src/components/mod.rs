//! Reusable UI components.

pub mod task_graph;
