//! Deferred rendering: the recorded step sequence, its static analysis and the executor.

/// Producer edges between recorded steps.
pub mod graph;
/// Bounds, lifetime and memory passes over a sequence.
pub mod metadata;
/// Slot table of intermediate rasters and the table of rendered output maps.
pub mod objects;
/// Step-driven executor.
#[allow(clippy::module_inception)]
pub mod renderer;
/// Append-only list of recorded steps.
pub mod sequence;
/// Step kinds and their per-kind bounds, memory and execution rules.
pub mod step;
