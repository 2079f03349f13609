use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use smallvec::SmallVec;

use crate::renderer::graph::RenderingGraph;
use crate::renderer::sequence::RenderingSequence;
use crate::renderer::step::{RenderingBounds, StepKind};

/// Facts computed for one step before rendering starts.
#[derive(Clone, Debug, PartialEq)]
pub struct StepMetadata {
    /// Logical extent the step's result must cover.
    pub bounds: RenderingBounds,
    /// Bytes resident while the step runs, temporaries included.
    pub memory_requirement: u64,
    /// Slots no later step reads; freed right after this step.
    pub releases: SmallVec<[usize; 4]>,
}

/// Per-step bounds, lifetimes and memory requirements of a rendering sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderingSequenceMetadata {
    steps: Vec<StepMetadata>,
}

impl RenderingSequenceMetadata {
    /// Runs the three passes in order: bounds, then lifetimes, then memory.
    pub fn calculate(sequence: &RenderingSequence, graph: &RenderingGraph) -> Self {
        let bounds = rendering_bounds(sequence, graph);
        let releases = object_lifetimes(sequence);
        let memory = memory_requirements(sequence, &bounds, &releases);
        let steps = bounds
            .into_iter()
            .zip(releases)
            .zip(memory)
            .map(|((bounds, releases), memory_requirement)| StepMetadata {
                bounds,
                memory_requirement,
                releases,
            })
            .collect();
        Self { steps }
    }

    pub fn get(&self, step: usize) -> Option<&StepMetadata> {
        self.steps.get(step)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Largest requirement over the whole sequence.
    pub fn peak_memory(&self) -> u64 {
        self.steps
            .iter()
            .map(|s| s.memory_requirement)
            .max()
            .unwrap_or(0)
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, step) in self.steps.iter().enumerate() {
            let releases: Vec<String> = step.releases.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                out,
                "{index}: bounds {}, memory {} B, release [{}]",
                step.bounds,
                step.memory_requirement,
                releases.join(", ")
            );
        }
        out
    }
}

/// Pushes what every step needs from its inputs back to the steps that produced them.
fn rendering_bounds(sequence: &RenderingSequence, graph: &RenderingGraph) -> Vec<RenderingBounds> {
    let steps = sequence.steps();
    let mut bounds: Vec<RenderingBounds> = steps
        .iter()
        .map(|s| RenderingBounds::empty(s.kind.output_kind()))
        .collect();

    for index in (0..steps.len()).rev() {
        let step = &steps[index];
        let own = bounds[index];
        for edge in graph.back_edges(index) {
            let mut need: Option<RenderingBounds> = None;
            for (argument, &slot) in step.arguments.iter().enumerate() {
                if slot == edge.slot {
                    let b = step.argument_bounds(argument, own);
                    need = Some(need.map_or(b, |n| n.combine(b)));
                }
            }
            if !step.kind.is_creator() && edge.slot == step.target {
                let b = step.prior_bounds(own);
                need = Some(need.map_or(b, |n| n.combine(b)));
            }
            if let Some(need) = need {
                bounds[edge.producer] = bounds[edge.producer].combine(need);
            }
        }
    }
    bounds
}

/// Reverse scan: the first time a slot is seen is its last use.
fn object_lifetimes(sequence: &RenderingSequence) -> Vec<SmallVec<[usize; 4]>> {
    let steps = sequence.steps();
    let mut seen = BTreeSet::new();
    let mut releases = vec![SmallVec::new(); steps.len()];
    for (index, step) in steps.iter().enumerate().rev() {
        for slot in step.arguments.iter().copied().chain([step.target]) {
            if seen.insert(slot) {
                releases[index].push(slot);
            }
        }
    }
    releases
}

/// Forward simulation of resident memory. Rendered outputs stay resident until the end.
fn memory_requirements(
    sequence: &RenderingSequence,
    bounds: &[RenderingBounds],
    releases: &[SmallVec<[usize; 4]>],
) -> Vec<u64> {
    let scale = sequence.render_scale();
    let mut footprints: BTreeMap<usize, RenderingBounds> = BTreeMap::new();
    let mut resident: u64 = 0;
    let mut requirements = Vec::with_capacity(bounds.len());

    for (index, step) in sequence.steps().iter().enumerate() {
        let own = bounds[index];
        let empty = RenderingBounds::empty(step.kind.output_kind());
        let footprint = if step.kind.is_creator() {
            empty
        } else {
            footprints.get(&step.target).copied().unwrap_or(empty)
        };
        requirements.push(resident + step.peak_extra_memory(own, footprint, scale));

        match &step.kind {
            StepKind::Yield { render_rect, .. } => {
                resident += RenderingBounds::Rect(*render_rect).memory_size(scale);
            }
            kind => {
                let after = if kind.is_creator() {
                    own
                } else {
                    step.simulate_footprint(own, footprint)
                };
                if let Some(old) = footprints.insert(step.target, after) {
                    resident -= old.memory_size(scale);
                }
                resident += after.memory_size(scale);
            }
        }
        for slot in &releases[index] {
            if let Some(old) = footprints.remove(slot) {
                resident -= old.memory_size(scale);
            }
        }
    }
    requirements
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/metadata.rs"]
mod tests;
