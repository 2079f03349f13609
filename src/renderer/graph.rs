use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::renderer::sequence::RenderingSequence;

/// Producer edges of a rendering sequence.
///
/// For every step and every slot it reads, the edge points at the step that last wrote that
/// slot before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderingGraph {
    back_edges: Vec<SmallVec<[BackEdge; 4]>>,
}

/// `producer` last wrote `slot` before the consuming step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackEdge {
    pub slot: usize,
    pub producer: usize,
}

impl RenderingGraph {
    pub fn new(sequence: &RenderingSequence) -> Self {
        let mut last_writer: BTreeMap<usize, usize> = BTreeMap::new();
        let mut back_edges = Vec::with_capacity(sequence.len());
        for (index, step) in sequence.steps().iter().enumerate() {
            let edges = step
                .read_slots()
                .filter_map(|slot| {
                    last_writer
                        .get(&slot)
                        .map(|&producer| BackEdge { slot, producer })
                })
                .collect();
            back_edges.push(edges);
            last_writer.insert(step.target, index);
        }
        Self { back_edges }
    }

    pub fn back_edges(&self, step: usize) -> &[BackEdge] {
        self.back_edges.get(step).map(SmallVec::as_slice).unwrap_or(&[])
    }

    /// Producer of `slot` as seen by `step`.
    pub fn producer(&self, step: usize, slot: usize) -> Option<usize> {
        self.back_edges(step)
            .iter()
            .find(|e| e.slot == slot)
            .map(|e| e.producer)
    }

    pub fn len(&self) -> usize {
        self.back_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.back_edges.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/graph.rs"]
mod tests;
