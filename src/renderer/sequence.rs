use std::fmt::Write as _;

use crate::foundation::error::{ErrorCode, ReliefError, ReliefResult};
use crate::foundation::geometry::Scale;
use crate::renderer::step::RenderingStep;

/// Steps recorded by the VM, in execution order.
///
/// Append-only while the script runs; the renderer only reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderingSequence {
    steps: Vec<RenderingStep>,
    render_scale: Scale,
    max_length: usize,
    slot_count: usize,
}

impl RenderingSequence {
    pub fn new(render_scale: Scale, max_length: usize) -> Self {
        Self {
            steps: Vec::new(),
            render_scale,
            max_length,
            slot_count: 0,
        }
    }

    pub fn add(&mut self, step: RenderingStep) -> ReliefResult<()> {
        if self.steps.len() >= self.max_length {
            return Err(ReliefError::limit(
                ErrorCode::RenderingSequenceTooLong,
                step.location,
                format!("rendering sequence exceeded {} steps", self.max_length),
            ));
        }
        debug_assert!(step.target < self.slot_count, "step writes an unallocated slot");
        tracing::trace!(index = self.steps.len(), step = %step, "recorded rendering step");
        self.steps.push(step);
        Ok(())
    }

    /// Reserves a fresh object table slot. Slots are never reused.
    pub fn allocate_slot(&mut self) -> usize {
        self.slot_count += 1;
        self.slot_count - 1
    }

    /// Number of slots the renderer's object table needs.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn render_scale(&self) -> Scale {
        self.render_scale
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RenderingStep> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[RenderingStep] {
        &self.steps
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "scale {}, {} steps, {} slots",
            self.render_scale,
            self.steps.len(),
            self.slot_count
        );
        for (index, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, "{index}: {step}");
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/sequence.rs"]
mod tests;
