use std::fmt::Write as _;

use crate::config::RendererConfig;
use crate::foundation::error::{ErrorCode, ReliefError, ReliefResult};
use crate::foundation::state::{MachineStatus, StepResult};
use crate::renderer::graph::RenderingGraph;
use crate::renderer::metadata::RenderingSequenceMetadata;
use crate::renderer::objects::{RenderedMapTable, RendererObjectTable};
use crate::renderer::sequence::RenderingSequence;

/// Executes a rendering sequence one step at a time.
///
/// [`Renderer::calculate_metadata`] must run before the first [`Renderer::step`]. Every step
/// is checked against the configured memory limit before it touches any raster.
#[derive(Debug)]
pub struct Renderer<'a> {
    sequence: &'a RenderingSequence,
    config: RendererConfig,
    status: MachineStatus,
    graph: RenderingGraph,
    metadata: Option<RenderingSequenceMetadata>,
    objects: RendererObjectTable,
    rendered: RenderedMapTable,
    cursor: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(sequence: &'a RenderingSequence, config: RendererConfig) -> Self {
        Self {
            sequence,
            config,
            status: MachineStatus::Ready,
            graph: RenderingGraph::new(sequence),
            metadata: None,
            objects: RendererObjectTable::new(sequence.slot_count()),
            rendered: RenderedMapTable::new(),
            cursor: 0,
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn calculate_metadata(&mut self) {
        let metadata = RenderingSequenceMetadata::calculate(self.sequence, &self.graph);
        tracing::debug!(
            steps = metadata.len(),
            peak_memory = metadata.peak_memory(),
            "rendering metadata calculated"
        );
        self.metadata = Some(metadata);
    }

    /// Runs the next step and frees every slot no later step reads.
    pub fn step(&mut self) -> ReliefResult<StepResult> {
        if self.status != MachineStatus::Ready {
            return Err(ReliefError::api_usage(format!(
                "renderer is {}, not ready",
                self.status
            )));
        }
        let Some(metadata) = &self.metadata else {
            return Err(ReliefError::api_usage(
                "rendering metadata must be calculated before stepping",
            ));
        };
        let Some(step) = self.sequence.get(self.cursor) else {
            self.status = MachineStatus::Finished;
            return Ok(StepResult::Finished);
        };
        let Some(facts) = metadata.get(self.cursor) else {
            return Err(ReliefError::api_usage(
                "rendering metadata does not match the sequence",
            ));
        };

        if facts.memory_requirement > self.config.memory_limit {
            self.status = MachineStatus::Faulted;
            return Err(ReliefError::limit(
                ErrorCode::RendererMemoryLimit,
                step.location,
                format!(
                    "step {} ({}) needs {} bytes, limit is {}",
                    self.cursor,
                    step.kind.name(),
                    facts.memory_requirement,
                    self.config.memory_limit
                ),
            ));
        }

        tracing::debug!(
            index = self.cursor,
            step = step.kind.name(),
            memory = facts.memory_requirement,
            "rendering step"
        );
        step.execute(
            &mut self.objects,
            &mut self.rendered,
            facts.bounds,
            self.sequence.render_scale(),
        );
        for &slot in &facts.releases {
            self.objects.release(slot);
        }

        self.cursor += 1;
        if self.cursor >= self.sequence.len() {
            self.status = MachineStatus::Finished;
            Ok(StepResult::Finished)
        } else {
            Ok(StepResult::Running)
        }
    }

    /// Steps until the sequence is exhausted or a step fails.
    #[tracing::instrument(skip_all)]
    pub fn run(&mut self) -> ReliefResult<()> {
        if self.metadata.is_none() {
            self.calculate_metadata();
        }
        while self.status == MachineStatus::Ready {
            self.step()?;
        }
        Ok(())
    }

    /// Completed steps as a percentage of the sequence.
    pub fn progress(&self) -> f64 {
        if self.sequence.is_empty() {
            return 100.0;
        }
        self.cursor as f64 * 100.0 / self.sequence.len() as f64
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn graph(&self) -> &RenderingGraph {
        &self.graph
    }

    pub fn metadata(&self) -> Option<&RenderingSequenceMetadata> {
        self.metadata.as_ref()
    }

    pub fn objects(&self) -> &RendererObjectTable {
        &self.objects
    }

    pub fn rendered_maps(&self) -> &RenderedMapTable {
        &self.rendered
    }

    pub fn take_rendered_maps(&mut self) -> RenderedMapTable {
        std::mem::take(&mut self.rendered)
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "status: {}, step {}/{} ({:.1}%)",
            self.status,
            self.cursor,
            self.sequence.len(),
            self.progress()
        );
        let _ = writeln!(out, "memory limit: {} B", self.config.memory_limit);
        let _ = writeln!(out, "sequence:");
        out.push_str(&self.sequence.dump());
        if let Some(metadata) = &self.metadata {
            let _ = writeln!(out, "metadata:");
            out.push_str(&metadata.dump());
        }
        let _ = writeln!(out, "objects:");
        out.push_str(&self.objects.dump());
        let _ = writeln!(out, "rendered maps:");
        out.push_str(&self.rendered.dump());
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/renderer.rs"]
mod tests;
