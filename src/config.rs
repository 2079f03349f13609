//! Limits for the virtual machine and the renderer.
//!
//! Both structs are passed explicitly to [`VirtualMachine::new`](crate::VirtualMachine::new)
//! and [`Renderer::new`](crate::Renderer::new). A JSON document may override any subset of
//! fields; missing ones keep their defaults.

use std::io::Read;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReliefError, ReliefResult};

/// Virtual machine limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum number of nested function calls.
    pub call_stack_limit: usize,
    /// Maximum number of nested blocks within one call.
    pub code_block_stack_limit: usize,
    pub object_stack_limit: usize,
    /// Maximum number of rendering steps a script may record.
    pub max_rendering_sequence_length: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            call_stack_limit: 1_000,
            code_block_stack_limit: 1_000,
            object_stack_limit: 10_000,
            max_rendering_sequence_length: 100_000,
        }
    }
}

/// Renderer limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Bytes any single step may require, temporaries and resident rasters included.
    pub memory_limit: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            memory_limit: 1 << 30,
        }
    }
}

/// Combined configuration file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub vm: VmConfig,
    pub renderer: RendererConfig,
}

impl RuntimeConfig {
    pub fn from_reader(reader: impl Read) -> ReliefResult<Self> {
        serde_json::from_reader(reader).map_err(|e| ReliefError::serde(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReliefResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
