//! Relief is a procedural height-map scripting runtime.
//!
//! A compiled script runs on a stack [`VirtualMachine`] that never touches raster data: every
//! height map or profile operation is recorded into a [`RenderingSequence`]. A [`Renderer`]
//! then analyzes the sequence (bounds, object lifetimes, memory) and executes it step by step
//! within a memory budget, producing the yielded maps.
//!
//! - Load a [`CompiledScript`] and build its [`ScriptParameters`]
//! - Run a [`VirtualMachine`] to record the sequence
//! - Render it with a [`Renderer`] into a [`RenderedMapTable`]
#![forbid(unsafe_code)]

/// Configuration of the virtual machine and the renderer.
pub mod config;
/// Native script library.
pub mod corelib;
/// Geometry, numbers, random sources, errors and machine states.
pub mod foundation;
/// Raster engines.
pub mod genlib;
/// Deferred rendering.
pub mod renderer;
/// Script runtime.
pub mod runtime;

pub use crate::config::{RendererConfig, RuntimeConfig, VmConfig};
pub use crate::foundation::error::{
    CodeLocation, ErrorCode, ReliefError, ReliefResult, ScriptError,
};
pub use crate::foundation::state::{MachineStatus, StepResult};
pub use crate::genlib::height_map::HeightMap;
pub use crate::genlib::height_profile::HeightProfile;
pub use crate::renderer::objects::RenderedMapTable;
pub use crate::renderer::renderer::Renderer;
pub use crate::renderer::sequence::RenderingSequence;
pub use crate::runtime::parameters::ScriptParameters;
pub use crate::runtime::script::CompiledScript;
pub use crate::runtime::vm::VirtualMachine;
