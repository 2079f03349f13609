//! Script runtime: managed objects, scopes, stacks and the virtual machine.

/// Ordered key/value arrays and their reference bookkeeping.
pub mod array;
/// Instruction set and code blocks.
pub mod instruction;
/// Reference-counted object arena.
pub mod memory;
/// Managed object values.
pub mod object;
/// Script parameters and map size settings.
pub mod parameters;
/// Compiled script container and parameter declarations.
pub mod script;
/// Mapping from raster handles to renderer slots.
pub mod slots;
/// Object, code block and call stacks.
pub mod stacks;
/// Name bindings of one scope.
pub mod variables;
/// The stack machine.
pub mod vm;
