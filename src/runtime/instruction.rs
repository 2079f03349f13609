use std::fmt::Write as _;
use std::sync::Arc;

use crate::foundation::error::CodeLocation;

/// One VM instruction plus the source location it was compiled from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub location: CodeLocation,
    #[serde(flatten)]
    pub kind: InstructionKind,
}

impl Instruction {
    pub fn new(location: CodeLocation, kind: InstructionKind) -> Self {
        Self { location, kind }
    }
}

/// Instruction set of the stack machine.
///
/// Loads push exactly one object. Calls pop their arguments (and the instance for member
/// calls, pushed last) and push exactly one result. Nested blocks are shared so pushing a
/// block frame never copies code.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstructionKind {
    LoadConstNumber {
        value: f64,
    },
    LoadConstString {
        value: String,
    },
    LoadConstBoolean {
        value: bool,
    },
    LoadNull,
    LoadScopeValue {
        name: String,
    },
    /// Pushes a reference object bound to the named variable.
    LoadScopeReference {
        name: String,
    },
    /// Pops an instance and pushes its member value.
    LoadMemberValue {
        name: String,
    },
    /// Assigns the top of the stack to the named variable, leaving it on the stack.
    StoreScopeValue {
        name: String,
    },
    /// Pops the initial value and binds it in the innermost block.
    DeclareLocalValue {
        name: String,
        #[serde(default)]
        is_const: bool,
    },
    DeclareGlobalValue {
        name: String,
        #[serde(default)]
        is_const: bool,
    },
    CallGlobal {
        name: String,
        argc: usize,
    },
    CallMember {
        name: String,
        argc: usize,
    },
    Pop,
    /// Pops a boolean and runs one of the branches as a new block.
    IfElse {
        if_branch: Arc<CodeBlock>,
        #[serde(default)]
        else_branch: Arc<CodeBlock>,
    },
    /// Runs `body` as a looping block until a `break` leaves it.
    Loop {
        body: Arc<CodeBlock>,
    },
    Block {
        body: Arc<CodeBlock>,
    },
    /// Leaves `depth` blocks; the outermost of them must be a loop.
    Break {
        #[serde(default = "one")]
        depth: usize,
    },
    /// Leaves `depth - 1` blocks and restarts the loop block below them.
    Continue {
        #[serde(default = "one")]
        depth: usize,
    },
    /// Returns from the current function; the value above the call's stack base (if any) is
    /// the result.
    Return,
    YieldAsNamed {
        name: String,
    },
    YieldAsMain,
}

fn one() -> usize {
    1
}

impl InstructionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadConstNumber { .. } => "load_const_number",
            Self::LoadConstString { .. } => "load_const_string",
            Self::LoadConstBoolean { .. } => "load_const_boolean",
            Self::LoadNull => "load_null",
            Self::LoadScopeValue { .. } => "load_scope_value",
            Self::LoadScopeReference { .. } => "load_scope_reference",
            Self::LoadMemberValue { .. } => "load_member_value",
            Self::StoreScopeValue { .. } => "store_scope_value",
            Self::DeclareLocalValue { .. } => "declare_local_value",
            Self::DeclareGlobalValue { .. } => "declare_global_value",
            Self::CallGlobal { .. } => "call_global",
            Self::CallMember { .. } => "call_member",
            Self::Pop => "pop",
            Self::IfElse { .. } => "if_else",
            Self::Loop { .. } => "loop",
            Self::Block { .. } => "block",
            Self::Break { .. } => "break",
            Self::Continue { .. } => "continue",
            Self::Return => "return",
            Self::YieldAsNamed { .. } => "yield_as_named",
            Self::YieldAsMain => "yield_as_main",
        }
    }
}

/// Straight-line instruction list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CodeBlock {
    instructions: Vec<Instruction>,
}

impl CodeBlock {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Indented listing, nested blocks included.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for i in &self.instructions {
            let detail = match &i.kind {
                InstructionKind::LoadConstNumber { value } => value.to_string(),
                InstructionKind::LoadConstString { value } => format!("{value:?}"),
                InstructionKind::LoadConstBoolean { value } => value.to_string(),
                InstructionKind::LoadScopeValue { name }
                | InstructionKind::LoadScopeReference { name }
                | InstructionKind::LoadMemberValue { name }
                | InstructionKind::StoreScopeValue { name }
                | InstructionKind::YieldAsNamed { name } => name.clone(),
                InstructionKind::DeclareLocalValue { name, is_const }
                | InstructionKind::DeclareGlobalValue { name, is_const } => {
                    format!("{}{name}", if *is_const { "const " } else { "" })
                }
                InstructionKind::CallGlobal { name, argc }
                | InstructionKind::CallMember { name, argc } => format!("{name}/{argc}"),
                InstructionKind::Break { depth } | InstructionKind::Continue { depth } => {
                    depth.to_string()
                }
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "{indent}{} {}{}",
                i.location,
                i.kind.name(),
                if detail.is_empty() {
                    String::new()
                } else {
                    format!(" {detail}")
                }
            );
            match &i.kind {
                InstructionKind::IfElse {
                    if_branch,
                    else_branch,
                } => {
                    if_branch.dump_into(out, depth + 1);
                    let _ = writeln!(out, "{indent}else");
                    else_branch.dump_into(out, depth + 1);
                }
                InstructionKind::Loop { body } | InstructionKind::Block { body } => {
                    body.dump_into(out, depth + 1);
                }
                _ => {}
            }
        }
    }
}
