use std::fmt::Write as _;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::runtime::instruction::CodeBlock;
use crate::runtime::memory::MemoryManager;
use crate::runtime::object::ObjectId;
use crate::runtime::variables::VariableTable;

/// Operand stack shared by every call. Each entry owns one reference.
#[derive(Debug)]
pub struct ObjectStack {
    items: Vec<ObjectId>,
    limit: usize,
}

impl ObjectStack {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit,
        }
    }

    pub fn push(
        &mut self,
        memory: &mut MemoryManager,
        id: ObjectId,
        location: CodeLocation,
    ) -> ReliefResult<()> {
        if self.items.len() >= self.limit {
            return Err(ReliefError::limit(
                ErrorCode::ObjectStackOverflow,
                location,
                format!("object stack exceeded {} entries", self.limit),
            ));
        }
        memory.add_ref(id);
        self.items.push(id);
        Ok(())
    }

    /// Pops the top entry and hands its reference to the caller.
    pub fn pop_owned(&mut self) -> ReliefResult<ObjectId> {
        self.items
            .pop()
            .ok_or_else(|| ReliefError::intermediate_code("object stack underflow"))
    }

    /// Pops and releases the top entry.
    pub fn discard(&mut self, memory: &mut MemoryManager) -> ReliefResult<()> {
        let id = self.pop_owned()?;
        memory.release(id);
        Ok(())
    }

    pub fn top(&self) -> ReliefResult<ObjectId> {
        self.items
            .last()
            .copied()
            .ok_or_else(|| ReliefError::intermediate_code("object stack is empty"))
    }

    /// Pops `n` entries, returned in push order; the caller owns their references.
    pub fn take(&mut self, n: usize) -> ReliefResult<SmallVec<[ObjectId; 4]>> {
        self.check_size(n)?;
        let at = self.items.len() - n;
        Ok(self.items.drain(at..).collect())
    }

    pub fn check_size(&self, n: usize) -> ReliefResult<()> {
        if self.items.len() < n {
            return Err(ReliefError::intermediate_code(format!(
                "object stack holds {} entries, {n} needed",
                self.items.len()
            )));
        }
        Ok(())
    }

    /// Releases entries above `len`.
    pub fn truncate(&mut self, memory: &mut MemoryManager, len: usize) {
        while self.items.len() > len {
            if let Some(id) = self.items.pop() {
                memory.release(id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dump(&self, memory: &MemoryManager) -> String {
        let mut out = String::new();
        for id in self.items.iter().rev() {
            let described = memory
                .get(*id)
                .map(|o| format!("{} {}", o.value().type_name(), o.value().describe()))
                .unwrap_or_else(|| "<freed>".to_string());
            let _ = writeln!(out, "{id}: {described}");
        }
        out
    }
}

/// Execution frame of one lexical block or loop body.
#[derive(Debug)]
pub struct CodeBlockStackEntry {
    pub location: CodeLocation,
    pub block: Arc<CodeBlock>,
    pub cursor: usize,
    pub is_looping: bool,
    pub locals: VariableTable,
}

impl CodeBlockStackEntry {
    pub fn new(location: CodeLocation, block: Arc<CodeBlock>, is_looping: bool) -> Self {
        Self {
            location,
            block,
            cursor: 0,
            is_looping,
            locals: VariableTable::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.block.len()
    }

    /// Rewinds a loop body for its next iteration, dropping the iteration's locals.
    pub fn restart(&mut self, memory: &mut MemoryManager) {
        self.cursor = 0;
        self.locals.release_all(memory);
    }
}

/// Nested block frames of one function call.
#[derive(Debug)]
pub struct CodeBlockStack {
    entries: Vec<CodeBlockStackEntry>,
    limit: usize,
}

impl CodeBlockStack {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, entry: CodeBlockStackEntry) -> ReliefResult<()> {
        if self.entries.len() >= self.limit {
            return Err(ReliefError::limit(
                ErrorCode::CodeBlockStackOverflow,
                entry.location,
                format!("code block stack exceeded {} entries", self.limit),
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Pops the innermost block, releasing its locals.
    pub fn pop(&mut self, memory: &mut MemoryManager) -> ReliefResult<()> {
        let mut entry = self
            .entries
            .pop()
            .ok_or_else(|| ReliefError::intermediate_code("code block stack underflow"))?;
        entry.locals.release_all(memory);
        Ok(())
    }

    pub fn top(&self) -> Option<&CodeBlockStackEntry> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut CodeBlockStackEntry> {
        self.entries.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&CodeBlockStackEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CodeBlockStackEntry> {
        self.entries.get_mut(index)
    }

    /// Blocks from outermost to innermost.
    pub fn iter(&self) -> std::slice::Iter<'_, CodeBlockStackEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn release_all(&mut self, memory: &mut MemoryManager) {
        while let Some(mut entry) = self.entries.pop() {
            entry.locals.release_all(memory);
        }
    }
}

/// One active function call.
#[derive(Debug)]
pub struct CallStackEntry {
    pub location: CodeLocation,
    pub function_name: String,
    pub code_blocks: CodeBlockStack,
    /// Object stack height when the call started; the return value sits right above it.
    pub object_stack_base: usize,
}

#[derive(Debug)]
pub struct CallStack {
    entries: Vec<CallStackEntry>,
    limit: usize,
}

impl CallStack {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, entry: CallStackEntry) -> ReliefResult<()> {
        if self.entries.len() >= self.limit {
            return Err(ReliefError::limit(
                ErrorCode::CallStackOverflow,
                entry.location,
                format!(
                    "call stack exceeded {} entries calling {}",
                    self.limit, entry.function_name
                ),
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<CallStackEntry> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&CallStackEntry> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut CallStackEntry> {
        self.entries.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&CallStackEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CallStackEntry> {
        self.entries.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn release_all(&mut self, memory: &mut MemoryManager) {
        while let Some(mut entry) = self.entries.pop() {
            entry.code_blocks.release_all(memory);
        }
    }

    pub fn dump(&self, memory: &MemoryManager) -> String {
        let mut out = String::new();
        for (call_index, call) in self.entries.iter().enumerate().rev() {
            let _ = writeln!(
                out,
                "[{call_index}] {} (called at {}, stack base {})",
                call.function_name, call.location, call.object_stack_base
            );
            for (block_index, block) in call.code_blocks.iter().enumerate().rev() {
                let _ = writeln!(
                    out,
                    "  block {block_index} at {}{}: {}/{}",
                    block.location,
                    if block.is_looping { " (loop)" } else { "" },
                    block.cursor,
                    block.block.len()
                );
                for line in block.locals.dump(memory).lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/stacks.rs"]
mod tests;
