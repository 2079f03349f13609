use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::VmConfig;
use crate::corelib;
use crate::corelib::args::NativeCall;
use crate::foundation::error::{CodeLocation, ErrorCode, ReliefError, ReliefResult};
use crate::foundation::geometry::{Coordinate, Interval, Rectangle, Size1D};
use crate::foundation::number::{SCALE_MAX, SCALE_MIN};
use crate::foundation::random::RandomSequence;
use crate::foundation::state::{MachineStatus, StepResult};
use crate::renderer::sequence::RenderingSequence;
use crate::renderer::step::{ObjectKind, RenderingStep, StepKind};
use crate::runtime::instruction::{CodeBlock, Instruction, InstructionKind};
use crate::runtime::memory::MemoryManager;
use crate::runtime::object::{ObjectId, ObjectValue, ReferenceTarget};
use crate::runtime::parameters::{
    MAP_SIZE_AUTOMATIC, MapSizeParameter, RENDER_SIZE_DEFAULT, ScriptParameters,
};
use crate::runtime::script::{
    CompiledScript, ConstantValue, MAIN_FUNCTION_NAME, MAIN_MAP_NAME, ScriptFunction,
};
use crate::runtime::slots::SlotTable;
use crate::runtime::stacks::{
    CallStack, CallStackEntry, CodeBlockStack, CodeBlockStackEntry, ObjectStack,
};
use crate::runtime::variables::{VariableTable, VariableTableItem};

/// Type objects bound as const globals before the script starts.
const STATIC_TYPES: [&str; 4] = ["HeightMap", "HeightProfile", "Array", "Direction"];

/// Housekeeping needed before the next instruction can be fetched.
enum Unwind {
    RestartLoop,
    PopBlock,
    ReturnFromCall,
    Done,
}

/// Stack machine executing a compiled script.
///
/// Raster work is never done here: raster calls record steps into the rendering sequence and
/// hand out handles backed by renderer slots.
#[derive(Debug)]
pub struct VirtualMachine<'a> {
    pub(crate) script: &'a CompiledScript,
    pub(crate) arguments: ScriptParameters,
    config: VmConfig,
    status: MachineStatus,
    pub(crate) memory: MemoryManager,
    call_stack: CallStack,
    object_stack: ObjectStack,
    globals: VariableTable,
    pub(crate) rendering_sequence: RenderingSequence,
    pub(crate) slots: SlotTable,
    pub(crate) random: RandomSequence,
    generated_maps: BTreeSet<String>,
    messages: Vec<String>,
    /// Objects a native call handed over; released once its result is on the stack.
    pending_releases: Vec<ObjectId>,
    pub(crate) null: ObjectId,
}

impl<'a> VirtualMachine<'a> {
    /// Prepares a run of `script`. `arguments` must come from
    /// [`CompiledScript::create_script_parameters`] of the same script.
    pub fn new(
        script: &'a CompiledScript,
        arguments: ScriptParameters,
        config: VmConfig,
    ) -> ReliefResult<Self> {
        let declared = script.create_script_parameters()?;
        if !declared.same_definition(&arguments) {
            return Err(ReliefError::api_usage(
                "script arguments do not match the script's parameter declarations",
            ));
        }
        if !(SCALE_MIN..=SCALE_MAX).contains(&arguments.render_scale) {
            return Err(ReliefError::api_usage(format!(
                "render scale {} is outside [{SCALE_MIN}, {SCALE_MAX}]",
                arguments.render_scale
            )));
        }

        let mut memory = MemoryManager::new();
        let null = memory.register(ObjectValue::Null);
        memory.add_ref(null);

        let mut vm = Self {
            script,
            random: RandomSequence::new(arguments.random_seed),
            rendering_sequence: RenderingSequence::new(
                arguments.render_scale,
                config.max_rendering_sequence_length,
            ),
            arguments,
            config,
            status: MachineStatus::Ready,
            memory,
            call_stack: CallStack::new(config.call_stack_limit),
            object_stack: ObjectStack::new(config.object_stack_limit),
            globals: VariableTable::new(),
            slots: SlotTable::new(),
            generated_maps: BTreeSet::new(),
            messages: Vec::new(),
            pending_releases: Vec::new(),
            null,
        };
        vm.declare_builtins()?;
        vm.push_call(
            CodeLocation::default(),
            MAIN_FUNCTION_NAME,
            Arc::clone(&script.main),
        )?;
        Ok(vm)
    }

    fn declare_builtins(&mut self) -> ReliefResult<()> {
        let script = self.script;
        let enum_names = script.enums.iter().map(|e| e.name.as_str());
        for type_name in STATIC_TYPES.into_iter().chain(enum_names) {
            let id = self.memory.register(ObjectValue::Static {
                type_name: type_name.to_string(),
            });
            self.declare_global(CodeLocation::default(), type_name, id, true)?;
        }
        let parameters = self.memory.register(ObjectValue::Parameters);
        self.declare_global(CodeLocation::default(), "Parameters", parameters, true)?;

        for global in &script.globals {
            let value = match &global.initial {
                ConstantValue::Null => ObjectValue::Null,
                ConstantValue::Boolean(b) => ObjectValue::Boolean(*b),
                ConstantValue::Number(n) => ObjectValue::Number(*n),
                ConstantValue::String(s) => ObjectValue::String(s.clone()),
            };
            let id = self.memory.register(value);
            self.declare_global(CodeLocation::default(), &global.name, id, global.is_const)?;
        }
        Ok(())
    }

    fn declare_global(
        &mut self,
        location: CodeLocation,
        name: &str,
        value: ObjectId,
        is_const: bool,
    ) -> ReliefResult<()> {
        if self.globals.declare(&mut self.memory, name, value, is_const) {
            Ok(())
        } else {
            self.destroy_if_unreferenced(value);
            Err(ReliefError::script(
                ErrorCode::VariableAlreadyDefined,
                location,
                format!("global variable {name} is already defined"),
            ))
        }
    }

    fn destroy_if_unreferenced(&mut self, id: ObjectId) {
        if self.memory.ref_count(id) == Some(0) {
            self.memory.destroy(id);
        }
    }

    fn push_call(
        &mut self,
        location: CodeLocation,
        function_name: &str,
        body: Arc<CodeBlock>,
    ) -> ReliefResult<()> {
        let mut code_blocks = CodeBlockStack::new(self.config.code_block_stack_limit);
        code_blocks.push(CodeBlockStackEntry::new(location, body, false))?;
        self.call_stack.push(CallStackEntry {
            location,
            function_name: function_name.to_string(),
            code_blocks,
            object_stack_base: self.object_stack.len(),
        })?;
        tracing::debug!(
            function = function_name,
            depth = self.call_stack.len(),
            "call pushed"
        );
        Ok(())
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> ReliefResult<StepResult> {
        if self.status != MachineStatus::Ready {
            return Err(ReliefError::api_usage(format!(
                "virtual machine is {}, not ready",
                self.status
            )));
        }
        match self.step_inner() {
            Ok(result) => Ok(result),
            Err(error) => {
                self.status = MachineStatus::Faulted;
                Err(error)
            }
        }
    }

    /// Steps until the script finishes or fails.
    #[tracing::instrument(skip_all)]
    pub fn run(&mut self) -> ReliefResult<()> {
        while self.status == MachineStatus::Ready {
            self.step()?;
        }
        Ok(())
    }

    fn step_inner(&mut self) -> ReliefResult<StepResult> {
        if let Some(instruction) = self.fetch() {
            self.execute(&instruction)?;
        }
        self.unwind()
    }

    fn fetch(&mut self) -> Option<Instruction> {
        let block = self.call_stack.top_mut()?.code_blocks.top_mut()?;
        let instruction = block.block.get(block.cursor)?.clone();
        block.cursor += 1;
        Some(instruction)
    }

    /// Pops finished blocks and calls until an instruction is pending or the script is done.
    fn unwind(&mut self) -> ReliefResult<StepResult> {
        loop {
            let action = match self.call_stack.top() {
                None => break,
                Some(call) => match call.code_blocks.top() {
                    None => Unwind::ReturnFromCall,
                    Some(block) if block.is_finished() && block.is_looping => Unwind::RestartLoop,
                    Some(block) if block.is_finished() => Unwind::PopBlock,
                    Some(_) => Unwind::Done,
                },
            };
            match action {
                Unwind::RestartLoop => {
                    let memory = &mut self.memory;
                    if let Some(block) = self
                        .call_stack
                        .top_mut()
                        .and_then(|call| call.code_blocks.top_mut())
                    {
                        block.restart(memory);
                    }
                    return Ok(StepResult::Running);
                }
                Unwind::PopBlock => {
                    let memory = &mut self.memory;
                    if let Some(call) = self.call_stack.top_mut() {
                        call.code_blocks.pop(memory)?;
                    }
                }
                Unwind::ReturnFromCall => self.return_from_call(false)?,
                Unwind::Done => return Ok(StepResult::Running),
            }
        }
        self.finish()?;
        Ok(StepResult::Finished)
    }

    fn finish(&mut self) -> ReliefResult<()> {
        self.object_stack.truncate(&mut self.memory, 0);
        if self.script.configuration.main_map_is_mandatory
            && !self.generated_maps.contains(MAIN_MAP_NAME)
        {
            return Err(ReliefError::script(
                ErrorCode::MainMapNotGenerated,
                CodeLocation::default(),
                "the script finished without yielding the main map",
            ));
        }
        self.status = MachineStatus::Finished;
        tracing::debug!(
            steps = self.rendering_sequence.len(),
            maps = self.generated_maps.len(),
            "script finished"
        );
        Ok(())
    }

    fn current_blocks_mut(&mut self) -> ReliefResult<&mut CodeBlockStack> {
        self.call_stack
            .top_mut()
            .map(|call| &mut call.code_blocks)
            .ok_or_else(|| ReliefError::intermediate_code("no active call"))
    }

    /// Pops the current call. With `explicit` the value above the call's stack base (if any)
    /// is the result, otherwise the result is null.
    fn return_from_call(&mut self, explicit: bool) -> ReliefResult<()> {
        let mut call = self
            .call_stack
            .pop()
            .ok_or_else(|| ReliefError::intermediate_code("return without an active call"))?;
        let base = call.object_stack_base;
        let result = if explicit && self.object_stack.len() > base {
            self.object_stack.pop_owned()?
        } else {
            self.memory.add_ref(self.null);
            self.null
        };
        self.object_stack.truncate(&mut self.memory, base);
        call.code_blocks.release_all(&mut self.memory);
        tracing::debug!(
            function = %call.function_name,
            depth = self.call_stack.len(),
            "call returned"
        );

        let pushed = if self.call_stack.is_empty() {
            Ok(())
        } else {
            self.object_stack.push(&mut self.memory, result, call.location)
        };
        self.memory.release(result);
        pushed
    }

    fn execute(&mut self, instruction: &Instruction) -> ReliefResult<()> {
        let location = instruction.location;
        tracing::trace!(op = instruction.kind.name(), %location, "execute");
        match &instruction.kind {
            InstructionKind::LoadConstNumber { value } => {
                self.push_new(ObjectValue::Number(*value), location)
            }
            InstructionKind::LoadConstString { value } => {
                self.push_new(ObjectValue::String(value.clone()), location)
            }
            InstructionKind::LoadConstBoolean { value } => {
                self.push_new(ObjectValue::Boolean(*value), location)
            }
            InstructionKind::LoadNull => {
                self.object_stack.push(&mut self.memory, self.null, location)
            }
            InstructionKind::LoadScopeValue { name } => {
                let target = self.find_variable(name, location)?;
                let value = self.variable(&target)?.value();
                self.object_stack.push(&mut self.memory, value, location)
            }
            InstructionKind::LoadScopeReference { name } => {
                let target = self.find_variable(name, location)?;
                self.push_new(ObjectValue::Reference(target), location)
            }
            InstructionKind::LoadMemberValue { name } => {
                let instance = self.object_stack.pop_owned()?;
                let result = corelib::load_member(self, instance, name, location);
                let pushed =
                    result.and_then(|id| self.object_stack.push(&mut self.memory, id, location));
                self.memory.release(instance);
                pushed
            }
            InstructionKind::StoreScopeValue { name } => {
                let value = self.object_stack.top()?;
                let target = self.find_variable(name, location)?;
                self.assign(&target, value, location)
            }
            InstructionKind::DeclareLocalValue { name, is_const } => {
                let value = self.object_stack.pop_owned()?;
                let memory = &mut self.memory;
                let declared = self
                    .call_stack
                    .top_mut()
                    .and_then(|call| call.code_blocks.top_mut())
                    .map(|block| block.locals.declare(memory, name, value, *is_const));
                self.memory.release(value);
                let Some(declared) = declared else {
                    return Err(ReliefError::intermediate_code("no block to declare in"));
                };
                if declared {
                    Ok(())
                } else {
                    Err(ReliefError::script(
                        ErrorCode::VariableAlreadyDefined,
                        location,
                        format!("variable {name} is already defined in this block"),
                    ))
                }
            }
            InstructionKind::DeclareGlobalValue { name, is_const } => {
                let value = self.object_stack.pop_owned()?;
                let declared = self.declare_global(location, name, value, *is_const);
                self.memory.release(value);
                declared
            }
            InstructionKind::CallGlobal { name, argc } => self.call_global(name, *argc, location),
            InstructionKind::CallMember { name, argc } => self.call_member(name, *argc, location),
            InstructionKind::Pop => self.object_stack.discard(&mut self.memory),
            InstructionKind::IfElse {
                if_branch,
                else_branch,
            } => {
                let condition = self.object_stack.pop_owned()?;
                let taken = match self.memory.value(condition) {
                    ObjectValue::Boolean(b) => Some(*b),
                    _ => None,
                };
                let type_name = self.memory.value(condition).type_name().to_string();
                self.memory.release(condition);
                let Some(taken) = taken else {
                    return Err(ReliefError::script(
                        ErrorCode::IncorrectConditionResultType,
                        location,
                        format!("condition must be a Boolean, got {type_name}"),
                    ));
                };
                let branch = if taken { if_branch } else { else_branch };
                self.push_block(location, Arc::clone(branch), false)
            }
            InstructionKind::Loop { body } => self.push_block(location, Arc::clone(body), true),
            InstructionKind::Block { body } => self.push_block(location, Arc::clone(body), false),
            InstructionKind::Break { depth } => self.break_loop(*depth, false),
            InstructionKind::Continue { depth } => self.break_loop(*depth, true),
            InstructionKind::Return => self.return_from_call(true),
            InstructionKind::YieldAsNamed { name } => self.yield_map(name, location),
            InstructionKind::YieldAsMain => self.yield_map(MAIN_MAP_NAME, location),
        }
    }

    fn push_new(&mut self, value: ObjectValue, location: CodeLocation) -> ReliefResult<()> {
        let id = self.memory.register(value);
        let pushed = self.object_stack.push(&mut self.memory, id, location);
        if pushed.is_err() {
            self.memory.destroy(id);
        }
        pushed
    }

    fn push_block(
        &mut self,
        location: CodeLocation,
        block: Arc<CodeBlock>,
        is_looping: bool,
    ) -> ReliefResult<()> {
        self.current_blocks_mut()?
            .push(CodeBlockStackEntry::new(location, block, is_looping))
    }

    /// Leaves `depth` blocks for `break`, or `depth - 1` blocks plus a loop restart for
    /// `continue`. The block `depth` levels up must be a loop.
    fn break_loop(&mut self, depth: usize, is_continue: bool) -> ReliefResult<()> {
        let memory = &mut self.memory;
        let blocks = self
            .call_stack
            .top_mut()
            .map(|call| &mut call.code_blocks)
            .ok_or_else(|| ReliefError::intermediate_code("no active call"))?;
        if depth == 0 || depth > blocks.len() {
            return Err(ReliefError::intermediate_code(format!(
                "cannot leave {depth} blocks out of {}",
                blocks.len()
            )));
        }
        let loop_index = blocks.len() - depth;
        if !blocks.get(loop_index).is_some_and(|b| b.is_looping) {
            return Err(ReliefError::intermediate_code(format!(
                "block {depth} levels up is not a loop"
            )));
        }
        for _ in 0..depth - 1 {
            blocks.pop(memory)?;
        }
        if is_continue {
            if let Some(block) = blocks.top_mut() {
                block.restart(memory);
            }
            Ok(())
        } else {
            blocks.pop(memory)
        }
    }

    /// Innermost binding of `name`: current call's blocks from the inside out, then globals.
    fn find_variable(&self, name: &str, location: CodeLocation) -> ReliefResult<ReferenceTarget> {
        if let Some(call) = self.call_stack.top() {
            let call_index = self.call_stack.len() - 1;
            for (block_index, block) in call.code_blocks.iter().enumerate().rev() {
                if block.locals.get(name).is_some() {
                    return Ok(ReferenceTarget::Local {
                        call_index,
                        block_index,
                        name: name.to_string(),
                    });
                }
            }
        }
        if self.globals.get(name).is_some() {
            return Ok(ReferenceTarget::Global(name.to_string()));
        }
        Err(ReliefError::script(
            ErrorCode::UndefinedVariable,
            location,
            format!("undefined variable {name}"),
        ))
    }

    pub(crate) fn variable(&self, target: &ReferenceTarget) -> ReliefResult<&VariableTableItem> {
        let item = match target {
            ReferenceTarget::Global(name) => self.globals.get(name),
            ReferenceTarget::Local {
                call_index,
                block_index,
                name,
            } => self
                .call_stack
                .get(*call_index)
                .and_then(|c| c.code_blocks.get(*block_index))
                .and_then(|b| b.locals.get(name)),
        };
        item.ok_or_else(|| ReliefError::intermediate_code(format!("dangling reference {target:?}")))
    }

    /// Rebinds the variable behind `target`.
    pub(crate) fn assign(
        &mut self,
        target: &ReferenceTarget,
        value: ObjectId,
        location: CodeLocation,
    ) -> ReliefResult<()> {
        let memory = &mut self.memory;
        let (item, name) = match target {
            ReferenceTarget::Global(name) => (self.globals.get_mut(name), name),
            ReferenceTarget::Local {
                call_index,
                block_index,
                name,
            } => (
                self.call_stack
                    .get_mut(*call_index)
                    .and_then(|c| c.code_blocks.get_mut(*block_index))
                    .and_then(|b| b.locals.get_mut(name)),
                name,
            ),
        };
        let item = item
            .ok_or_else(|| ReliefError::intermediate_code(format!("dangling reference {target:?}")))?;
        if item.set_value(memory, value) {
            Ok(())
        } else {
            Err(ReliefError::script(
                ErrorCode::ReadOnlyWrite,
                location,
                format!("{name} is read-only"),
            ))
        }
    }

    fn call_global(&mut self, name: &str, argc: usize, location: CodeLocation) -> ReliefResult<()> {
        let args = self.object_stack.take(argc)?;

        let script = self.script;
        if let Some(function) = script.functions.get(name) {
            let outcome = self.call_script_function(name, function, &args, location);
            for arg in args {
                self.memory.release(arg);
            }
            return outcome;
        }

        let call = NativeCall {
            location,
            name,
            args: &args,
        };
        let result = corelib::call_global(self, &call);
        self.finish_native_call(result, &args, location)
    }

    fn call_script_function(
        &mut self,
        name: &str,
        function: &ScriptFunction,
        args: &[ObjectId],
        location: CodeLocation,
    ) -> ReliefResult<()> {
        if function.parameters.len() != args.len() {
            return Err(ReliefError::script(
                ErrorCode::IncorrectNumberOfArguments,
                location,
                format!(
                    "{name} takes {} arguments, {} given",
                    function.parameters.len(),
                    args.len()
                ),
            ));
        }
        self.push_call(location, name, Arc::clone(&function.body))?;
        let memory = &mut self.memory;
        let block = self
            .call_stack
            .top_mut()
            .and_then(|c| c.code_blocks.top_mut())
            .ok_or_else(|| ReliefError::intermediate_code("function frame missing"))?;
        for (parameter, &arg) in function.parameters.iter().zip(args) {
            if !block.locals.declare(memory, parameter, arg, false) {
                return Err(ReliefError::intermediate_code(format!(
                    "{name} declares parameter {parameter} twice"
                )));
            }
        }
        Ok(())
    }

    fn call_member(&mut self, name: &str, argc: usize, location: CodeLocation) -> ReliefResult<()> {
        let instance = self.object_stack.pop_owned()?;
        let args = match self.object_stack.take(argc) {
            Ok(args) => args,
            Err(error) => {
                self.memory.release(instance);
                return Err(error);
            }
        };
        let call = NativeCall {
            location,
            name,
            args: &args,
        };
        let result = corelib::call_member(self, instance, &call);
        let outcome = self.finish_native_call(result, &args, location);
        self.memory.release(instance);
        outcome
    }

    /// Pushes a native result, then drops the argument references and any objects the
    /// native handed over.
    fn finish_native_call(
        &mut self,
        result: ReliefResult<ObjectId>,
        args: &[ObjectId],
        location: CodeLocation,
    ) -> ReliefResult<()> {
        let pushed = result.and_then(|id| {
            let pushed = self.object_stack.push(&mut self.memory, id, location);
            if pushed.is_err() {
                self.destroy_if_unreferenced(id);
            }
            pushed
        });
        for &arg in args {
            self.memory.release(arg);
        }
        for id in std::mem::take(&mut self.pending_releases) {
            self.memory.release(id);
        }
        pushed
    }

    /// Hands an owned reference to the VM; it is released after the current call's result
    /// is on the stack.
    pub(crate) fn release_after_call(&mut self, id: ObjectId) {
        self.pending_releases.push(id);
    }

    fn yield_map(&mut self, name: &str, location: CodeLocation) -> ReliefResult<()> {
        let value = self.object_stack.pop_owned()?;
        let outcome = self.record_yield(name, value, location);
        self.memory.release(value);
        outcome
    }

    fn record_yield(&mut self, name: &str, value: ObjectId, location: CodeLocation) -> ReliefResult<()> {
        if !matches!(self.memory.value(value), ObjectValue::HeightMap) {
            return Err(ReliefError::script(
                ErrorCode::IncorrectYieldType,
                location,
                format!(
                    "only height maps can be yielded, got {}",
                    self.memory.value(value).type_name()
                ),
            ));
        }
        if !self.script.is_map_supported(name) {
            return Err(ReliefError::script(
                ErrorCode::UnsupportedMapName,
                location,
                format!("map {name} is not declared by the script"),
            ));
        }
        self.generated_maps.insert(name.to_string());
        if !self.arguments.is_map_enabled(name) {
            tracing::debug!(map = name, "yield skipped, map not enabled");
            return Ok(());
        }
        let slot = self.slots.slot_of(value);
        let render_rect = self.render_rectangle();
        self.rendering_sequence.add(RenderingStep::new(
            location,
            StepKind::Yield {
                name: name.to_string(),
                render_rect,
            },
            [],
            slot,
        ))
    }

    /// Logical window yielded maps are cut to, clipped to finite map sizes.
    pub fn render_rectangle(&self) -> Rectangle {
        let axis = |origin: Coordinate, requested: Size1D, map: &MapSizeParameter| {
            let size = match requested {
                MAP_SIZE_AUTOMATIC if map.is_infinite() => RENDER_SIZE_DEFAULT,
                MAP_SIZE_AUTOMATIC => map.value(),
                size => size,
            };
            if map.is_infinite() {
                return Interval::new(origin, size);
            }
            let origin = origin.max(0);
            let available = (i64::from(map.value()) - i64::from(origin)).max(0);
            Interval::new(origin, i64::from(size).min(available) as Size1D)
        };
        let args = &self.arguments;
        Rectangle::from_intervals(
            axis(args.render_origin.x, args.render_width, &args.map_width),
            axis(args.render_origin.y, args.render_height, &args.map_height),
        )
    }

    /// Registers a raster handle, reserves its slot and records the step that creates it.
    pub(crate) fn emit_creator(
        &mut self,
        kind: StepKind,
        arguments: &[ObjectId],
        location: CodeLocation,
    ) -> ReliefResult<ObjectId> {
        let slot_args: Vec<usize> = arguments.iter().map(|&a| self.slots.slot_of(a)).collect();
        let value = match kind.output_kind() {
            ObjectKind::HeightMap => ObjectValue::HeightMap,
            ObjectKind::HeightProfile => ObjectValue::HeightProfile,
        };
        let slot = self.rendering_sequence.allocate_slot();
        self.rendering_sequence
            .add(RenderingStep::new(location, kind, slot_args, slot))?;
        let id = self.memory.register(value);
        self.slots.assign(id, slot, &self.memory);
        Ok(id)
    }

    /// Records an in-place step on `instance` and returns the instance.
    pub(crate) fn emit_in_place(
        &mut self,
        instance: ObjectId,
        kind: StepKind,
        arguments: &[ObjectId],
        location: CodeLocation,
    ) -> ReliefResult<ObjectId> {
        let slot_args: Vec<usize> = arguments.iter().map(|&a| self.slots.slot_of(a)).collect();
        let target = self.slots.slot_of(instance);
        self.rendering_sequence
            .add(RenderingStep::new(location, kind, slot_args, target))?;
        Ok(instance)
    }

    pub(crate) fn print(&mut self, message: String) {
        tracing::info!(target: "relief::script", "{message}");
        self.messages.push(message);
    }

    pub fn arguments(&self) -> &ScriptParameters {
        &self.arguments
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn rendering_sequence(&self) -> &RenderingSequence {
        &self.rendering_sequence
    }

    /// Moves the recorded sequence out, leaving an empty one behind.
    pub fn take_rendering_sequence(&mut self) -> RenderingSequence {
        let empty = RenderingSequence::new(
            self.arguments.render_scale,
            self.config.max_rendering_sequence_length,
        );
        std::mem::replace(&mut self.rendering_sequence, empty)
    }

    pub fn generated_maps(&self) -> &BTreeSet<String> {
        &self.generated_maps
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// Depth of the call stack, the main call included.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn object_stack_len(&self) -> usize {
        self.object_stack.len()
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {}", self.status);
        let _ = writeln!(out, "call stack:");
        out.push_str(&self.call_stack.dump(&self.memory));
        let _ = writeln!(out, "object stack:");
        out.push_str(&self.object_stack.dump(&self.memory));
        let _ = writeln!(out, "globals:");
        out.push_str(&self.globals.dump(&self.memory));
        let _ = writeln!(out, "parameters:");
        out.push_str(&self.arguments.dump());
        let _ = writeln!(out, "rendering sequence:");
        out.push_str(&self.rendering_sequence.dump());
        let _ = writeln!(out, "memory:");
        out.push_str(&self.memory.dump());
        out
    }
}

impl Drop for VirtualMachine<'_> {
    fn drop(&mut self) {
        self.object_stack.truncate(&mut self.memory, 0);
        self.call_stack.release_all(&mut self.memory);
        self.globals.release_all(&mut self.memory);
        for id in std::mem::take(&mut self.pending_releases) {
            self.memory.release(id);
        }
        self.memory.release(self.null);
        let leaked = self.memory.teardown();
        if leaked > 0 {
            tracing::warn!(count = leaked, "objects still alive when the script ended");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/vm.rs"]
mod tests;
