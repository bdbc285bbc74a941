//! Compiles one wasm function body into flat, offset-based bytecode.
//!
//! Wasm instructions address an implicit operand stack; the emitted
//! bytecode addresses byte offsets (slots) into a per-function value
//! stack frame instead. The compiler walks the instruction stream twice:
//!
//! * the **preprocess pass** runs the same symbolic stack evolution as
//!   the emission pass, but its only lasting side effect is the list of
//!   local-variable live ranges. Its bytecode goes into the same writer
//!   and is discarded wholesale before emission, so nothing it produced
//!   can leak into the final buffer;
//! * the **emission pass** produces the bytecode. A `local.get` whose
//!   live range contains no write to that local pushes a stack entry
//!   that aliases the local's home slot directly; otherwise the value
//!   is copied to a fresh slot.
//!
//! Structured control flow is linked on the fly: every open block keeps
//! a snapshot of the symbolic stack and a list of pending forward jumps
//! that are patched exactly once when the block's `end` is reached.
//! `br` to a loop emits a backward jump immediately. After `return`,
//! `br`, `br_table`, `throw` or `unreachable`, emission is suspended
//! until the enclosing block closes; instructions in between are
//! skipped (the up-front validator has already checked them).

#[cfg(test)]
mod tests;

use crate::bytecode as bc;
use crate::bytecode::{BytecodeWriter, OpClass, Opcode};
use crate::error::CompileError;
use crate::module::{CatchInfo, ModuleFunction, ParsingResult};
use crate::value::{stack_allocated_size, to_value_type, value_size, FunctionType, ValueType};
use wasmparser::{BlockType, ConstExpr, FunctionBody, MemArg, Operator, OperatorsReader};

/// One live value on the symbolic stack.
///
/// `position` is the value's effective slot; for a direct local
/// reference it aliases the local's home slot and differs from
/// `non_optimized_position`, the slot the value would occupy if it had
/// been freshly pushed.
#[derive(Debug, Clone, Copy)]
struct StackValue {
    value_type: ValueType,
    position: u32,
    non_optimized_position: u32,
    local_index: Option<u32>,
}

impl StackValue {
    fn allocated_size(&self) -> u32 {
        stack_allocated_size(self.value_type)
    }
}

/// One push of a local, delimited by source byte offsets. The range is
/// open (`end_position == usize::MAX`) until the value is popped.
#[derive(Debug)]
struct LocalUsage {
    local_index: u32,
    start_position: usize,
    end_position: usize,
    /// Number of values referencing this local that were already live
    /// when this push happened.
    #[allow(dead_code)]
    push_count: u32,
    has_write_usage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    IfElse,
    Loop,
    Block,
    TryCatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingJumpKind {
    Jump,
    JumpIf,
    BrTable,
}

/// A forward branch whose target is patched when the block closes.
#[derive(Debug, Clone, Copy)]
struct PendingJump {
    kind: PendingJumpKind,
    position: usize,
}

#[derive(Debug, Clone)]
struct BlockScope {
    kind: BlockKind,
    sig: BlockType,
    /// Bytecode offset at block entry; loop branches jump back here.
    position: usize,
    /// Symbolic stack at entry, after block parameters were bound.
    vm_stack: Vec<StackValue>,
    stack_size: u32,
    restore_at_end: bool,
    generation_stopped: bool,
    pending_jumps: Vec<PendingJump>,
}

/// A handler region opened by `catch`/`catch_all`, transferred to the
/// function's catch table when its `try` block ends.
#[derive(Debug)]
struct PendingCatch {
    depth: usize,
    try_start: usize,
    try_end: usize,
    catch_start: usize,
    tag_index: u32,
}

/// The output of one function-body compile.
pub(crate) struct CompiledBody {
    pub(crate) locals: Vec<ValueType>,
    pub(crate) byte_code: Vec<u8>,
    pub(crate) required_stack_size: u32,
    pub(crate) required_stack_size_due_to_local: u32,
    pub(crate) catch_info: Vec<CatchInfo>,
}

impl CompiledBody {
    pub(crate) fn into_function(self, func_type: FunctionType) -> ModuleFunction {
        let mut func = ModuleFunction::new(func_type);
        func.locals = self.locals;
        func.byte_code = self.byte_code;
        func.required_stack_size = self.required_stack_size;
        func.required_stack_size_due_to_local = self.required_stack_size_due_to_local;
        func.catch_info = self.catch_info;
        func
    }
}

pub(crate) struct FunctionCompiler<'a> {
    result: &'a ParsingResult,
    func_type: FunctionType,
    param_count: usize,
    /// Parameters followed by declared locals.
    locals: Vec<ValueType>,

    code: BytecodeWriter,
    vm_stack: Vec<StackValue>,
    blocks: Vec<BlockScope>,
    pending_catches: Vec<PendingCatch>,
    catch_info: Vec<CatchInfo>,
    local_usage: Vec<LocalUsage>,

    /// Locals area size; the stack starts here.
    initial_stack_size: u32,
    stack_size: u32,
    required_stack_size: u32,
    required_stack_size_due_to_local: u32,

    in_preprocess: bool,
    /// Source byte offset of the instruction being compiled.
    current_offset: usize,
    /// The next operator is a conditional jump or select, so a compare
    /// emitted now gets the merge flag.
    fuse_next: bool,
    /// False while emission is suspended by an unconditional transfer.
    should_continue: bool,
    /// Number of `end`s to skip before emission resumes.
    resume_after_ends: u32,
}

impl<'a> FunctionCompiler<'a> {
    pub(crate) fn new(result: &'a ParsingResult, func_type: FunctionType) -> Self {
        let locals = func_type.params().to_vec();
        let param_count = locals.len();
        let initial_stack_size = func_type.param_stack_size();
        FunctionCompiler {
            result,
            func_type,
            param_count,
            locals,
            code: BytecodeWriter::new(),
            vm_stack: Vec::new(),
            blocks: Vec::new(),
            pending_catches: Vec::new(),
            catch_info: Vec::new(),
            local_usage: Vec::new(),
            initial_stack_size,
            stack_size: initial_stack_size,
            required_stack_size: initial_stack_size,
            required_stack_size_due_to_local: 0,
            in_preprocess: false,
            current_offset: 0,
            fuse_next: false,
            should_continue: true,
            resume_after_ends: 0,
        }
    }

    /// Compile a full function body: liveness pass, reset, emission pass.
    pub(crate) fn compile_body(mut self, body: &FunctionBody<'_>) -> Result<CompiledBody, CompileError> {
        self.read_locals(body)?;

        self.in_preprocess = true;
        self.local_usage.clear();
        self.run_pass(body.get_operators_reader().map_err(CompileError::malformed)?)?;

        self.in_preprocess = false;
        self.reset_for_emission();
        self.run_pass(body.get_operators_reader().map_err(CompileError::malformed)?)?;

        #[cfg(debug_assertions)]
        self.check_final_stack();
        Ok(self.finish())
    }

    /// Compile a constant init expression (no locals, single pass).
    pub(crate) fn compile_init_expr(mut self, expr: &ConstExpr<'_>) -> Result<CompiledBody, CompileError> {
        self.run_pass(expr.get_operators_reader())?;
        Ok(self.finish())
    }

    fn read_locals(&mut self, body: &FunctionBody<'_>) -> Result<(), CompileError> {
        for local in body.get_locals_reader().map_err(CompileError::malformed)? {
            let (count, val_type) = local.map_err(CompileError::malformed)?;
            let ty = to_value_type(val_type)?;
            for _ in 0..count {
                self.locals.push(ty);
                let size = stack_allocated_size(ty);
                self.initial_stack_size += size;
                self.stack_size += size;
                self.required_stack_size_due_to_local += size;
            }
        }
        self.required_stack_size = self.required_stack_size.max(self.stack_size);
        Ok(())
    }

    fn reset_for_emission(&mut self) {
        self.code.clear();
        self.catch_info.clear();
        self.pending_catches.clear();
        self.blocks.clear();
        self.vm_stack.clear();
        self.stack_size = self.initial_stack_size;
        self.should_continue = true;
        self.resume_after_ends = 0;
        self.fuse_next = false;
    }

    fn finish(self) -> CompiledBody {
        CompiledBody {
            locals: self.locals[self.param_count..].to_vec(),
            byte_code: self.code.into_bytes(),
            required_stack_size: self.required_stack_size,
            required_stack_size_due_to_local: self.required_stack_size_due_to_local,
            catch_info: self.catch_info,
        }
    }

    #[cfg(debug_assertions)]
    fn check_final_stack(&mut self) {
        if self.should_continue {
            let results = self.func_type.results().to_vec();
            for r in results.iter().rev() {
                if self.vm_stack.is_empty() {
                    break;
                }
                let entry = self.pop_stack_entry();
                debug_assert_eq!(entry.value_type, *r);
            }
            debug_assert!(self.vm_stack.is_empty());
        }
    }

    fn run_pass(&mut self, mut reader: OperatorsReader<'_>) -> Result<(), CompileError> {
        while !reader.eof() {
            let offset = reader.original_position();
            let op = reader.read().map_err(CompileError::malformed)?;
            self.current_offset = offset;

            if !self.should_continue {
                // Emission is suspended: track block nesting, resume at
                // the `end`/`else`/`catch` of the suspended block, skip
                // everything else. The validator has checked the
                // skipped instructions already.
                match &op {
                    Operator::Block { .. }
                    | Operator::Loop { .. }
                    | Operator::If { .. }
                    | Operator::Try { .. }
                    | Operator::TryTable { .. } => {
                        if self.resume_after_ends > 0 {
                            self.resume_after_ends += 1;
                        }
                        continue;
                    }
                    Operator::End => match self.resume_after_ends {
                        0 => continue,
                        1 => {
                            self.resume_after_ends = 0;
                            self.should_continue = true;
                        }
                        _ => {
                            self.resume_after_ends -= 1;
                            continue;
                        }
                    },
                    Operator::Else | Operator::Catch { .. } | Operator::CatchAll => {
                        if self.resume_after_ends == 1 {
                            self.resume_after_ends = 0;
                            self.should_continue = true;
                        } else {
                            continue;
                        }
                    }
                    _ => continue,
                }
            }

            self.fuse_next = match bc::simple_opcode(&op) {
                Some((_, OpClass::UnaryCompare | OpClass::BinaryCompare)) => {
                    next_is_fuse_candidate(&reader)
                }
                _ => matches!(op, Operator::RefIsNull) && next_is_fuse_candidate(&reader),
            };

            self.compile_operator(op)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Symbolic stack
    // -----------------------------------------------------------------

    fn push_stack_at(
        &mut self,
        ty: ValueType,
        position: u32,
        local_index: Option<u32>,
    ) -> Result<(), CompileError> {
        if self.in_preprocess {
            if let Some(index) = local_index {
                let push_count = self
                    .vm_stack
                    .iter()
                    .filter(|e| e.local_index == Some(index))
                    .count() as u32;
                self.local_usage.push(LocalUsage {
                    local_index: index,
                    start_position: self.current_offset,
                    end_position: usize::MAX,
                    push_count,
                    has_write_usage: false,
                });
            }
        }
        self.vm_stack.push(StackValue {
            value_type: ty,
            position,
            non_optimized_position: self.stack_size,
            local_index,
        });
        self.stack_size += stack_allocated_size(ty);
        if self.stack_size > u16::MAX as u32 {
            return Err(CompileError::StackLimitExceeded);
        }
        self.required_stack_size = self.required_stack_size.max(self.stack_size);
        Ok(())
    }

    fn push_stack(&mut self, ty: ValueType) -> Result<u32, CompileError> {
        let position = self.stack_size;
        self.push_stack_at(ty, position, None)?;
        Ok(position)
    }

    fn pop_stack_entry(&mut self) -> StackValue {
        let entry = self.vm_stack.pop().expect("value stack underflow");
        self.stack_size -= entry.allocated_size();
        if self.in_preprocess {
            if let Some(index) = entry.local_index {
                self.close_usage_for(index);
            }
        }
        entry
    }

    fn pop_stack(&mut self) -> u32 {
        self.pop_stack_entry().position
    }

    fn peek_type(&self) -> ValueType {
        self.vm_stack.last().expect("value stack underflow").value_type
    }

    fn peek_pos(&self) -> u32 {
        self.vm_stack.last().expect("value stack underflow").position
    }

    // -----------------------------------------------------------------
    // Local liveness
    // -----------------------------------------------------------------

    /// Close the most recent still-open usage of `local_index`.
    fn close_usage_for(&mut self, local_index: u32) {
        let position = self.current_offset;
        for usage in self.local_usage.iter_mut().rev() {
            if usage.local_index == local_index && usage.end_position == usize::MAX {
                usage.end_position = position;
                return;
            }
        }
        debug_assert!(false, "no open usage for local {local_index}");
    }

    /// A direct reference is allowed when no recorded live range of the
    /// local covering this offset has seen a write.
    fn can_direct_reference(&self, local_index: u32) -> bool {
        let position = self.current_offset;
        !self.local_usage.iter().any(|u| {
            u.local_index == local_index
                && u.start_position <= position
                && position <= u.end_position
                && u.has_write_usage
        })
    }

    fn mark_write_usage(&mut self, local_index: u32) {
        if !self.in_preprocess {
            return;
        }
        let position = self.current_offset;
        for usage in &mut self.local_usage {
            if usage.local_index == local_index
                && usage.start_position <= position
                && position <= usage.end_position
            {
                usage.has_write_usage = true;
            }
        }
    }

    /// Home slot and allocated size of a local.
    fn local_home(&self, local_index: u32) -> (u32, u32) {
        let mut offset = 0;
        for ty in &self.locals[..local_index as usize] {
            offset += stack_allocated_size(*ty);
        }
        (offset, stack_allocated_size(self.locals[local_index as usize]))
    }

    // -----------------------------------------------------------------
    // Emission helpers
    // -----------------------------------------------------------------

    fn emit_move_if_needed(&mut self, src: u32, dst: u32, ty: ValueType) {
        if src == dst {
            return;
        }
        let code = match value_size(ty) {
            4 => Opcode::Move32,
            8 => Opcode::Move64,
            _ => Opcode::Move128,
        };
        self.code.push(bc::Move::new(code, src as u16, dst as u16));
    }

    fn emit_simple(&mut self, code: Opcode, class: OpClass) -> Result<(), CompileError> {
        let info = code.info();
        match class {
            OpClass::Unary | OpClass::UnaryCompare => {
                debug_assert_eq!(self.peek_type(), info.params[0].value_type());
                let src = self.pop_stack();
                let dst = self.push_stack(info.result.value_type())?;
                let flags = if class == OpClass::UnaryCompare && self.fuse_next {
                    bc::FLAG_MERGE_COMPARE
                } else {
                    0
                };
                self.code
                    .push(bc::UnaryOp::new(code, flags, src as u16, dst as u16));
            }
            OpClass::Binary | OpClass::BinaryCompare => {
                debug_assert_eq!(self.peek_type(), info.params[1].value_type());
                let src1 = self.pop_stack();
                debug_assert_eq!(self.peek_type(), info.params[0].value_type());
                let src0 = self.pop_stack();
                let dst = self.push_stack(info.result.value_type())?;
                let flags = if class == OpClass::BinaryCompare && self.fuse_next {
                    bc::FLAG_MERGE_COMPARE
                } else {
                    0
                };
                self.code.push(bc::BinaryOp::new(
                    code, flags, src0 as u16, src1 as u16, dst as u16,
                ));
            }
            OpClass::Ternary => {
                debug_assert_eq!(self.peek_type(), info.params[2].value_type());
                let src2 = self.pop_stack();
                debug_assert_eq!(self.peek_type(), info.params[1].value_type());
                let src1 = self.pop_stack();
                debug_assert_eq!(self.peek_type(), info.params[0].value_type());
                let src0 = self.pop_stack();
                let dst = self.push_stack(info.result.value_type())?;
                self.code.push(bc::TernaryOp::new(
                    code, src0 as u16, src1 as u16, src2 as u16, dst as u16,
                ));
            }
            OpClass::Reinterpret => {
                let src = self.pop_stack();
                let ty = info.result.value_type();
                let dst = self.push_stack(ty)?;
                self.emit_move_if_needed(src, dst, ty);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Structured control flow
    // -----------------------------------------------------------------

    fn block_at(&self, depth: u32) -> usize {
        self.blocks.len() - 1 - depth as usize
    }

    /// Open a structured block. If the signature takes parameters, the
    /// parameter values are first re-homed to their non-optimized slots
    /// so every branch into the block agrees on their locations; the
    /// snapshot is taken afterwards.
    fn open_block(&mut self, kind: BlockKind, sig: BlockType) {
        let param_count = match sig {
            BlockType::FuncType(idx) => self.result.function_types[idx as usize].params().len(),
            _ => 0,
        };
        for k in 0..param_count {
            let i = self.vm_stack.len() - 1 - k;
            let entry = self.vm_stack[i];
            if let Some(local_index) = entry.local_index {
                self.emit_move_if_needed(
                    entry.position,
                    entry.non_optimized_position,
                    entry.value_type,
                );
                if self.in_preprocess {
                    self.close_usage_for(local_index);
                }
                let entry = &mut self.vm_stack[i];
                entry.position = entry.non_optimized_position;
                entry.local_index = None;
            }
        }
        self.blocks.push(BlockScope {
            kind,
            sig,
            position: self.code.len(),
            vm_stack: self.vm_stack.clone(),
            stack_size: self.stack_size,
            restore_at_end: false,
            generation_stopped: false,
            pending_jumps: Vec::new(),
        });
    }

    fn restore_stack_to(&mut self, scope: &BlockScope) {
        if scope.vm_stack.len() <= self.vm_stack.len() {
            let diff = self.vm_stack.len() - scope.vm_stack.len();
            for _ in 0..diff {
                self.pop_stack_entry();
            }
        }
        self.vm_stack = scope.vm_stack.clone();
        self.stack_size = scope.stack_size;
    }

    /// Rewind the symbolic stack at an `else`/`catch` boundary so the
    /// next arm starts from the block's entry state.
    fn restore_stack_at_block_boundary(&mut self, scope: &BlockScope) {
        if scope.restore_at_end {
            self.restore_stack_to(scope);
        } else if let BlockType::FuncType(idx) = scope.sig {
            let ft = &self.result.function_types[idx as usize];
            if !ft.params().is_empty() {
                self.restore_stack_to(scope);
            } else {
                let results = ft.results().to_vec();
                for r in results.iter().rev() {
                    debug_assert_eq!(self.peek_type(), *r);
                    let _ = r;
                    self.pop_stack_entry();
                }
            }
        } else if let BlockType::Type(ty) = scope.sig {
            debug_assert!(matches!(to_value_type(ty), Ok(t) if t == self.peek_type()));
            self.pop_stack_entry();
        }
    }

    /// When the current block produces values, pin them to their
    /// non-optimized slots so every arm/exit agrees on locations.
    fn keep_branch_results(&mut self) {
        let bi = self.blocks.len() - 1;
        if matches!(self.blocks[bi].sig, BlockType::Empty) {
            return;
        }
        self.blocks[bi].restore_at_end = true;
        let drop = self.drop_bytes_for_branch(0);
        if drop.1 != 0 {
            self.emit_branch_moves(drop);
        }
    }

    /// Bytes to discard above a branch target's snapshot, and the byte
    /// size of the slice that must be preserved across the branch (loop
    /// parameters for loops, results otherwise).
    fn drop_bytes_for_branch(&self, depth: u32) -> (u32, u32) {
        let mut drop_size = 0u32;
        let mut keep_size = 0u32;
        if (depth as usize) < self.blocks.len() {
            let scope = &self.blocks[self.block_at(depth)];
            if scope.vm_stack.len() < self.vm_stack.len() {
                for entry in self.vm_stack.iter().skip(scope.vm_stack.len()) {
                    drop_size += entry.allocated_size();
                }
                match (scope.kind, scope.sig) {
                    (BlockKind::Loop, BlockType::FuncType(idx)) => {
                        let param_size =
                            self.result.function_types[idx as usize].param_stack_size();
                        drop_size += param_size;
                        keep_size += param_size;
                    }
                    (BlockKind::Loop, _) => {}
                    (_, BlockType::FuncType(idx)) => {
                        for r in self.result.function_types[idx as usize].results() {
                            keep_size += stack_allocated_size(*r);
                        }
                    }
                    (_, BlockType::Type(ty)) => {
                        keep_size +=
                            stack_allocated_size(to_value_type(ty).unwrap_or(ValueType::Void));
                    }
                    (_, BlockType::Empty) => {}
                }
            }
        } else if !self.blocks.is_empty() {
            let scope = &self.blocks[0];
            for entry in self.vm_stack.iter().skip(scope.vm_stack.len()) {
                drop_size += entry.allocated_size();
            }
        }
        (drop_size, keep_size)
    }

    /// Index of the entry `bytes` below the stack top, or `None` on a
    /// boundary mismatch (possible only in unreachable code).
    fn walk_back(&self, bytes: u32) -> Option<usize> {
        let mut remaining = bytes as i64;
        let mut index = self.vm_stack.len();
        while remaining > 0 {
            if index == 0 {
                return None;
            }
            index -= 1;
            remaining -= self.vm_stack[index].allocated_size() as i64;
        }
        if remaining == 0 {
            Some(index)
        } else {
            None
        }
    }

    /// Copy the kept slice to the slots a branch target expects,
    /// lowest entry first so overlapping downward moves stay safe.
    fn emit_branch_moves(&mut self, drop: (u32, u32)) {
        let (drop_size, keep_size) = drop;
        debug_assert!(keep_size != 0);
        let (Some(src), Some(dst)) = (self.walk_back(keep_size), self.walk_back(drop_size)) else {
            return;
        };
        let count = self.vm_stack.len() - src;
        for k in 0..count {
            let s = self.vm_stack[src + k];
            let d_pos = self.vm_stack[dst + k].non_optimized_position;
            self.emit_move_if_needed(s.position, d_pos, s.value_type);
        }
    }

    /// Emit the `End` record carrying the function's result slots.
    fn emit_end_code(&mut self, clear_vm_stack: bool) {
        let results = self.func_type.results().to_vec();
        if results.len() > self.vm_stack.len() {
            // degenerate init expression; validation already failed it
            return;
        }
        let pos = self.code.len();
        self.code
            .push(bc::End::new(Opcode::End, results.len() as u16));
        self.code.expand_by(2 * results.len());
        let base = pos + std::mem::size_of::<bc::End>();
        for i in 0..results.len() {
            let slot = self.vm_stack[self.vm_stack.len() - 1 - i].position as u16;
            self.code.write_u16_at(base + 2 * (results.len() - 1 - i), slot);
        }
        if clear_vm_stack {
            for _ in 0..results.len() {
                self.pop_stack_entry();
            }
        }
    }

    fn emit_return(&mut self, clear_vm_stack: bool) {
        #[cfg(debug_assertions)]
        {
            let results = self.func_type.results();
            if self.vm_stack.len() >= results.len() {
                for (i, r) in results.iter().rev().enumerate() {
                    debug_assert_eq!(
                        self.vm_stack[self.vm_stack.len() - 1 - i].value_type,
                        *r
                    );
                }
            }
        }
        self.emit_end_code(false);
        if clear_vm_stack {
            let mut remaining = self.drop_bytes_for_branch(self.blocks.len() as u32).0 as i64;
            while remaining > 0 {
                remaining -= self.pop_stack_entry().allocated_size() as i64;
            }
        } else {
            for _ in 0..self.func_type.results().len() {
                self.pop_stack_entry();
            }
            self.suspend_until_block_end();
        }
        if self.blocks.is_empty() {
            self.should_continue = false;
            self.resume_after_ends = 0;
        }
    }

    /// Stop emitting until the innermost open block ends. The block is
    /// marked so its `end` restores the symbolic stack from the
    /// snapshot.
    fn suspend_until_block_end(&mut self) {
        if self.resume_after_ends > 0 {
            return;
        }
        if let Some(scope) = self.blocks.last_mut() {
            self.resume_after_ends = 1;
            scope.restore_at_end = true;
            scope.generation_stopped = true;
        } else {
            while !self.vm_stack.is_empty() {
                self.pop_stack_entry();
            }
        }
        self.should_continue = false;
    }

    fn handle_if(&mut self, sig: BlockType) -> Result<(), CompileError> {
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let cond = self.pop_stack();
        self.open_block(BlockKind::IfElse, sig);
        let bi = self.blocks.len() - 1;
        let at = self.blocks[bi].position;
        self.blocks[bi].pending_jumps.push(PendingJump {
            kind: PendingJumpKind::JumpIf,
            position: at,
        });
        self.code
            .push(bc::JumpIf::new(Opcode::JumpIfFalse, cond as u16, 0));
        Ok(())
    }

    fn handle_else(&mut self) {
        self.keep_branch_results();
        let bi = self.blocks.len() - 1;
        debug_assert_eq!(self.blocks[bi].kind, BlockKind::IfElse);
        // The entry recorded by `if` is patched here, not at the end.
        self.blocks[bi].pending_jumps.remove(0);

        if !self.blocks[bi].generation_stopped {
            let at = self.code.len();
            self.blocks[bi].pending_jumps.push(PendingJump {
                kind: PendingJumpKind::Jump,
                position: at,
            });
            self.code.push(bc::Jump::new(0));
        }
        self.blocks[bi].generation_stopped = false;

        let scope = self.blocks[bi].clone();
        self.restore_stack_at_block_boundary(&scope);
        let cur = self.code.len();
        self.code
            .patch::<bc::JumpIf>(scope.position, |j| j.offset = (cur - scope.position) as i32);
    }

    fn handle_br(&mut self, depth: u32) -> Result<(), CompileError> {
        if depth as usize == self.blocks.len() {
            // branches past every open block: acts like return
            self.emit_return(true);
            self.suspend_until_block_end();
            return Ok(());
        }
        let drop = self.drop_bytes_for_branch(depth);
        if drop.1 != 0 {
            self.emit_branch_moves(drop);
        }
        let bi = self.block_at(depth);
        let offset = (self.blocks[bi].position as i64 - self.code.len() as i64) as i32;
        if self.blocks[bi].kind != BlockKind::Loop {
            let at = self.code.len();
            self.blocks[bi].pending_jumps.push(PendingJump {
                kind: PendingJumpKind::Jump,
                position: at,
            });
        }
        self.code.push(bc::Jump::new(offset));
        self.suspend_until_block_end();
        Ok(())
    }

    fn handle_br_if(&mut self, depth: u32) -> Result<(), CompileError> {
        if depth as usize == self.blocks.len() {
            // conditional return: jump over an inline End record
            debug_assert_eq!(self.peek_type(), ValueType::I32);
            let cond = self.pop_stack();
            let result_count = self.func_type.results().len();
            let skip = std::mem::size_of::<bc::JumpIf>()
                + std::mem::size_of::<bc::End>()
                + 2 * result_count;
            self.code
                .push(bc::JumpIf::new(Opcode::JumpIfFalse, cond as u16, skip as i32));
            self.emit_end_code(false);
            return Ok(());
        }

        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let cond = self.pop_stack();
        let drop = self.drop_bytes_for_branch(depth);
        if drop.1 != 0 {
            let pos = self.code.len();
            self.code
                .push(bc::JumpIf::new(Opcode::JumpIfFalse, cond as u16, 0));
            self.emit_branch_moves(drop);
            let bi = self.block_at(depth);
            let offset = (self.blocks[bi].position as i64 - self.code.len() as i64) as i32;
            if self.blocks[bi].kind != BlockKind::Loop {
                let at = self.code.len();
                self.blocks[bi].pending_jumps.push(PendingJump {
                    kind: PendingJumpKind::Jump,
                    position: at,
                });
            }
            self.code.push(bc::Jump::new(offset));
            let cur = self.code.len();
            self.code
                .patch::<bc::JumpIf>(pos, |j| j.offset = (cur - pos) as i32);
        } else {
            let bi = self.block_at(depth);
            let offset = (self.blocks[bi].position as i64 - self.code.len() as i64) as i32;
            if self.blocks[bi].kind != BlockKind::Loop {
                let at = self.code.len();
                self.blocks[bi].pending_jumps.push(PendingJump {
                    kind: PendingJumpKind::JumpIf,
                    position: at,
                });
            }
            self.code
                .push(bc::JumpIf::new(Opcode::JumpIfTrue, cond as u16, offset));
        }
        Ok(())
    }

    fn emit_br_table_case(
        &mut self,
        table_pos: usize,
        depth: u32,
        slot_offset: usize,
    ) -> Result<(), CompileError> {
        let offset = (self.code.len() - table_pos) as i32;

        if depth as usize == self.blocks.len() {
            // acts like return
            self.code.write_i32_at(table_pos + slot_offset, offset);
            self.emit_end_code(false);
            return Ok(());
        }

        let drop = self.drop_bytes_for_branch(depth);
        if drop.1 != 0 {
            // needs moves: route through an ordinary branch sequence
            self.code.write_i32_at(table_pos + slot_offset, offset);
            self.handle_br(depth)?;
            return Ok(());
        }

        let bi = self.block_at(depth);
        let mut target = (self.blocks[bi].position as i64 - table_pos as i64) as i32;
        if self.blocks[bi].kind != BlockKind::Loop {
            // store the slot's own in-record offset; the patch at block
            // end turns it into the final target
            target = slot_offset as i32;
            self.blocks[bi].pending_jumps.push(PendingJump {
                kind: PendingJumpKind::BrTable,
                position: table_pos + slot_offset,
            });
        }
        self.code.write_i32_at(table_pos + slot_offset, target);
        Ok(())
    }

    fn handle_br_table(&mut self, targets: &wasmparser::BrTable<'_>) -> Result<(), CompileError> {
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let selector = self.pop_stack();

        let mut depths = Vec::with_capacity(targets.len() as usize);
        for depth in targets.targets() {
            depths.push(depth.map_err(CompileError::malformed)?);
        }
        let default = targets.default();

        let table_pos = self.code.len();
        self.code.push(bc::BrTable::new(
            Opcode::BrTable,
            selector as u16,
            depths.len() as u32,
        ));
        self.code.expand_by(4 * (depths.len() + 1));
        let header = std::mem::size_of::<bc::BrTable>();
        for (i, depth) in depths.iter().enumerate() {
            self.emit_br_table_case(table_pos, *depth, header + 4 * i)?;
        }
        self.emit_br_table_case(table_pos, default, header + 4 * depths.len())?;
        self.suspend_until_block_end();
        Ok(())
    }

    fn handle_end(&mut self) -> Result<(), CompileError> {
        if self.blocks.is_empty() {
            self.emit_end_code(true);
            return Ok(());
        }

        let drop = self.drop_bytes_for_branch(0);
        let scope = self.blocks.pop().expect("block stack underflow");

        if scope.kind == BlockKind::TryCatch {
            let mut i = 0;
            while i < self.pending_catches.len() {
                if self.pending_catches[i].depth - 1 != self.blocks.len() {
                    i += 1;
                    continue;
                }
                let pending = self.pending_catches.remove(i);
                let mut stack_size_at_catch = self.initial_stack_size;
                for entry in self.vm_stack.iter().take(scope.vm_stack.len()) {
                    stack_size_at_catch += entry.allocated_size();
                }
                self.catch_info.push(CatchInfo {
                    try_start: pending.try_start as u32,
                    try_end: pending.try_end as u32,
                    catch_start: pending.catch_start as u32,
                    stack_size_at_catch,
                    tag_index: pending.tag_index,
                });
            }
        }

        if scope.generation_stopped && scope.pending_jumps.is_empty() {
            // nothing jumps here; propagate the suspension outwards
            self.suspend_until_block_end();
            return Ok(());
        }

        if scope.restore_at_end {
            if drop.1 != 0 {
                self.emit_branch_moves(drop);
            }
            self.restore_stack_to(&scope);
            match scope.sig {
                BlockType::FuncType(idx) => {
                    let ft = &self.result.function_types[idx as usize];
                    let params = ft.params().to_vec();
                    let results = ft.results().to_vec();
                    for p in params.iter().rev() {
                        debug_assert_eq!(self.peek_type(), *p);
                        let _ = p;
                        self.pop_stack_entry();
                    }
                    for r in &results {
                        self.push_stack(*r)?;
                    }
                }
                BlockType::Type(ty) => {
                    self.push_stack(to_value_type(ty)?)?;
                }
                BlockType::Empty => {}
            }
        }

        let cur = self.code.len();
        for pending in &scope.pending_jumps {
            let at = pending.position;
            match pending.kind {
                PendingJumpKind::Jump => {
                    self.code.patch::<bc::Jump>(at, |j| j.offset = (cur - at) as i32);
                }
                PendingJumpKind::JumpIf => {
                    self.code
                        .patch::<bc::JumpIf>(at, |j| j.offset = (cur - at) as i32);
                }
                PendingJumpKind::BrTable => {
                    let stored = self.code.read_i32_at(at);
                    self.code
                        .write_i32_at(at, (cur as i64 + stored as i64 - at as i64) as i32);
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Exceptions
    // -----------------------------------------------------------------

    fn handle_throw(&mut self, tag_index: u32) -> Result<(), CompileError> {
        let params = {
            let sig = self.result.tag_types[tag_index as usize].sig_index;
            self.result.function_types[sig as usize].params().to_vec()
        };
        let pos = self.code.len();
        self.code
            .push(bc::Throw::new(Opcode::Throw, tag_index, params.len() as u16));
        self.code.expand_by(2 * params.len());
        let base = pos + std::mem::size_of::<bc::Throw>();
        for i in 0..params.len() {
            let slot = self.vm_stack[self.vm_stack.len() - 1 - i].position as u16;
            self.code.write_u16_at(base + 2 * (params.len() - 1 - i), slot);
        }
        for i in 0..params.len() {
            debug_assert_eq!(self.peek_type(), params[params.len() - 1 - i]);
            self.pop_stack_entry();
        }
        self.suspend_until_block_end();
        Ok(())
    }

    /// Close the current try region and open a handler. `tag_index` is
    /// `u32::MAX` for `catch_all`.
    fn process_catch(&mut self, tag_index: u32) -> Result<(), CompileError> {
        debug_assert!(matches!(
            self.blocks.last().map(|b| b.kind),
            Some(BlockKind::TryCatch)
        ));
        self.keep_branch_results();
        let bi = self.blocks.len() - 1;
        let scope = self.blocks[bi].clone();
        self.restore_stack_at_block_boundary(&scope);

        let mut try_end = self.code.len();
        if let Some(last) = self.pending_catches.last() {
            if last.depth == self.blocks.len() {
                // not the first handler of this try
                try_end = last.try_end;
            }
        }

        if !self.blocks[bi].generation_stopped {
            let at = self.code.len();
            self.blocks[bi].pending_jumps.push(PendingJump {
                kind: PendingJumpKind::Jump,
                position: at,
            });
            self.code.push(bc::Jump::new(0));
        }
        self.blocks[bi].generation_stopped = false;

        self.pending_catches.push(PendingCatch {
            depth: self.blocks.len(),
            try_start: self.blocks[bi].position,
            try_end,
            catch_start: self.code.len(),
            tag_index,
        });

        if tag_index != u32::MAX {
            let params = {
                let sig = self.result.tag_types[tag_index as usize].sig_index;
                self.result.function_types[sig as usize].params().to_vec()
            };
            for p in params {
                self.push_stack(p)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Locals, globals, calls
    // -----------------------------------------------------------------

    fn handle_local_get(&mut self, local_index: u32) -> Result<(), CompileError> {
        let (home, _) = self.local_home(local_index);
        let ty = self.locals[local_index as usize];
        if self.can_direct_reference(local_index) {
            self.push_stack_at(ty, home, Some(local_index))?;
        } else {
            let position = self.stack_size;
            self.push_stack_at(ty, position, Some(local_index))?;
            self.emit_move_if_needed(home, position, ty);
        }
        Ok(())
    }

    fn handle_local_set(&mut self, local_index: u32) {
        let (home, _) = self.local_home(local_index);
        debug_assert_eq!(self.locals[local_index as usize], self.peek_type());
        let src = self.pop_stack_entry();
        self.emit_move_if_needed(src.position, home, src.value_type);
        self.mark_write_usage(local_index);
    }

    fn handle_local_tee(&mut self, local_index: u32) {
        let (home, _) = self.local_home(local_index);
        let ty = self.locals[local_index as usize];
        debug_assert_eq!(ty, self.peek_type());
        let position = self.peek_pos();
        self.emit_move_if_needed(position, home, ty);
        self.mark_write_usage(local_index);
    }

    fn handle_global_get(&mut self, global_index: u32) -> Result<(), CompileError> {
        let ty = self.result.global_types[global_index as usize].value_type;
        let size = stack_allocated_size(ty);
        let slot = self.push_stack(ty)?;
        let code = match size {
            4 => Opcode::GlobalGet32,
            8 => Opcode::GlobalGet64,
            _ => Opcode::GlobalGet128,
        };
        self.code
            .push(bc::GlobalAccess::new(code, slot as u16, global_index));
        Ok(())
    }

    fn handle_global_set(&mut self, global_index: u32) {
        let ty = self.result.global_types[global_index as usize].value_type;
        debug_assert_eq!(self.peek_type(), ty);
        let slot = self.peek_pos();
        let code = match stack_allocated_size(ty) {
            4 => Opcode::GlobalSet32,
            8 => Opcode::GlobalSet64,
            _ => Opcode::GlobalSet128,
        };
        self.code
            .push(bc::GlobalAccess::new(code, slot as u16, global_index));
        self.pop_stack_entry();
    }

    /// Emit a call record followed by one slot per argument, then one
    /// slot per result.
    fn handle_call(&mut self, function_index: u32) -> Result<(), CompileError> {
        let (params, results) = {
            let ft = &self.result.functions[function_index as usize].func_type;
            (ft.params().to_vec(), ft.results().to_vec())
        };
        let total = params.len() + results.len();
        let pos = self.code.len();
        self.code
            .push(bc::Call::new(Opcode::Call, function_index, total as u16));
        self.code.expand_by(2 * total);
        let base = pos + std::mem::size_of::<bc::Call>();
        for i in 0..params.len() {
            debug_assert_eq!(self.peek_type(), params[params.len() - 1 - i]);
            let slot = self.pop_stack() as u16;
            self.code.write_u16_at(base + 2 * (params.len() - 1 - i), slot);
        }
        for (i, r) in results.iter().enumerate() {
            let slot = self.push_stack(*r)? as u16;
            self.code.write_u16_at(base + 2 * (params.len() + i), slot);
        }
        Ok(())
    }

    fn handle_call_indirect(
        &mut self,
        type_index: u32,
        table_index: u32,
    ) -> Result<(), CompileError> {
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let selector = self.pop_stack();
        let (params, results) = {
            let ft = &self.result.function_types[type_index as usize];
            (ft.params().to_vec(), ft.results().to_vec())
        };
        let total = params.len() + results.len();
        let pos = self.code.len();
        self.code.push(bc::CallIndirect::new(
            Opcode::CallIndirect,
            table_index,
            type_index,
            selector as u16,
            total as u16,
        ));
        self.code.expand_by(2 * total);
        let base = pos + std::mem::size_of::<bc::CallIndirect>();
        for i in 0..params.len() {
            debug_assert_eq!(self.peek_type(), params[params.len() - 1 - i]);
            let slot = self.pop_stack() as u16;
            self.code.write_u16_at(base + 2 * (params.len() - 1 - i), slot);
        }
        for (i, r) in results.iter().enumerate() {
            let slot = self.push_stack(*r)? as u16;
            self.code.write_u16_at(base + 2 * (params.len() + i), slot);
        }
        Ok(())
    }

    fn handle_select(&mut self) -> Result<(), CompileError> {
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let cond = self.pop_stack();
        let ty = self.peek_type();
        let src1 = self.pop_stack();
        let src0 = self.pop_stack();
        let dst = self.push_stack(ty)?;
        self.code.push(bc::Select::new(
            Opcode::Select,
            cond as u16,
            value_size(ty) as u16,
            src0 as u16,
            src1 as u16,
            dst as u16,
        ));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Memory access
    // -----------------------------------------------------------------

    fn load_op(&mut self, code: Opcode, memarg: MemArg) -> Result<(), CompileError> {
        let info = code.info();
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src = self.pop_stack();
        let dst = self.push_stack(info.result.value_type())?;
        let offset = memarg.offset as u32;
        match code {
            Opcode::I32Load | Opcode::F32Load if offset == 0 => {
                self.code
                    .push(bc::Load::new(Opcode::Load32, src as u16, dst as u16));
            }
            Opcode::I64Load | Opcode::F64Load if offset == 0 => {
                self.code
                    .push(bc::Load::new(Opcode::Load64, src as u16, dst as u16));
            }
            _ => {
                self.code
                    .push(bc::MemoryLoad::new(code, src as u16, dst as u16, offset));
            }
        }
        Ok(())
    }

    fn store_op(&mut self, code: Opcode, memarg: MemArg) {
        let info = code.info();
        debug_assert_eq!(self.peek_type(), info.params[1].value_type());
        let src1 = self.pop_stack();
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src0 = self.pop_stack();
        let offset = memarg.offset as u32;
        match code {
            Opcode::I32Store | Opcode::F32Store if offset == 0 => {
                self.code
                    .push(bc::Store::new(Opcode::Store32, src0 as u16, src1 as u16));
            }
            Opcode::I64Store | Opcode::F64Store if offset == 0 => {
                self.code
                    .push(bc::Store::new(Opcode::Store64, src0 as u16, src1 as u16));
            }
            _ => {
                self.code
                    .push(bc::MemoryStore::new(code, src0 as u16, src1 as u16, offset));
            }
        }
    }

    fn load_lane_op(&mut self, code: Opcode, memarg: MemArg, lane: u8) -> Result<(), CompileError> {
        debug_assert_eq!(self.peek_type(), ValueType::V128);
        let src1 = self.pop_stack();
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src0 = self.pop_stack();
        let dst = self.push_stack(ValueType::V128)?;
        self.code.push(bc::LoadLane::new(
            code,
            src0 as u16,
            src1 as u16,
            dst as u16,
            lane as u16,
            memarg.offset as u32,
        ));
        Ok(())
    }

    fn store_lane_op(&mut self, code: Opcode, memarg: MemArg, lane: u8) {
        debug_assert_eq!(self.peek_type(), ValueType::V128);
        let src1 = self.pop_stack();
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src0 = self.pop_stack();
        self.code.push(bc::StoreLane::new(
            code,
            src0 as u16,
            src1 as u16,
            lane as u16,
            memarg.offset as u32,
        ));
    }

    fn extract_lane_op(&mut self, code: Opcode, lane: u8) -> Result<(), CompileError> {
        let info = code.info();
        debug_assert_eq!(self.peek_type(), ValueType::V128);
        let src = self.pop_stack();
        let dst = self.push_stack(info.result.value_type())?;
        self.code
            .push(bc::ExtractLane::new(code, lane as u16, src as u16, dst as u16));
        Ok(())
    }

    fn replace_lane_op(&mut self, code: Opcode, lane: u8) -> Result<(), CompileError> {
        let info = code.info();
        debug_assert_eq!(self.peek_type(), info.params[1].value_type());
        let src1 = self.pop_stack();
        debug_assert_eq!(self.peek_type(), ValueType::V128);
        let src0 = self.pop_stack();
        let dst = self.push_stack(ValueType::V128)?;
        self.code.push(bc::ReplaceLane::new(
            code, lane as u16, src0 as u16, src1 as u16, dst as u16,
        ));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    fn compile_operator(&mut self, op: Operator<'_>) -> Result<(), CompileError> {
        if let Some((code, class)) = bc::simple_opcode(&op) {
            return self.emit_simple(code, class);
        }

        match op {
            Operator::Nop => {}
            Operator::Unreachable => {
                self.code.push(bc::Simple::new(Opcode::Unreachable));
                self.suspend_until_block_end();
            }
            Operator::Drop => {
                self.pop_stack_entry();
            }

            Operator::Block { blockty } => self.open_block(BlockKind::Block, blockty),
            Operator::Loop { blockty } => self.open_block(BlockKind::Loop, blockty),
            Operator::Try { blockty } => self.open_block(BlockKind::TryCatch, blockty),
            Operator::If { blockty } => self.handle_if(blockty)?,
            Operator::Else => self.handle_else(),
            Operator::End => self.handle_end()?,
            Operator::Br { relative_depth } => self.handle_br(relative_depth)?,
            Operator::BrIf { relative_depth } => self.handle_br_if(relative_depth)?,
            Operator::BrTable { ref targets } => self.handle_br_table(targets)?,
            Operator::Return => self.emit_return(false),

            Operator::Catch { tag_index } => self.process_catch(tag_index)?,
            Operator::CatchAll => self.process_catch(u32::MAX)?,
            Operator::Throw { tag_index } => self.handle_throw(tag_index)?,

            Operator::Call { function_index } => self.handle_call(function_index)?,
            Operator::CallIndirect {
                type_index,
                table_index,
                ..
            } => self.handle_call_indirect(type_index, table_index)?,

            Operator::Select | Operator::TypedSelect { .. } => self.handle_select()?,

            Operator::LocalGet { local_index } => self.handle_local_get(local_index)?,
            Operator::LocalSet { local_index } => self.handle_local_set(local_index),
            Operator::LocalTee { local_index } => self.handle_local_tee(local_index),
            Operator::GlobalGet { global_index } => self.handle_global_get(global_index)?,
            Operator::GlobalSet { global_index } => self.handle_global_set(global_index),

            Operator::I32Const { value } => {
                let dst = self.push_stack(ValueType::I32)?;
                self.code
                    .push(bc::Const32::new(Opcode::Const32, dst as u16, value as u32));
            }
            Operator::I64Const { value } => {
                let dst = self.push_stack(ValueType::I64)?;
                self.code
                    .push(bc::Const64::new(Opcode::Const64, dst as u16, value as u64));
            }
            Operator::F32Const { value } => {
                let dst = self.push_stack(ValueType::F32)?;
                self.code
                    .push(bc::Const32::new(Opcode::Const32, dst as u16, value.bits()));
            }
            Operator::F64Const { value } => {
                let dst = self.push_stack(ValueType::F64)?;
                self.code
                    .push(bc::Const64::new(Opcode::Const64, dst as u16, value.bits()));
            }
            Operator::V128Const { value } => {
                let dst = self.push_stack(ValueType::V128)?;
                let bytes = (value.i128() as u128).to_le_bytes();
                self.code
                    .push(bc::Const128::new(Opcode::Const128, dst as u16, bytes));
            }

            Operator::RefNull { hty } => {
                let ty = heap_value_type(hty)?;
                let dst = self.push_stack(ty)?;
                if self.result.ref_size == 4 {
                    self.code.push(bc::Const32::new(Opcode::Const32, dst as u16, 0));
                } else {
                    self.code.push(bc::Const64::new(Opcode::Const64, dst as u16, 0));
                }
            }
            Operator::RefIsNull => {
                let src = self.pop_stack();
                let dst = self.push_stack(ValueType::I32)?;
                let flags = if self.fuse_next { bc::FLAG_MERGE_COMPARE } else { 0 };
                let code = if self.result.ref_size == 4 {
                    Opcode::I32Eqz
                } else {
                    Opcode::I64Eqz
                };
                self.code
                    .push(bc::UnaryOp::new(code, flags, src as u16, dst as u16));
            }
            Operator::RefFunc { function_index } => {
                let dst = self.push_stack(ValueType::FuncRef)?;
                self.code
                    .push(bc::RefFunc::new(Opcode::RefFunc, function_index, dst as u16));
            }

            Operator::MemorySize { mem, .. } => {
                let dst = self.push_stack(ValueType::I32)?;
                self.code
                    .push(bc::MemorySize::new(Opcode::MemorySize, mem, dst as u16));
            }
            Operator::MemoryGrow { mem, .. } => {
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src = self.pop_stack();
                let dst = self.push_stack(ValueType::I32)?;
                self.code.push(bc::MemoryGrow::new(
                    Opcode::MemoryGrow,
                    mem,
                    src as u16,
                    dst as u16,
                ));
            }
            Operator::MemoryInit { data_index, mem } => {
                let (src0, src1, src2) = self.pop_three_i32();
                self.code.push(bc::BulkMemory::new(
                    Opcode::MemoryInit,
                    mem,
                    data_index,
                    src0,
                    src1,
                    src2,
                ));
            }
            Operator::MemoryCopy { dst_mem, src_mem } => {
                let (src0, src1, src2) = self.pop_three_i32();
                self.code.push(bc::BulkMemory::new(
                    Opcode::MemoryCopy,
                    src_mem,
                    dst_mem,
                    src0,
                    src1,
                    src2,
                ));
            }
            Operator::MemoryFill { mem } => {
                let (src0, src1, src2) = self.pop_three_i32();
                self.code
                    .push(bc::BulkMemory::new(Opcode::MemoryFill, mem, 0, src0, src1, src2));
            }
            Operator::DataDrop { data_index } => {
                self.code
                    .push(bc::SegmentDrop::new(Opcode::DataDrop, data_index));
            }
            Operator::ElemDrop { elem_index } => {
                self.code
                    .push(bc::SegmentDrop::new(Opcode::ElemDrop, elem_index));
            }
            Operator::TableInit { elem_index, table } => {
                let (src0, src1, src2) = self.pop_three_i32();
                self.code.push(bc::BulkMemory::new(
                    Opcode::TableInit,
                    table,
                    elem_index,
                    src0,
                    src1,
                    src2,
                ));
            }
            Operator::TableCopy {
                dst_table,
                src_table,
            } => {
                let (src0, src1, src2) = self.pop_three_i32();
                self.code.push(bc::BulkMemory::new(
                    Opcode::TableCopy,
                    dst_table,
                    src_table,
                    src0,
                    src1,
                    src2,
                ));
            }
            Operator::TableFill { table } => {
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src2 = self.pop_stack() as u16;
                let src1 = self.pop_stack() as u16;
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src0 = self.pop_stack() as u16;
                self.code
                    .push(bc::BulkMemory::new(Opcode::TableFill, table, 0, src0, src1, src2));
            }
            Operator::TableGet { table } => {
                let element_type = self.result.table_types[table as usize].element_type;
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src = self.pop_stack();
                let dst = self.push_stack(element_type)?;
                self.code
                    .push(bc::TableGet::new(Opcode::TableGet, table, src as u16, dst as u16));
            }
            Operator::TableSet { table } => {
                let src1 = self.pop_stack();
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src0 = self.pop_stack();
                self.code.push(bc::TableSet::new(
                    Opcode::TableSet,
                    table,
                    src0 as u16,
                    src1 as u16,
                ));
            }
            Operator::TableGrow { table } => {
                debug_assert_eq!(self.peek_type(), ValueType::I32);
                let src1 = self.pop_stack();
                let src0 = self.pop_stack();
                let dst = self.push_stack(ValueType::I32)?;
                self.code.push(bc::TableGrow::new(
                    Opcode::TableGrow,
                    table,
                    src0 as u16,
                    src1 as u16,
                    dst as u16,
                ));
            }
            Operator::TableSize { table } => {
                let dst = self.push_stack(ValueType::I32)?;
                self.code
                    .push(bc::TableSize::new(Opcode::TableSize, table, dst as u16));
            }

            Operator::I32Load { memarg } => self.load_op(Opcode::I32Load, memarg)?,
            Operator::I64Load { memarg } => self.load_op(Opcode::I64Load, memarg)?,
            Operator::F32Load { memarg } => self.load_op(Opcode::F32Load, memarg)?,
            Operator::F64Load { memarg } => self.load_op(Opcode::F64Load, memarg)?,
            Operator::I32Load8S { memarg } => self.load_op(Opcode::I32Load8S, memarg)?,
            Operator::I32Load8U { memarg } => self.load_op(Opcode::I32Load8U, memarg)?,
            Operator::I32Load16S { memarg } => self.load_op(Opcode::I32Load16S, memarg)?,
            Operator::I32Load16U { memarg } => self.load_op(Opcode::I32Load16U, memarg)?,
            Operator::I64Load8S { memarg } => self.load_op(Opcode::I64Load8S, memarg)?,
            Operator::I64Load8U { memarg } => self.load_op(Opcode::I64Load8U, memarg)?,
            Operator::I64Load16S { memarg } => self.load_op(Opcode::I64Load16S, memarg)?,
            Operator::I64Load16U { memarg } => self.load_op(Opcode::I64Load16U, memarg)?,
            Operator::I64Load32S { memarg } => self.load_op(Opcode::I64Load32S, memarg)?,
            Operator::I64Load32U { memarg } => self.load_op(Opcode::I64Load32U, memarg)?,
            Operator::V128Load { memarg } => self.load_op(Opcode::V128Load, memarg)?,
            Operator::V128Load8x8S { memarg } => self.load_op(Opcode::V128Load8X8S, memarg)?,
            Operator::V128Load8x8U { memarg } => self.load_op(Opcode::V128Load8X8U, memarg)?,
            Operator::V128Load16x4S { memarg } => self.load_op(Opcode::V128Load16X4S, memarg)?,
            Operator::V128Load16x4U { memarg } => self.load_op(Opcode::V128Load16X4U, memarg)?,
            Operator::V128Load32x2S { memarg } => self.load_op(Opcode::V128Load32X2S, memarg)?,
            Operator::V128Load32x2U { memarg } => self.load_op(Opcode::V128Load32X2U, memarg)?,
            Operator::V128Load8Splat { memarg } => self.load_op(Opcode::V128Load8Splat, memarg)?,
            Operator::V128Load16Splat { memarg } => {
                self.load_op(Opcode::V128Load16Splat, memarg)?
            }
            Operator::V128Load32Splat { memarg } => {
                self.load_op(Opcode::V128Load32Splat, memarg)?
            }
            Operator::V128Load64Splat { memarg } => {
                self.load_op(Opcode::V128Load64Splat, memarg)?
            }
            Operator::V128Load32Zero { memarg } => self.load_op(Opcode::V128Load32Zero, memarg)?,
            Operator::V128Load64Zero { memarg } => self.load_op(Opcode::V128Load64Zero, memarg)?,

            Operator::I32Store { memarg } => self.store_op(Opcode::I32Store, memarg),
            Operator::I64Store { memarg } => self.store_op(Opcode::I64Store, memarg),
            Operator::F32Store { memarg } => self.store_op(Opcode::F32Store, memarg),
            Operator::F64Store { memarg } => self.store_op(Opcode::F64Store, memarg),
            Operator::I32Store8 { memarg } => self.store_op(Opcode::I32Store8, memarg),
            Operator::I32Store16 { memarg } => self.store_op(Opcode::I32Store16, memarg),
            Operator::I64Store8 { memarg } => self.store_op(Opcode::I64Store8, memarg),
            Operator::I64Store16 { memarg } => self.store_op(Opcode::I64Store16, memarg),
            Operator::I64Store32 { memarg } => self.store_op(Opcode::I64Store32, memarg),
            Operator::V128Store { memarg } => self.store_op(Opcode::V128Store, memarg),

            Operator::V128Load8Lane { memarg, lane } => {
                self.load_lane_op(Opcode::V128Load8Lane, memarg, lane)?
            }
            Operator::V128Load16Lane { memarg, lane } => {
                self.load_lane_op(Opcode::V128Load16Lane, memarg, lane)?
            }
            Operator::V128Load32Lane { memarg, lane } => {
                self.load_lane_op(Opcode::V128Load32Lane, memarg, lane)?
            }
            Operator::V128Load64Lane { memarg, lane } => {
                self.load_lane_op(Opcode::V128Load64Lane, memarg, lane)?
            }
            Operator::V128Store8Lane { memarg, lane } => {
                self.store_lane_op(Opcode::V128Store8Lane, memarg, lane)
            }
            Operator::V128Store16Lane { memarg, lane } => {
                self.store_lane_op(Opcode::V128Store16Lane, memarg, lane)
            }
            Operator::V128Store32Lane { memarg, lane } => {
                self.store_lane_op(Opcode::V128Store32Lane, memarg, lane)
            }
            Operator::V128Store64Lane { memarg, lane } => {
                self.store_lane_op(Opcode::V128Store64Lane, memarg, lane)
            }

            Operator::I8x16ExtractLaneS { lane } => {
                self.extract_lane_op(Opcode::I8X16ExtractLaneS, lane)?
            }
            Operator::I8x16ExtractLaneU { lane } => {
                self.extract_lane_op(Opcode::I8X16ExtractLaneU, lane)?
            }
            Operator::I16x8ExtractLaneS { lane } => {
                self.extract_lane_op(Opcode::I16X8ExtractLaneS, lane)?
            }
            Operator::I16x8ExtractLaneU { lane } => {
                self.extract_lane_op(Opcode::I16X8ExtractLaneU, lane)?
            }
            Operator::I32x4ExtractLane { lane } => {
                self.extract_lane_op(Opcode::I32X4ExtractLane, lane)?
            }
            Operator::I64x2ExtractLane { lane } => {
                self.extract_lane_op(Opcode::I64X2ExtractLane, lane)?
            }
            Operator::F32x4ExtractLane { lane } => {
                self.extract_lane_op(Opcode::F32X4ExtractLane, lane)?
            }
            Operator::F64x2ExtractLane { lane } => {
                self.extract_lane_op(Opcode::F64X2ExtractLane, lane)?
            }
            Operator::I8x16ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::I8X16ReplaceLane, lane)?
            }
            Operator::I16x8ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::I16X8ReplaceLane, lane)?
            }
            Operator::I32x4ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::I32X4ReplaceLane, lane)?
            }
            Operator::I64x2ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::I64X2ReplaceLane, lane)?
            }
            Operator::F32x4ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::F32X4ReplaceLane, lane)?
            }
            Operator::F64x2ReplaceLane { lane } => {
                self.replace_lane_op(Opcode::F64X2ReplaceLane, lane)?
            }
            Operator::I8x16Shuffle { lanes } => {
                debug_assert_eq!(self.peek_type(), ValueType::V128);
                let src1 = self.pop_stack();
                debug_assert_eq!(self.peek_type(), ValueType::V128);
                let src0 = self.pop_stack();
                let dst = self.push_stack(ValueType::V128)?;
                self.code.push(bc::Shuffle::new(
                    Opcode::I8X16Shuffle,
                    src0 as u16,
                    src1 as u16,
                    dst as u16,
                    lanes,
                ));
            }

            op => return Err(CompileError::unsupported(&op)),
        }
        Ok(())
    }

    fn pop_three_i32(&mut self) -> (u16, u16, u16) {
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src2 = self.pop_stack() as u16;
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src1 = self.pop_stack() as u16;
        debug_assert_eq!(self.peek_type(), ValueType::I32);
        let src0 = self.pop_stack() as u16;
        (src0, src1, src2)
    }
}

/// Reference types lower to integer slots of the configured width; only
/// the two abstract reference heap types are representable.
fn heap_value_type(hty: wasmparser::HeapType) -> Result<ValueType, CompileError> {
    if hty == wasmparser::HeapType::FUNC {
        Ok(ValueType::FuncRef)
    } else if hty == wasmparser::HeapType::EXTERN {
        Ok(ValueType::ExternRef)
    } else {
        Err(CompileError::Unsupported(format!(
            "heap type {hty:?} is not supported"
        )))
    }
}

/// One-token lookahead for compare fusion.
fn next_is_fuse_candidate(reader: &OperatorsReader<'_>) -> bool {
    let mut look = reader.clone();
    matches!(
        look.read(),
        Ok(Operator::If { .. }
            | Operator::BrIf { .. }
            | Operator::Select
            | Operator::TypedSelect { .. })
    )
}
