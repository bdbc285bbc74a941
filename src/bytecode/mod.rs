//! The flat bytecode IR: opcodes, per-opcode metadata and record layouts.
//!
//! Every record is a `#[repr(C, packed)]` plain-old-data struct that
//! starts with its opcode as a `u16`. A consumer walks the buffer
//! linearly: the opcode determines the record shape (and therefore its
//! size), and variable-width records (`Call`, `End`, `BrTable`, `Throw`,
//! `CallIndirect`) carry a trailing slot array sized by one of their
//! header fields.
//!
//! The opcode enum, the info table and the record shape are generated
//! from a single macro list so they cannot drift apart.

mod writer;

pub mod dump;

pub(crate) use writer::BytecodeWriter;
pub use writer::StackOffset;

use crate::value::ValueType;
use wasmparser::Operator;

/// Operand/result type of an opcode in the info table.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    ___,
    I32,
    I64,
    F32,
    F64,
    V128,
}

impl CodeType {
    pub(crate) fn value_type(self) -> ValueType {
        match self {
            CodeType::I32 => ValueType::I32,
            CodeType::I64 => ValueType::I64,
            CodeType::F32 => ValueType::F32,
            CodeType::F64 => ValueType::F64,
            CodeType::V128 => ValueType::V128,
            CodeType::___ => ValueType::Void,
        }
    }
}

/// Physical layout family of a record, keyed by opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Simple,
    Unary,
    Binary,
    Ternary,
    Const32,
    Const64,
    Const128,
    Move,
    GlobalAccess,
    Load,
    Store,
    MemoryLoad,
    MemoryStore,
    LoadLane,
    StoreLane,
    ExtractLane,
    ReplaceLane,
    Shuffle,
    Jump,
    JumpIf,
    BrTable,
    End,
    Call,
    CallIndirect,
    Select,
    Throw,
    RefFunc,
    BulkMemory,
    SegmentDrop,
    MemorySize,
    MemoryGrow,
    TableGet,
    TableSet,
    TableGrow,
    TableSize,
}

/// Static metadata for one opcode: result type, up to three operand
/// types and a display name.
#[derive(Debug)]
pub struct OpInfo {
    pub result: CodeType,
    pub params: [CodeType; 3],
    pub name: &'static str,
}

macro_rules! for_each_opcode {
    ($mac:ident) => {
        $mac! {
            // --- control & data movement ---
            (Unreachable, Simple, ___, ___, ___, ___, "unreachable"),
            (Jump, Jump, ___, ___, ___, ___, "jump"),
            (JumpIfTrue, JumpIf, ___, I32, ___, ___, "jump_if_true"),
            (JumpIfFalse, JumpIf, ___, I32, ___, ___, "jump_if_false"),
            (BrTable, BrTable, ___, I32, ___, ___, "br_table"),
            (End, End, ___, ___, ___, ___, "end"),
            (Call, Call, ___, ___, ___, ___, "call"),
            (CallIndirect, CallIndirect, ___, I32, ___, ___, "call_indirect"),
            (Select, Select, ___, ___, ___, ___, "select"),
            (Throw, Throw, ___, ___, ___, ___, "throw"),
            (Move32, Move, ___, ___, ___, ___, "move.32"),
            (Move64, Move, ___, ___, ___, ___, "move.64"),
            (Move128, Move, ___, ___, ___, ___, "move.128"),
            (Const32, Const32, ___, ___, ___, ___, "const.32"),
            (Const64, Const64, ___, ___, ___, ___, "const.64"),
            (Const128, Const128, ___, ___, ___, ___, "const.128"),
            (GlobalGet32, GlobalAccess, ___, ___, ___, ___, "global.get.32"),
            (GlobalGet64, GlobalAccess, ___, ___, ___, ___, "global.get.64"),
            (GlobalGet128, GlobalAccess, ___, ___, ___, ___, "global.get.128"),
            (GlobalSet32, GlobalAccess, ___, ___, ___, ___, "global.set.32"),
            (GlobalSet64, GlobalAccess, ___, ___, ___, ___, "global.set.64"),
            (GlobalSet128, GlobalAccess, ___, ___, ___, ___, "global.set.128"),
            (RefFunc, RefFunc, ___, ___, ___, ___, "ref.func"),
            (Load32, Load, ___, I32, ___, ___, "load.32"),
            (Load64, Load, ___, I32, ___, ___, "load.64"),
            (Store32, Store, ___, I32, ___, ___, "store.32"),
            (Store64, Store, ___, I32, ___, ___, "store.64"),
            (MemorySize, MemorySize, I32, ___, ___, ___, "memory.size"),
            (MemoryGrow, MemoryGrow, I32, I32, ___, ___, "memory.grow"),
            (MemoryInit, BulkMemory, ___, I32, I32, I32, "memory.init"),
            (MemoryCopy, BulkMemory, ___, I32, I32, I32, "memory.copy"),
            (MemoryFill, BulkMemory, ___, I32, I32, I32, "memory.fill"),
            (DataDrop, SegmentDrop, ___, ___, ___, ___, "data.drop"),
            (ElemDrop, SegmentDrop, ___, ___, ___, ___, "elem.drop"),
            (TableInit, BulkMemory, ___, I32, I32, I32, "table.init"),
            (TableCopy, BulkMemory, ___, I32, I32, I32, "table.copy"),
            (TableFill, BulkMemory, ___, I32, ___, I32, "table.fill"),
            (TableGet, TableGet, ___, I32, ___, ___, "table.get"),
            (TableSet, TableSet, ___, I32, ___, ___, "table.set"),
            (TableGrow, TableGrow, I32, ___, I32, ___, "table.grow"),
            (TableSize, TableSize, I32, ___, ___, ___, "table.size"),
            // --- i32 ---
            (I32Eqz, Unary, I32, I32, ___, ___, "i32.eqz"),
            (I32Eq, Binary, I32, I32, I32, ___, "i32.eq"),
            (I32Ne, Binary, I32, I32, I32, ___, "i32.ne"),
            (I32LtS, Binary, I32, I32, I32, ___, "i32.lt_s"),
            (I32LtU, Binary, I32, I32, I32, ___, "i32.lt_u"),
            (I32GtS, Binary, I32, I32, I32, ___, "i32.gt_s"),
            (I32GtU, Binary, I32, I32, I32, ___, "i32.gt_u"),
            (I32LeS, Binary, I32, I32, I32, ___, "i32.le_s"),
            (I32LeU, Binary, I32, I32, I32, ___, "i32.le_u"),
            (I32GeS, Binary, I32, I32, I32, ___, "i32.ge_s"),
            (I32GeU, Binary, I32, I32, I32, ___, "i32.ge_u"),
            (I32Clz, Unary, I32, I32, ___, ___, "i32.clz"),
            (I32Ctz, Unary, I32, I32, ___, ___, "i32.ctz"),
            (I32Popcnt, Unary, I32, I32, ___, ___, "i32.popcnt"),
            (I32Add, Binary, I32, I32, I32, ___, "i32.add"),
            (I32Sub, Binary, I32, I32, I32, ___, "i32.sub"),
            (I32Mul, Binary, I32, I32, I32, ___, "i32.mul"),
            (I32DivS, Binary, I32, I32, I32, ___, "i32.div_s"),
            (I32DivU, Binary, I32, I32, I32, ___, "i32.div_u"),
            (I32RemS, Binary, I32, I32, I32, ___, "i32.rem_s"),
            (I32RemU, Binary, I32, I32, I32, ___, "i32.rem_u"),
            (I32And, Binary, I32, I32, I32, ___, "i32.and"),
            (I32Or, Binary, I32, I32, I32, ___, "i32.or"),
            (I32Xor, Binary, I32, I32, I32, ___, "i32.xor"),
            (I32Shl, Binary, I32, I32, I32, ___, "i32.shl"),
            (I32ShrS, Binary, I32, I32, I32, ___, "i32.shr_s"),
            (I32ShrU, Binary, I32, I32, I32, ___, "i32.shr_u"),
            (I32Rotl, Binary, I32, I32, I32, ___, "i32.rotl"),
            (I32Rotr, Binary, I32, I32, I32, ___, "i32.rotr"),
            (I32Extend8S, Unary, I32, I32, ___, ___, "i32.extend8_s"),
            (I32Extend16S, Unary, I32, I32, ___, ___, "i32.extend16_s"),
            // --- i64 ---
            (I64Eqz, Unary, I32, I64, ___, ___, "i64.eqz"),
            (I64Eq, Binary, I32, I64, I64, ___, "i64.eq"),
            (I64Ne, Binary, I32, I64, I64, ___, "i64.ne"),
            (I64LtS, Binary, I32, I64, I64, ___, "i64.lt_s"),
            (I64LtU, Binary, I32, I64, I64, ___, "i64.lt_u"),
            (I64GtS, Binary, I32, I64, I64, ___, "i64.gt_s"),
            (I64GtU, Binary, I32, I64, I64, ___, "i64.gt_u"),
            (I64LeS, Binary, I32, I64, I64, ___, "i64.le_s"),
            (I64LeU, Binary, I32, I64, I64, ___, "i64.le_u"),
            (I64GeS, Binary, I32, I64, I64, ___, "i64.ge_s"),
            (I64GeU, Binary, I32, I64, I64, ___, "i64.ge_u"),
            (I64Clz, Unary, I64, I64, ___, ___, "i64.clz"),
            (I64Ctz, Unary, I64, I64, ___, ___, "i64.ctz"),
            (I64Popcnt, Unary, I64, I64, ___, ___, "i64.popcnt"),
            (I64Add, Binary, I64, I64, I64, ___, "i64.add"),
            (I64Sub, Binary, I64, I64, I64, ___, "i64.sub"),
            (I64Mul, Binary, I64, I64, I64, ___, "i64.mul"),
            (I64DivS, Binary, I64, I64, I64, ___, "i64.div_s"),
            (I64DivU, Binary, I64, I64, I64, ___, "i64.div_u"),
            (I64RemS, Binary, I64, I64, I64, ___, "i64.rem_s"),
            (I64RemU, Binary, I64, I64, I64, ___, "i64.rem_u"),
            (I64And, Binary, I64, I64, I64, ___, "i64.and"),
            (I64Or, Binary, I64, I64, I64, ___, "i64.or"),
            (I64Xor, Binary, I64, I64, I64, ___, "i64.xor"),
            (I64Shl, Binary, I64, I64, I64, ___, "i64.shl"),
            (I64ShrS, Binary, I64, I64, I64, ___, "i64.shr_s"),
            (I64ShrU, Binary, I64, I64, I64, ___, "i64.shr_u"),
            (I64Rotl, Binary, I64, I64, I64, ___, "i64.rotl"),
            (I64Rotr, Binary, I64, I64, I64, ___, "i64.rotr"),
            (I64Extend8S, Unary, I64, I64, ___, ___, "i64.extend8_s"),
            (I64Extend16S, Unary, I64, I64, ___, ___, "i64.extend16_s"),
            (I64Extend32S, Unary, I64, I64, ___, ___, "i64.extend32_s"),
            // --- f32 ---
            (F32Eq, Binary, I32, F32, F32, ___, "f32.eq"),
            (F32Ne, Binary, I32, F32, F32, ___, "f32.ne"),
            (F32Lt, Binary, I32, F32, F32, ___, "f32.lt"),
            (F32Gt, Binary, I32, F32, F32, ___, "f32.gt"),
            (F32Le, Binary, I32, F32, F32, ___, "f32.le"),
            (F32Ge, Binary, I32, F32, F32, ___, "f32.ge"),
            (F32Abs, Unary, F32, F32, ___, ___, "f32.abs"),
            (F32Neg, Unary, F32, F32, ___, ___, "f32.neg"),
            (F32Ceil, Unary, F32, F32, ___, ___, "f32.ceil"),
            (F32Floor, Unary, F32, F32, ___, ___, "f32.floor"),
            (F32Trunc, Unary, F32, F32, ___, ___, "f32.trunc"),
            (F32Nearest, Unary, F32, F32, ___, ___, "f32.nearest"),
            (F32Sqrt, Unary, F32, F32, ___, ___, "f32.sqrt"),
            (F32Add, Binary, F32, F32, F32, ___, "f32.add"),
            (F32Sub, Binary, F32, F32, F32, ___, "f32.sub"),
            (F32Mul, Binary, F32, F32, F32, ___, "f32.mul"),
            (F32Div, Binary, F32, F32, F32, ___, "f32.div"),
            (F32Min, Binary, F32, F32, F32, ___, "f32.min"),
            (F32Max, Binary, F32, F32, F32, ___, "f32.max"),
            (F32Copysign, Binary, F32, F32, F32, ___, "f32.copysign"),
            // --- f64 ---
            (F64Eq, Binary, I32, F64, F64, ___, "f64.eq"),
            (F64Ne, Binary, I32, F64, F64, ___, "f64.ne"),
            (F64Lt, Binary, I32, F64, F64, ___, "f64.lt"),
            (F64Gt, Binary, I32, F64, F64, ___, "f64.gt"),
            (F64Le, Binary, I32, F64, F64, ___, "f64.le"),
            (F64Ge, Binary, I32, F64, F64, ___, "f64.ge"),
            (F64Abs, Unary, F64, F64, ___, ___, "f64.abs"),
            (F64Neg, Unary, F64, F64, ___, ___, "f64.neg"),
            (F64Ceil, Unary, F64, F64, ___, ___, "f64.ceil"),
            (F64Floor, Unary, F64, F64, ___, ___, "f64.floor"),
            (F64Trunc, Unary, F64, F64, ___, ___, "f64.trunc"),
            (F64Nearest, Unary, F64, F64, ___, ___, "f64.nearest"),
            (F64Sqrt, Unary, F64, F64, ___, ___, "f64.sqrt"),
            (F64Add, Binary, F64, F64, F64, ___, "f64.add"),
            (F64Sub, Binary, F64, F64, F64, ___, "f64.sub"),
            (F64Mul, Binary, F64, F64, F64, ___, "f64.mul"),
            (F64Div, Binary, F64, F64, F64, ___, "f64.div"),
            (F64Min, Binary, F64, F64, F64, ___, "f64.min"),
            (F64Max, Binary, F64, F64, F64, ___, "f64.max"),
            (F64Copysign, Binary, F64, F64, F64, ___, "f64.copysign"),
            // --- conversions ---
            (I32WrapI64, Unary, I32, I64, ___, ___, "i32.wrap_i64"),
            (I32TruncF32S, Unary, I32, F32, ___, ___, "i32.trunc_f32_s"),
            (I32TruncF32U, Unary, I32, F32, ___, ___, "i32.trunc_f32_u"),
            (I32TruncF64S, Unary, I32, F64, ___, ___, "i32.trunc_f64_s"),
            (I32TruncF64U, Unary, I32, F64, ___, ___, "i32.trunc_f64_u"),
            (I64ExtendI32S, Unary, I64, I32, ___, ___, "i64.extend_i32_s"),
            (I64ExtendI32U, Unary, I64, I32, ___, ___, "i64.extend_i32_u"),
            (I64TruncF32S, Unary, I64, F32, ___, ___, "i64.trunc_f32_s"),
            (I64TruncF32U, Unary, I64, F32, ___, ___, "i64.trunc_f32_u"),
            (I64TruncF64S, Unary, I64, F64, ___, ___, "i64.trunc_f64_s"),
            (I64TruncF64U, Unary, I64, F64, ___, ___, "i64.trunc_f64_u"),
            (F32ConvertI32S, Unary, F32, I32, ___, ___, "f32.convert_i32_s"),
            (F32ConvertI32U, Unary, F32, I32, ___, ___, "f32.convert_i32_u"),
            (F32ConvertI64S, Unary, F32, I64, ___, ___, "f32.convert_i64_s"),
            (F32ConvertI64U, Unary, F32, I64, ___, ___, "f32.convert_i64_u"),
            (F32DemoteF64, Unary, F32, F64, ___, ___, "f32.demote_f64"),
            (F64ConvertI32S, Unary, F64, I32, ___, ___, "f64.convert_i32_s"),
            (F64ConvertI32U, Unary, F64, I32, ___, ___, "f64.convert_i32_u"),
            (F64ConvertI64S, Unary, F64, I64, ___, ___, "f64.convert_i64_s"),
            (F64ConvertI64U, Unary, F64, I64, ___, ___, "f64.convert_i64_u"),
            (F64PromoteF32, Unary, F64, F32, ___, ___, "f64.promote_f32"),
            // Reinterpret casts lower to moves; the entries exist so the
            // info table stays one-per-opcode.
            (I32ReinterpretF32, Unary, I32, F32, ___, ___, "i32.reinterpret_f32"),
            (I64ReinterpretF64, Unary, I64, F64, ___, ___, "i64.reinterpret_f64"),
            (F32ReinterpretI32, Unary, F32, I32, ___, ___, "f32.reinterpret_i32"),
            (F64ReinterpretI64, Unary, F64, I64, ___, ___, "f64.reinterpret_i64"),
            (I32TruncSatF32S, Unary, I32, F32, ___, ___, "i32.trunc_sat_f32_s"),
            (I32TruncSatF32U, Unary, I32, F32, ___, ___, "i32.trunc_sat_f32_u"),
            (I32TruncSatF64S, Unary, I32, F64, ___, ___, "i32.trunc_sat_f64_s"),
            (I32TruncSatF64U, Unary, I32, F64, ___, ___, "i32.trunc_sat_f64_u"),
            (I64TruncSatF32S, Unary, I64, F32, ___, ___, "i64.trunc_sat_f32_s"),
            (I64TruncSatF32U, Unary, I64, F32, ___, ___, "i64.trunc_sat_f32_u"),
            (I64TruncSatF64S, Unary, I64, F64, ___, ___, "i64.trunc_sat_f64_s"),
            (I64TruncSatF64U, Unary, I64, F64, ___, ___, "i64.trunc_sat_f64_u"),
            // --- loads / stores ---
            (I32Load, MemoryLoad, I32, I32, ___, ___, "i32.load"),
            (I64Load, MemoryLoad, I64, I32, ___, ___, "i64.load"),
            (F32Load, MemoryLoad, F32, I32, ___, ___, "f32.load"),
            (F64Load, MemoryLoad, F64, I32, ___, ___, "f64.load"),
            (I32Load8S, MemoryLoad, I32, I32, ___, ___, "i32.load8_s"),
            (I32Load8U, MemoryLoad, I32, I32, ___, ___, "i32.load8_u"),
            (I32Load16S, MemoryLoad, I32, I32, ___, ___, "i32.load16_s"),
            (I32Load16U, MemoryLoad, I32, I32, ___, ___, "i32.load16_u"),
            (I64Load8S, MemoryLoad, I64, I32, ___, ___, "i64.load8_s"),
            (I64Load8U, MemoryLoad, I64, I32, ___, ___, "i64.load8_u"),
            (I64Load16S, MemoryLoad, I64, I32, ___, ___, "i64.load16_s"),
            (I64Load16U, MemoryLoad, I64, I32, ___, ___, "i64.load16_u"),
            (I64Load32S, MemoryLoad, I64, I32, ___, ___, "i64.load32_s"),
            (I64Load32U, MemoryLoad, I64, I32, ___, ___, "i64.load32_u"),
            (I32Store, MemoryStore, ___, I32, I32, ___, "i32.store"),
            (I64Store, MemoryStore, ___, I32, I64, ___, "i64.store"),
            (F32Store, MemoryStore, ___, I32, F32, ___, "f32.store"),
            (F64Store, MemoryStore, ___, I32, F64, ___, "f64.store"),
            (I32Store8, MemoryStore, ___, I32, I32, ___, "i32.store8"),
            (I32Store16, MemoryStore, ___, I32, I32, ___, "i32.store16"),
            (I64Store8, MemoryStore, ___, I32, I64, ___, "i64.store8"),
            (I64Store16, MemoryStore, ___, I32, I64, ___, "i64.store16"),
            (I64Store32, MemoryStore, ___, I32, I64, ___, "i64.store32"),
            // --- v128 loads / stores ---
            (V128Load, MemoryLoad, V128, I32, ___, ___, "v128.load"),
            (V128Load8X8S, MemoryLoad, V128, I32, ___, ___, "v128.load8x8_s"),
            (V128Load8X8U, MemoryLoad, V128, I32, ___, ___, "v128.load8x8_u"),
            (V128Load16X4S, MemoryLoad, V128, I32, ___, ___, "v128.load16x4_s"),
            (V128Load16X4U, MemoryLoad, V128, I32, ___, ___, "v128.load16x4_u"),
            (V128Load32X2S, MemoryLoad, V128, I32, ___, ___, "v128.load32x2_s"),
            (V128Load32X2U, MemoryLoad, V128, I32, ___, ___, "v128.load32x2_u"),
            (V128Load8Splat, MemoryLoad, V128, I32, ___, ___, "v128.load8_splat"),
            (V128Load16Splat, MemoryLoad, V128, I32, ___, ___, "v128.load16_splat"),
            (V128Load32Splat, MemoryLoad, V128, I32, ___, ___, "v128.load32_splat"),
            (V128Load64Splat, MemoryLoad, V128, I32, ___, ___, "v128.load64_splat"),
            (V128Load32Zero, MemoryLoad, V128, I32, ___, ___, "v128.load32_zero"),
            (V128Load64Zero, MemoryLoad, V128, I32, ___, ___, "v128.load64_zero"),
            (V128Load8Lane, LoadLane, V128, I32, V128, ___, "v128.load8_lane"),
            (V128Load16Lane, LoadLane, V128, I32, V128, ___, "v128.load16_lane"),
            (V128Load32Lane, LoadLane, V128, I32, V128, ___, "v128.load32_lane"),
            (V128Load64Lane, LoadLane, V128, I32, V128, ___, "v128.load64_lane"),
            (V128Store, MemoryStore, ___, I32, V128, ___, "v128.store"),
            (V128Store8Lane, StoreLane, ___, I32, V128, ___, "v128.store8_lane"),
            (V128Store16Lane, StoreLane, ___, I32, V128, ___, "v128.store16_lane"),
            (V128Store32Lane, StoreLane, ___, I32, V128, ___, "v128.store32_lane"),
            (V128Store64Lane, StoreLane, ___, I32, V128, ___, "v128.store64_lane"),
            // --- v128 lane access ---
            (I8X16ExtractLaneS, ExtractLane, I32, V128, ___, ___, "i8x16.extract_lane_s"),
            (I8X16ExtractLaneU, ExtractLane, I32, V128, ___, ___, "i8x16.extract_lane_u"),
            (I16X8ExtractLaneS, ExtractLane, I32, V128, ___, ___, "i16x8.extract_lane_s"),
            (I16X8ExtractLaneU, ExtractLane, I32, V128, ___, ___, "i16x8.extract_lane_u"),
            (I32X4ExtractLane, ExtractLane, I32, V128, ___, ___, "i32x4.extract_lane"),
            (I64X2ExtractLane, ExtractLane, I64, V128, ___, ___, "i64x2.extract_lane"),
            (F32X4ExtractLane, ExtractLane, F32, V128, ___, ___, "f32x4.extract_lane"),
            (F64X2ExtractLane, ExtractLane, F64, V128, ___, ___, "f64x2.extract_lane"),
            (I8X16ReplaceLane, ReplaceLane, V128, V128, I32, ___, "i8x16.replace_lane"),
            (I16X8ReplaceLane, ReplaceLane, V128, V128, I32, ___, "i16x8.replace_lane"),
            (I32X4ReplaceLane, ReplaceLane, V128, V128, I32, ___, "i32x4.replace_lane"),
            (I64X2ReplaceLane, ReplaceLane, V128, V128, I64, ___, "i64x2.replace_lane"),
            (F32X4ReplaceLane, ReplaceLane, V128, V128, F32, ___, "f32x4.replace_lane"),
            (F64X2ReplaceLane, ReplaceLane, V128, V128, F64, ___, "f64x2.replace_lane"),
            (I8X16Shuffle, Shuffle, V128, V128, V128, ___, "i8x16.shuffle"),
            (I8X16Swizzle, Binary, V128, V128, V128, ___, "i8x16.swizzle"),
            // --- v128 splats ---
            (I8X16Splat, Unary, V128, I32, ___, ___, "i8x16.splat"),
            (I16X8Splat, Unary, V128, I32, ___, ___, "i16x8.splat"),
            (I32X4Splat, Unary, V128, I32, ___, ___, "i32x4.splat"),
            (I64X2Splat, Unary, V128, I64, ___, ___, "i64x2.splat"),
            (F32X4Splat, Unary, V128, F32, ___, ___, "f32x4.splat"),
            (F64X2Splat, Unary, V128, F64, ___, ___, "f64x2.splat"),
            // --- v128 comparisons ---
            (I8X16Eq, Binary, V128, V128, V128, ___, "i8x16.eq"),
            (I8X16Ne, Binary, V128, V128, V128, ___, "i8x16.ne"),
            (I8X16LtS, Binary, V128, V128, V128, ___, "i8x16.lt_s"),
            (I8X16LtU, Binary, V128, V128, V128, ___, "i8x16.lt_u"),
            (I8X16GtS, Binary, V128, V128, V128, ___, "i8x16.gt_s"),
            (I8X16GtU, Binary, V128, V128, V128, ___, "i8x16.gt_u"),
            (I8X16LeS, Binary, V128, V128, V128, ___, "i8x16.le_s"),
            (I8X16LeU, Binary, V128, V128, V128, ___, "i8x16.le_u"),
            (I8X16GeS, Binary, V128, V128, V128, ___, "i8x16.ge_s"),
            (I8X16GeU, Binary, V128, V128, V128, ___, "i8x16.ge_u"),
            (I16X8Eq, Binary, V128, V128, V128, ___, "i16x8.eq"),
            (I16X8Ne, Binary, V128, V128, V128, ___, "i16x8.ne"),
            (I16X8LtS, Binary, V128, V128, V128, ___, "i16x8.lt_s"),
            (I16X8LtU, Binary, V128, V128, V128, ___, "i16x8.lt_u"),
            (I16X8GtS, Binary, V128, V128, V128, ___, "i16x8.gt_s"),
            (I16X8GtU, Binary, V128, V128, V128, ___, "i16x8.gt_u"),
            (I16X8LeS, Binary, V128, V128, V128, ___, "i16x8.le_s"),
            (I16X8LeU, Binary, V128, V128, V128, ___, "i16x8.le_u"),
            (I16X8GeS, Binary, V128, V128, V128, ___, "i16x8.ge_s"),
            (I16X8GeU, Binary, V128, V128, V128, ___, "i16x8.ge_u"),
            (I32X4Eq, Binary, V128, V128, V128, ___, "i32x4.eq"),
            (I32X4Ne, Binary, V128, V128, V128, ___, "i32x4.ne"),
            (I32X4LtS, Binary, V128, V128, V128, ___, "i32x4.lt_s"),
            (I32X4LtU, Binary, V128, V128, V128, ___, "i32x4.lt_u"),
            (I32X4GtS, Binary, V128, V128, V128, ___, "i32x4.gt_s"),
            (I32X4GtU, Binary, V128, V128, V128, ___, "i32x4.gt_u"),
            (I32X4LeS, Binary, V128, V128, V128, ___, "i32x4.le_s"),
            (I32X4LeU, Binary, V128, V128, V128, ___, "i32x4.le_u"),
            (I32X4GeS, Binary, V128, V128, V128, ___, "i32x4.ge_s"),
            (I32X4GeU, Binary, V128, V128, V128, ___, "i32x4.ge_u"),
            (I64X2Eq, Binary, V128, V128, V128, ___, "i64x2.eq"),
            (I64X2Ne, Binary, V128, V128, V128, ___, "i64x2.ne"),
            (I64X2LtS, Binary, V128, V128, V128, ___, "i64x2.lt_s"),
            (I64X2GtS, Binary, V128, V128, V128, ___, "i64x2.gt_s"),
            (I64X2LeS, Binary, V128, V128, V128, ___, "i64x2.le_s"),
            (I64X2GeS, Binary, V128, V128, V128, ___, "i64x2.ge_s"),
            (F32X4Eq, Binary, V128, V128, V128, ___, "f32x4.eq"),
            (F32X4Ne, Binary, V128, V128, V128, ___, "f32x4.ne"),
            (F32X4Lt, Binary, V128, V128, V128, ___, "f32x4.lt"),
            (F32X4Gt, Binary, V128, V128, V128, ___, "f32x4.gt"),
            (F32X4Le, Binary, V128, V128, V128, ___, "f32x4.le"),
            (F32X4Ge, Binary, V128, V128, V128, ___, "f32x4.ge"),
            (F64X2Eq, Binary, V128, V128, V128, ___, "f64x2.eq"),
            (F64X2Ne, Binary, V128, V128, V128, ___, "f64x2.ne"),
            (F64X2Lt, Binary, V128, V128, V128, ___, "f64x2.lt"),
            (F64X2Gt, Binary, V128, V128, V128, ___, "f64x2.gt"),
            (F64X2Le, Binary, V128, V128, V128, ___, "f64x2.le"),
            (F64X2Ge, Binary, V128, V128, V128, ___, "f64x2.ge"),
            // --- v128 bitwise ---
            (V128Not, Unary, V128, V128, ___, ___, "v128.not"),
            (V128And, Binary, V128, V128, V128, ___, "v128.and"),
            (V128AndNot, Binary, V128, V128, V128, ___, "v128.andnot"),
            (V128Or, Binary, V128, V128, V128, ___, "v128.or"),
            (V128Xor, Binary, V128, V128, V128, ___, "v128.xor"),
            (V128BitSelect, Ternary, V128, V128, V128, V128, "v128.bitselect"),
            (V128AnyTrue, Unary, I32, V128, ___, ___, "v128.any_true"),
            // --- i8x16 ---
            (I8X16Abs, Unary, V128, V128, ___, ___, "i8x16.abs"),
            (I8X16Neg, Unary, V128, V128, ___, ___, "i8x16.neg"),
            (I8X16Popcnt, Unary, V128, V128, ___, ___, "i8x16.popcnt"),
            (I8X16AllTrue, Unary, I32, V128, ___, ___, "i8x16.all_true"),
            (I8X16Bitmask, Unary, I32, V128, ___, ___, "i8x16.bitmask"),
            (I8X16NarrowI16X8S, Binary, V128, V128, V128, ___, "i8x16.narrow_i16x8_s"),
            (I8X16NarrowI16X8U, Binary, V128, V128, V128, ___, "i8x16.narrow_i16x8_u"),
            (I8X16Shl, Binary, V128, V128, I32, ___, "i8x16.shl"),
            (I8X16ShrS, Binary, V128, V128, I32, ___, "i8x16.shr_s"),
            (I8X16ShrU, Binary, V128, V128, I32, ___, "i8x16.shr_u"),
            (I8X16Add, Binary, V128, V128, V128, ___, "i8x16.add"),
            (I8X16AddSatS, Binary, V128, V128, V128, ___, "i8x16.add_sat_s"),
            (I8X16AddSatU, Binary, V128, V128, V128, ___, "i8x16.add_sat_u"),
            (I8X16Sub, Binary, V128, V128, V128, ___, "i8x16.sub"),
            (I8X16SubSatS, Binary, V128, V128, V128, ___, "i8x16.sub_sat_s"),
            (I8X16SubSatU, Binary, V128, V128, V128, ___, "i8x16.sub_sat_u"),
            (I8X16MinS, Binary, V128, V128, V128, ___, "i8x16.min_s"),
            (I8X16MinU, Binary, V128, V128, V128, ___, "i8x16.min_u"),
            (I8X16MaxS, Binary, V128, V128, V128, ___, "i8x16.max_s"),
            (I8X16MaxU, Binary, V128, V128, V128, ___, "i8x16.max_u"),
            (I8X16AvgrU, Binary, V128, V128, V128, ___, "i8x16.avgr_u"),
            // --- i16x8 ---
            (I16X8ExtAddPairwiseI8X16S, Unary, V128, V128, ___, ___, "i16x8.extadd_pairwise_i8x16_s"),
            (I16X8ExtAddPairwiseI8X16U, Unary, V128, V128, ___, ___, "i16x8.extadd_pairwise_i8x16_u"),
            (I16X8Abs, Unary, V128, V128, ___, ___, "i16x8.abs"),
            (I16X8Neg, Unary, V128, V128, ___, ___, "i16x8.neg"),
            (I16X8Q15MulrSatS, Binary, V128, V128, V128, ___, "i16x8.q15mulr_sat_s"),
            (I16X8AllTrue, Unary, I32, V128, ___, ___, "i16x8.all_true"),
            (I16X8Bitmask, Unary, I32, V128, ___, ___, "i16x8.bitmask"),
            (I16X8NarrowI32X4S, Binary, V128, V128, V128, ___, "i16x8.narrow_i32x4_s"),
            (I16X8NarrowI32X4U, Binary, V128, V128, V128, ___, "i16x8.narrow_i32x4_u"),
            (I16X8ExtendLowI8X16S, Unary, V128, V128, ___, ___, "i16x8.extend_low_i8x16_s"),
            (I16X8ExtendHighI8X16S, Unary, V128, V128, ___, ___, "i16x8.extend_high_i8x16_s"),
            (I16X8ExtendLowI8X16U, Unary, V128, V128, ___, ___, "i16x8.extend_low_i8x16_u"),
            (I16X8ExtendHighI8X16U, Unary, V128, V128, ___, ___, "i16x8.extend_high_i8x16_u"),
            (I16X8Shl, Binary, V128, V128, I32, ___, "i16x8.shl"),
            (I16X8ShrS, Binary, V128, V128, I32, ___, "i16x8.shr_s"),
            (I16X8ShrU, Binary, V128, V128, I32, ___, "i16x8.shr_u"),
            (I16X8Add, Binary, V128, V128, V128, ___, "i16x8.add"),
            (I16X8AddSatS, Binary, V128, V128, V128, ___, "i16x8.add_sat_s"),
            (I16X8AddSatU, Binary, V128, V128, V128, ___, "i16x8.add_sat_u"),
            (I16X8Sub, Binary, V128, V128, V128, ___, "i16x8.sub"),
            (I16X8SubSatS, Binary, V128, V128, V128, ___, "i16x8.sub_sat_s"),
            (I16X8SubSatU, Binary, V128, V128, V128, ___, "i16x8.sub_sat_u"),
            (I16X8Mul, Binary, V128, V128, V128, ___, "i16x8.mul"),
            (I16X8MinS, Binary, V128, V128, V128, ___, "i16x8.min_s"),
            (I16X8MinU, Binary, V128, V128, V128, ___, "i16x8.min_u"),
            (I16X8MaxS, Binary, V128, V128, V128, ___, "i16x8.max_s"),
            (I16X8MaxU, Binary, V128, V128, V128, ___, "i16x8.max_u"),
            (I16X8AvgrU, Binary, V128, V128, V128, ___, "i16x8.avgr_u"),
            (I16X8ExtMulLowI8X16S, Binary, V128, V128, V128, ___, "i16x8.extmul_low_i8x16_s"),
            (I16X8ExtMulHighI8X16S, Binary, V128, V128, V128, ___, "i16x8.extmul_high_i8x16_s"),
            (I16X8ExtMulLowI8X16U, Binary, V128, V128, V128, ___, "i16x8.extmul_low_i8x16_u"),
            (I16X8ExtMulHighI8X16U, Binary, V128, V128, V128, ___, "i16x8.extmul_high_i8x16_u"),
            // --- i32x4 ---
            (I32X4ExtAddPairwiseI16X8S, Unary, V128, V128, ___, ___, "i32x4.extadd_pairwise_i16x8_s"),
            (I32X4ExtAddPairwiseI16X8U, Unary, V128, V128, ___, ___, "i32x4.extadd_pairwise_i16x8_u"),
            (I32X4Abs, Unary, V128, V128, ___, ___, "i32x4.abs"),
            (I32X4Neg, Unary, V128, V128, ___, ___, "i32x4.neg"),
            (I32X4AllTrue, Unary, I32, V128, ___, ___, "i32x4.all_true"),
            (I32X4Bitmask, Unary, I32, V128, ___, ___, "i32x4.bitmask"),
            (I32X4ExtendLowI16X8S, Unary, V128, V128, ___, ___, "i32x4.extend_low_i16x8_s"),
            (I32X4ExtendHighI16X8S, Unary, V128, V128, ___, ___, "i32x4.extend_high_i16x8_s"),
            (I32X4ExtendLowI16X8U, Unary, V128, V128, ___, ___, "i32x4.extend_low_i16x8_u"),
            (I32X4ExtendHighI16X8U, Unary, V128, V128, ___, ___, "i32x4.extend_high_i16x8_u"),
            (I32X4Shl, Binary, V128, V128, I32, ___, "i32x4.shl"),
            (I32X4ShrS, Binary, V128, V128, I32, ___, "i32x4.shr_s"),
            (I32X4ShrU, Binary, V128, V128, I32, ___, "i32x4.shr_u"),
            (I32X4Add, Binary, V128, V128, V128, ___, "i32x4.add"),
            (I32X4Sub, Binary, V128, V128, V128, ___, "i32x4.sub"),
            (I32X4Mul, Binary, V128, V128, V128, ___, "i32x4.mul"),
            (I32X4MinS, Binary, V128, V128, V128, ___, "i32x4.min_s"),
            (I32X4MinU, Binary, V128, V128, V128, ___, "i32x4.min_u"),
            (I32X4MaxS, Binary, V128, V128, V128, ___, "i32x4.max_s"),
            (I32X4MaxU, Binary, V128, V128, V128, ___, "i32x4.max_u"),
            (I32X4DotI16X8S, Binary, V128, V128, V128, ___, "i32x4.dot_i16x8_s"),
            (I32X4ExtMulLowI16X8S, Binary, V128, V128, V128, ___, "i32x4.extmul_low_i16x8_s"),
            (I32X4ExtMulHighI16X8S, Binary, V128, V128, V128, ___, "i32x4.extmul_high_i16x8_s"),
            (I32X4ExtMulLowI16X8U, Binary, V128, V128, V128, ___, "i32x4.extmul_low_i16x8_u"),
            (I32X4ExtMulHighI16X8U, Binary, V128, V128, V128, ___, "i32x4.extmul_high_i16x8_u"),
            // --- i64x2 ---
            (I64X2Abs, Unary, V128, V128, ___, ___, "i64x2.abs"),
            (I64X2Neg, Unary, V128, V128, ___, ___, "i64x2.neg"),
            (I64X2AllTrue, Unary, I32, V128, ___, ___, "i64x2.all_true"),
            (I64X2Bitmask, Unary, I32, V128, ___, ___, "i64x2.bitmask"),
            (I64X2ExtendLowI32X4S, Unary, V128, V128, ___, ___, "i64x2.extend_low_i32x4_s"),
            (I64X2ExtendHighI32X4S, Unary, V128, V128, ___, ___, "i64x2.extend_high_i32x4_s"),
            (I64X2ExtendLowI32X4U, Unary, V128, V128, ___, ___, "i64x2.extend_low_i32x4_u"),
            (I64X2ExtendHighI32X4U, Unary, V128, V128, ___, ___, "i64x2.extend_high_i32x4_u"),
            (I64X2Shl, Binary, V128, V128, I32, ___, "i64x2.shl"),
            (I64X2ShrS, Binary, V128, V128, I32, ___, "i64x2.shr_s"),
            (I64X2ShrU, Binary, V128, V128, I32, ___, "i64x2.shr_u"),
            (I64X2Add, Binary, V128, V128, V128, ___, "i64x2.add"),
            (I64X2Sub, Binary, V128, V128, V128, ___, "i64x2.sub"),
            (I64X2Mul, Binary, V128, V128, V128, ___, "i64x2.mul"),
            (I64X2ExtMulLowI32X4S, Binary, V128, V128, V128, ___, "i64x2.extmul_low_i32x4_s"),
            (I64X2ExtMulHighI32X4S, Binary, V128, V128, V128, ___, "i64x2.extmul_high_i32x4_s"),
            (I64X2ExtMulLowI32X4U, Binary, V128, V128, V128, ___, "i64x2.extmul_low_i32x4_u"),
            (I64X2ExtMulHighI32X4U, Binary, V128, V128, V128, ___, "i64x2.extmul_high_i32x4_u"),
            // --- f32x4 ---
            (F32X4Ceil, Unary, V128, V128, ___, ___, "f32x4.ceil"),
            (F32X4Floor, Unary, V128, V128, ___, ___, "f32x4.floor"),
            (F32X4Trunc, Unary, V128, V128, ___, ___, "f32x4.trunc"),
            (F32X4Nearest, Unary, V128, V128, ___, ___, "f32x4.nearest"),
            (F32X4Abs, Unary, V128, V128, ___, ___, "f32x4.abs"),
            (F32X4Neg, Unary, V128, V128, ___, ___, "f32x4.neg"),
            (F32X4Sqrt, Unary, V128, V128, ___, ___, "f32x4.sqrt"),
            (F32X4Add, Binary, V128, V128, V128, ___, "f32x4.add"),
            (F32X4Sub, Binary, V128, V128, V128, ___, "f32x4.sub"),
            (F32X4Mul, Binary, V128, V128, V128, ___, "f32x4.mul"),
            (F32X4Div, Binary, V128, V128, V128, ___, "f32x4.div"),
            (F32X4Min, Binary, V128, V128, V128, ___, "f32x4.min"),
            (F32X4Max, Binary, V128, V128, V128, ___, "f32x4.max"),
            (F32X4PMin, Binary, V128, V128, V128, ___, "f32x4.pmin"),
            (F32X4PMax, Binary, V128, V128, V128, ___, "f32x4.pmax"),
            // --- f64x2 ---
            (F64X2Ceil, Unary, V128, V128, ___, ___, "f64x2.ceil"),
            (F64X2Floor, Unary, V128, V128, ___, ___, "f64x2.floor"),
            (F64X2Trunc, Unary, V128, V128, ___, ___, "f64x2.trunc"),
            (F64X2Nearest, Unary, V128, V128, ___, ___, "f64x2.nearest"),
            (F64X2Abs, Unary, V128, V128, ___, ___, "f64x2.abs"),
            (F64X2Neg, Unary, V128, V128, ___, ___, "f64x2.neg"),
            (F64X2Sqrt, Unary, V128, V128, ___, ___, "f64x2.sqrt"),
            (F64X2Add, Binary, V128, V128, V128, ___, "f64x2.add"),
            (F64X2Sub, Binary, V128, V128, V128, ___, "f64x2.sub"),
            (F64X2Mul, Binary, V128, V128, V128, ___, "f64x2.mul"),
            (F64X2Div, Binary, V128, V128, V128, ___, "f64x2.div"),
            (F64X2Min, Binary, V128, V128, V128, ___, "f64x2.min"),
            (F64X2Max, Binary, V128, V128, V128, ___, "f64x2.max"),
            (F64X2PMin, Binary, V128, V128, V128, ___, "f64x2.pmin"),
            (F64X2PMax, Binary, V128, V128, V128, ___, "f64x2.pmax"),
            // --- v128 conversions ---
            (I32X4TruncSatF32X4S, Unary, V128, V128, ___, ___, "i32x4.trunc_sat_f32x4_s"),
            (I32X4TruncSatF32X4U, Unary, V128, V128, ___, ___, "i32x4.trunc_sat_f32x4_u"),
            (F32X4ConvertI32X4S, Unary, V128, V128, ___, ___, "f32x4.convert_i32x4_s"),
            (F32X4ConvertI32X4U, Unary, V128, V128, ___, ___, "f32x4.convert_i32x4_u"),
            (I32X4TruncSatF64X2SZero, Unary, V128, V128, ___, ___, "i32x4.trunc_sat_f64x2_s_zero"),
            (I32X4TruncSatF64X2UZero, Unary, V128, V128, ___, ___, "i32x4.trunc_sat_f64x2_u_zero"),
            (F64X2ConvertLowI32X4S, Unary, V128, V128, ___, ___, "f64x2.convert_low_i32x4_s"),
            (F64X2ConvertLowI32X4U, Unary, V128, V128, ___, ___, "f64x2.convert_low_i32x4_u"),
            (F32X4DemoteF64X2Zero, Unary, V128, V128, ___, ___, "f32x4.demote_f64x2_zero"),
            (F64X2PromoteLowF32X4, Unary, V128, V128, ___, ___, "f64x2.promote_low_f32x4"),
        }
    };
}

macro_rules! define_opcode {
    ($(($name:ident, $shape:ident, $res:ident, $p0:ident, $p1:ident, $p2:ident, $text:literal)),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u16)]
        pub enum Opcode {
            $($name),*
        }

        /// One entry per opcode, in discriminant order.
        pub static OP_INFO: &[OpInfo] = &[
            $(OpInfo {
                result: CodeType::$res,
                params: [CodeType::$p0, CodeType::$p1, CodeType::$p2],
                name: $text,
            }),*
        ];

        impl Opcode {
            pub(crate) fn shape(self) -> Shape {
                match self {
                    $(Opcode::$name => Shape::$shape),*
                }
            }
        }
    };
}

for_each_opcode!(define_opcode);

impl Opcode {
    pub fn from_u16(value: u16) -> Option<Opcode> {
        if (value as usize) < OP_INFO.len() {
            // SAFETY: the enum is `repr(u16)` with default sequential
            // discriminants starting at 0, and `value` is in range.
            Some(unsafe { std::mem::transmute::<u16, Opcode>(value) })
        } else {
            None
        }
    }

    pub fn info(self) -> &'static OpInfo {
        &OP_INFO[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}

/// Set on a comparison record whose lexical successor is a conditional
/// jump or select; the backend may fuse the pair into one native
/// compare-and-branch.
pub const FLAG_MERGE_COMPARE: u16 = 1 << 0;

// ---------------------------------------------------------------------------
// Record layouts
// ---------------------------------------------------------------------------

macro_rules! records {
    ($(
        $(#[$doc:meta])*
        struct $name:ident { $($field:ident: $ty:ty),* $(,)? }
    )*) => {
        $(
            $(#[$doc])*
            #[repr(C, packed)]
            #[derive(Debug, Clone, Copy)]
            pub struct $name {
                pub code: u16,
                $(pub $field: $ty),*
            }

            impl $name {
                #[allow(clippy::too_many_arguments)]
                pub fn new(code: Opcode, $($field: $ty),*) -> Self {
                    $name { code: code as u16, $($field),* }
                }
            }
        )*
    };
}

records! {
    /// An opcode with no operands (`unreachable`).
    struct Simple {}
    struct UnaryOp { flags: u16, src: u16, dst: u16 }
    struct BinaryOp { flags: u16, src0: u16, src1: u16, dst: u16 }
    struct TernaryOp { src0: u16, src1: u16, src2: u16, dst: u16 }
    struct Const32 { dst: u16, value: u32 }
    struct Const64 { dst: u16, value: u64 }
    struct Const128 { dst: u16, value: [u8; 16] }
    struct Move { src: u16, dst: u16 }
    struct GlobalAccess { slot: u16, global_index: u32 }
    /// Zero-offset short form of a 4- or 8-byte load.
    struct Load { src: u16, dst: u16 }
    /// Zero-offset short form of a 4- or 8-byte store.
    struct Store { src0: u16, src1: u16 }
    struct MemoryLoad { src: u16, dst: u16, offset: u32 }
    struct MemoryStore { src0: u16, src1: u16, offset: u32 }
    struct LoadLane { src0: u16, src1: u16, dst: u16, lane: u16, offset: u32 }
    struct StoreLane { src0: u16, src1: u16, lane: u16, offset: u32 }
    struct ExtractLane { lane: u16, src: u16, dst: u16 }
    struct ReplaceLane { lane: u16, src0: u16, src1: u16, dst: u16 }
    struct Shuffle { src0: u16, src1: u16, dst: u16, lanes: [u8; 16] }
    /// `offset` is relative to this record's own byte position.
    struct JumpIf { src: u16, offset: i32 }
    /// Header of a jump table; followed by `table_size + 1` i32 slots
    /// (the last one is the default target), each relative to the
    /// header's byte position.
    struct BrTable { src: u16, table_size: u32 }
    /// Followed by `result_count` u16 slot offsets.
    struct End { result_count: u16 }
    /// Followed by argument slot offsets, then result slot offsets.
    struct Call { func_index: u32, stack_offset_count: u16 }
    /// Followed by argument slot offsets, then result slot offsets.
    struct CallIndirect { table_index: u32, type_index: u32, src: u16, stack_offset_count: u16 }
    struct Select { cond: u16, value_size: u16, src0: u16, src1: u16, dst: u16 }
    /// Followed by `offset_count` u16 slots for the tag's parameters.
    struct Throw { tag_index: u32, offset_count: u16 }
    struct RefFunc { func_index: u32, dst: u16 }
    struct BulkMemory { index0: u32, index1: u32, src0: u16, src1: u16, src2: u16 }
    struct SegmentDrop { seg_index: u32 }
    struct MemorySize { mem_index: u32, dst: u16 }
    struct MemoryGrow { mem_index: u32, src: u16, dst: u16 }
    struct TableGet { table_index: u32, src: u16, dst: u16 }
    struct TableSet { table_index: u32, src0: u16, src1: u16 }
    struct TableGrow { table_index: u32, src0: u16, src1: u16, dst: u16 }
    struct TableSize { table_index: u32, dst: u16 }
}

/// An unconditional jump. `offset` is relative to this record's own
/// byte position; backward offsets (loops) are negative.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct Jump {
    pub code: u16,
    pub offset: i32,
}

impl Jump {
    pub fn new(offset: i32) -> Self {
        Jump {
            code: Opcode::Jump as u16,
            offset,
        }
    }
}

// ---------------------------------------------------------------------------
// Generic lowering of payload-free operators
// ---------------------------------------------------------------------------

/// How a payload-free operator maps onto the value stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpClass {
    Unary,
    Binary,
    /// Unary comparison (`eqz`); candidate for compare fusion.
    UnaryCompare,
    /// Binary comparison; candidate for compare fusion.
    BinaryCompare,
    /// `v128.bitselect`.
    Ternary,
    /// Reinterpret casts lower to a move between slots, never a real op.
    Reinterpret,
}

macro_rules! define_simple_lowering {
    ($(($wasm:ident, $ir:ident, $class:ident)),* $(,)?) => {
        /// Map a payload-free operator to its opcode and stack behavior.
        /// Returns `None` for operators that need bespoke lowering.
        pub(crate) fn simple_opcode(op: &Operator<'_>) -> Option<(Opcode, OpClass)> {
            match op {
                $(Operator::$wasm => Some((Opcode::$ir, OpClass::$class)),)*
                _ => None,
            }
        }
    };
}

macro_rules! for_each_simple_operator {
    ($mac:ident) => {
        $mac! {
            (I32Eqz, I32Eqz, UnaryCompare),
            (I32Eq, I32Eq, BinaryCompare),
            (I32Ne, I32Ne, BinaryCompare),
            (I32LtS, I32LtS, BinaryCompare),
            (I32LtU, I32LtU, BinaryCompare),
            (I32GtS, I32GtS, BinaryCompare),
            (I32GtU, I32GtU, BinaryCompare),
            (I32LeS, I32LeS, BinaryCompare),
            (I32LeU, I32LeU, BinaryCompare),
            (I32GeS, I32GeS, BinaryCompare),
            (I32GeU, I32GeU, BinaryCompare),
            (I64Eqz, I64Eqz, UnaryCompare),
            (I64Eq, I64Eq, BinaryCompare),
            (I64Ne, I64Ne, BinaryCompare),
            (I64LtS, I64LtS, BinaryCompare),
            (I64LtU, I64LtU, BinaryCompare),
            (I64GtS, I64GtS, BinaryCompare),
            (I64GtU, I64GtU, BinaryCompare),
            (I64LeS, I64LeS, BinaryCompare),
            (I64LeU, I64LeU, BinaryCompare),
            (I64GeS, I64GeS, BinaryCompare),
            (I64GeU, I64GeU, BinaryCompare),
            (F32Eq, F32Eq, BinaryCompare),
            (F32Ne, F32Ne, BinaryCompare),
            (F32Lt, F32Lt, BinaryCompare),
            (F32Gt, F32Gt, BinaryCompare),
            (F32Le, F32Le, BinaryCompare),
            (F32Ge, F32Ge, BinaryCompare),
            (F64Eq, F64Eq, BinaryCompare),
            (F64Ne, F64Ne, BinaryCompare),
            (F64Lt, F64Lt, BinaryCompare),
            (F64Gt, F64Gt, BinaryCompare),
            (F64Le, F64Le, BinaryCompare),
            (F64Ge, F64Ge, BinaryCompare),
            (I32Clz, I32Clz, Unary),
            (I32Ctz, I32Ctz, Unary),
            (I32Popcnt, I32Popcnt, Unary),
            (I32Add, I32Add, Binary),
            (I32Sub, I32Sub, Binary),
            (I32Mul, I32Mul, Binary),
            (I32DivS, I32DivS, Binary),
            (I32DivU, I32DivU, Binary),
            (I32RemS, I32RemS, Binary),
            (I32RemU, I32RemU, Binary),
            (I32And, I32And, Binary),
            (I32Or, I32Or, Binary),
            (I32Xor, I32Xor, Binary),
            (I32Shl, I32Shl, Binary),
            (I32ShrS, I32ShrS, Binary),
            (I32ShrU, I32ShrU, Binary),
            (I32Rotl, I32Rotl, Binary),
            (I32Rotr, I32Rotr, Binary),
            (I64Clz, I64Clz, Unary),
            (I64Ctz, I64Ctz, Unary),
            (I64Popcnt, I64Popcnt, Unary),
            (I64Add, I64Add, Binary),
            (I64Sub, I64Sub, Binary),
            (I64Mul, I64Mul, Binary),
            (I64DivS, I64DivS, Binary),
            (I64DivU, I64DivU, Binary),
            (I64RemS, I64RemS, Binary),
            (I64RemU, I64RemU, Binary),
            (I64And, I64And, Binary),
            (I64Or, I64Or, Binary),
            (I64Xor, I64Xor, Binary),
            (I64Shl, I64Shl, Binary),
            (I64ShrS, I64ShrS, Binary),
            (I64ShrU, I64ShrU, Binary),
            (I64Rotl, I64Rotl, Binary),
            (I64Rotr, I64Rotr, Binary),
            (F32Abs, F32Abs, Unary),
            (F32Neg, F32Neg, Unary),
            (F32Ceil, F32Ceil, Unary),
            (F32Floor, F32Floor, Unary),
            (F32Trunc, F32Trunc, Unary),
            (F32Nearest, F32Nearest, Unary),
            (F32Sqrt, F32Sqrt, Unary),
            (F32Add, F32Add, Binary),
            (F32Sub, F32Sub, Binary),
            (F32Mul, F32Mul, Binary),
            (F32Div, F32Div, Binary),
            (F32Min, F32Min, Binary),
            (F32Max, F32Max, Binary),
            (F32Copysign, F32Copysign, Binary),
            (F64Abs, F64Abs, Unary),
            (F64Neg, F64Neg, Unary),
            (F64Ceil, F64Ceil, Unary),
            (F64Floor, F64Floor, Unary),
            (F64Trunc, F64Trunc, Unary),
            (F64Nearest, F64Nearest, Unary),
            (F64Sqrt, F64Sqrt, Unary),
            (F64Add, F64Add, Binary),
            (F64Sub, F64Sub, Binary),
            (F64Mul, F64Mul, Binary),
            (F64Div, F64Div, Binary),
            (F64Min, F64Min, Binary),
            (F64Max, F64Max, Binary),
            (F64Copysign, F64Copysign, Binary),
            (I32WrapI64, I32WrapI64, Unary),
            (I32TruncF32S, I32TruncF32S, Unary),
            (I32TruncF32U, I32TruncF32U, Unary),
            (I32TruncF64S, I32TruncF64S, Unary),
            (I32TruncF64U, I32TruncF64U, Unary),
            (I64ExtendI32S, I64ExtendI32S, Unary),
            (I64ExtendI32U, I64ExtendI32U, Unary),
            (I64TruncF32S, I64TruncF32S, Unary),
            (I64TruncF32U, I64TruncF32U, Unary),
            (I64TruncF64S, I64TruncF64S, Unary),
            (I64TruncF64U, I64TruncF64U, Unary),
            (F32ConvertI32S, F32ConvertI32S, Unary),
            (F32ConvertI32U, F32ConvertI32U, Unary),
            (F32ConvertI64S, F32ConvertI64S, Unary),
            (F32ConvertI64U, F32ConvertI64U, Unary),
            (F32DemoteF64, F32DemoteF64, Unary),
            (F64ConvertI32S, F64ConvertI32S, Unary),
            (F64ConvertI32U, F64ConvertI32U, Unary),
            (F64ConvertI64S, F64ConvertI64S, Unary),
            (F64ConvertI64U, F64ConvertI64U, Unary),
            (F64PromoteF32, F64PromoteF32, Unary),
            (I32Extend8S, I32Extend8S, Unary),
            (I32Extend16S, I32Extend16S, Unary),
            (I64Extend8S, I64Extend8S, Unary),
            (I64Extend16S, I64Extend16S, Unary),
            (I64Extend32S, I64Extend32S, Unary),
            (I32TruncSatF32S, I32TruncSatF32S, Unary),
            (I32TruncSatF32U, I32TruncSatF32U, Unary),
            (I32TruncSatF64S, I32TruncSatF64S, Unary),
            (I32TruncSatF64U, I32TruncSatF64U, Unary),
            (I64TruncSatF32S, I64TruncSatF32S, Unary),
            (I64TruncSatF32U, I64TruncSatF32U, Unary),
            (I64TruncSatF64S, I64TruncSatF64S, Unary),
            (I64TruncSatF64U, I64TruncSatF64U, Unary),
            (I32ReinterpretF32, I32ReinterpretF32, Reinterpret),
            (I64ReinterpretF64, I64ReinterpretF64, Reinterpret),
            (F32ReinterpretI32, F32ReinterpretI32, Reinterpret),
            (F64ReinterpretI64, F64ReinterpretI64, Reinterpret),
            // --- simd ---
            (I8x16Swizzle, I8X16Swizzle, Binary),
            (I8x16Splat, I8X16Splat, Unary),
            (I16x8Splat, I16X8Splat, Unary),
            (I32x4Splat, I32X4Splat, Unary),
            (I64x2Splat, I64X2Splat, Unary),
            (F32x4Splat, F32X4Splat, Unary),
            (F64x2Splat, F64X2Splat, Unary),
            (I8x16Eq, I8X16Eq, Binary),
            (I8x16Ne, I8X16Ne, Binary),
            (I8x16LtS, I8X16LtS, Binary),
            (I8x16LtU, I8X16LtU, Binary),
            (I8x16GtS, I8X16GtS, Binary),
            (I8x16GtU, I8X16GtU, Binary),
            (I8x16LeS, I8X16LeS, Binary),
            (I8x16LeU, I8X16LeU, Binary),
            (I8x16GeS, I8X16GeS, Binary),
            (I8x16GeU, I8X16GeU, Binary),
            (I16x8Eq, I16X8Eq, Binary),
            (I16x8Ne, I16X8Ne, Binary),
            (I16x8LtS, I16X8LtS, Binary),
            (I16x8LtU, I16X8LtU, Binary),
            (I16x8GtS, I16X8GtS, Binary),
            (I16x8GtU, I16X8GtU, Binary),
            (I16x8LeS, I16X8LeS, Binary),
            (I16x8LeU, I16X8LeU, Binary),
            (I16x8GeS, I16X8GeS, Binary),
            (I16x8GeU, I16X8GeU, Binary),
            (I32x4Eq, I32X4Eq, Binary),
            (I32x4Ne, I32X4Ne, Binary),
            (I32x4LtS, I32X4LtS, Binary),
            (I32x4LtU, I32X4LtU, Binary),
            (I32x4GtS, I32X4GtS, Binary),
            (I32x4GtU, I32X4GtU, Binary),
            (I32x4LeS, I32X4LeS, Binary),
            (I32x4LeU, I32X4LeU, Binary),
            (I32x4GeS, I32X4GeS, Binary),
            (I32x4GeU, I32X4GeU, Binary),
            (I64x2Eq, I64X2Eq, Binary),
            (I64x2Ne, I64X2Ne, Binary),
            (I64x2LtS, I64X2LtS, Binary),
            (I64x2GtS, I64X2GtS, Binary),
            (I64x2LeS, I64X2LeS, Binary),
            (I64x2GeS, I64X2GeS, Binary),
            (F32x4Eq, F32X4Eq, Binary),
            (F32x4Ne, F32X4Ne, Binary),
            (F32x4Lt, F32X4Lt, Binary),
            (F32x4Gt, F32X4Gt, Binary),
            (F32x4Le, F32X4Le, Binary),
            (F32x4Ge, F32X4Ge, Binary),
            (F64x2Eq, F64X2Eq, Binary),
            (F64x2Ne, F64X2Ne, Binary),
            (F64x2Lt, F64X2Lt, Binary),
            (F64x2Gt, F64X2Gt, Binary),
            (F64x2Le, F64X2Le, Binary),
            (F64x2Ge, F64X2Ge, Binary),
            (V128Not, V128Not, Unary),
            (V128And, V128And, Binary),
            (V128AndNot, V128AndNot, Binary),
            (V128Or, V128Or, Binary),
            (V128Xor, V128Xor, Binary),
            (V128Bitselect, V128BitSelect, Ternary),
            (V128AnyTrue, V128AnyTrue, Unary),
            (I8x16Abs, I8X16Abs, Unary),
            (I8x16Neg, I8X16Neg, Unary),
            (I8x16Popcnt, I8X16Popcnt, Unary),
            (I8x16AllTrue, I8X16AllTrue, Unary),
            (I8x16Bitmask, I8X16Bitmask, Unary),
            (I8x16NarrowI16x8S, I8X16NarrowI16X8S, Binary),
            (I8x16NarrowI16x8U, I8X16NarrowI16X8U, Binary),
            (I8x16Shl, I8X16Shl, Binary),
            (I8x16ShrS, I8X16ShrS, Binary),
            (I8x16ShrU, I8X16ShrU, Binary),
            (I8x16Add, I8X16Add, Binary),
            (I8x16AddSatS, I8X16AddSatS, Binary),
            (I8x16AddSatU, I8X16AddSatU, Binary),
            (I8x16Sub, I8X16Sub, Binary),
            (I8x16SubSatS, I8X16SubSatS, Binary),
            (I8x16SubSatU, I8X16SubSatU, Binary),
            (I8x16MinS, I8X16MinS, Binary),
            (I8x16MinU, I8X16MinU, Binary),
            (I8x16MaxS, I8X16MaxS, Binary),
            (I8x16MaxU, I8X16MaxU, Binary),
            (I8x16AvgrU, I8X16AvgrU, Binary),
            (I16x8ExtAddPairwiseI8x16S, I16X8ExtAddPairwiseI8X16S, Unary),
            (I16x8ExtAddPairwiseI8x16U, I16X8ExtAddPairwiseI8X16U, Unary),
            (I16x8Abs, I16X8Abs, Unary),
            (I16x8Neg, I16X8Neg, Unary),
            (I16x8Q15MulrSatS, I16X8Q15MulrSatS, Binary),
            (I16x8AllTrue, I16X8AllTrue, Unary),
            (I16x8Bitmask, I16X8Bitmask, Unary),
            (I16x8NarrowI32x4S, I16X8NarrowI32X4S, Binary),
            (I16x8NarrowI32x4U, I16X8NarrowI32X4U, Binary),
            (I16x8ExtendLowI8x16S, I16X8ExtendLowI8X16S, Unary),
            (I16x8ExtendHighI8x16S, I16X8ExtendHighI8X16S, Unary),
            (I16x8ExtendLowI8x16U, I16X8ExtendLowI8X16U, Unary),
            (I16x8ExtendHighI8x16U, I16X8ExtendHighI8X16U, Unary),
            (I16x8Shl, I16X8Shl, Binary),
            (I16x8ShrS, I16X8ShrS, Binary),
            (I16x8ShrU, I16X8ShrU, Binary),
            (I16x8Add, I16X8Add, Binary),
            (I16x8AddSatS, I16X8AddSatS, Binary),
            (I16x8AddSatU, I16X8AddSatU, Binary),
            (I16x8Sub, I16X8Sub, Binary),
            (I16x8SubSatS, I16X8SubSatS, Binary),
            (I16x8SubSatU, I16X8SubSatU, Binary),
            (I16x8Mul, I16X8Mul, Binary),
            (I16x8MinS, I16X8MinS, Binary),
            (I16x8MinU, I16X8MinU, Binary),
            (I16x8MaxS, I16X8MaxS, Binary),
            (I16x8MaxU, I16X8MaxU, Binary),
            (I16x8AvgrU, I16X8AvgrU, Binary),
            (I16x8ExtMulLowI8x16S, I16X8ExtMulLowI8X16S, Binary),
            (I16x8ExtMulHighI8x16S, I16X8ExtMulHighI8X16S, Binary),
            (I16x8ExtMulLowI8x16U, I16X8ExtMulLowI8X16U, Binary),
            (I16x8ExtMulHighI8x16U, I16X8ExtMulHighI8X16U, Binary),
            (I32x4ExtAddPairwiseI16x8S, I32X4ExtAddPairwiseI16X8S, Unary),
            (I32x4ExtAddPairwiseI16x8U, I32X4ExtAddPairwiseI16X8U, Unary),
            (I32x4Abs, I32X4Abs, Unary),
            (I32x4Neg, I32X4Neg, Unary),
            (I32x4AllTrue, I32X4AllTrue, Unary),
            (I32x4Bitmask, I32X4Bitmask, Unary),
            (I32x4ExtendLowI16x8S, I32X4ExtendLowI16X8S, Unary),
            (I32x4ExtendHighI16x8S, I32X4ExtendHighI16X8S, Unary),
            (I32x4ExtendLowI16x8U, I32X4ExtendLowI16X8U, Unary),
            (I32x4ExtendHighI16x8U, I32X4ExtendHighI16X8U, Unary),
            (I32x4Shl, I32X4Shl, Binary),
            (I32x4ShrS, I32X4ShrS, Binary),
            (I32x4ShrU, I32X4ShrU, Binary),
            (I32x4Add, I32X4Add, Binary),
            (I32x4Sub, I32X4Sub, Binary),
            (I32x4Mul, I32X4Mul, Binary),
            (I32x4MinS, I32X4MinS, Binary),
            (I32x4MinU, I32X4MinU, Binary),
            (I32x4MaxS, I32X4MaxS, Binary),
            (I32x4MaxU, I32X4MaxU, Binary),
            (I32x4DotI16x8S, I32X4DotI16X8S, Binary),
            (I32x4ExtMulLowI16x8S, I32X4ExtMulLowI16X8S, Binary),
            (I32x4ExtMulHighI16x8S, I32X4ExtMulHighI16X8S, Binary),
            (I32x4ExtMulLowI16x8U, I32X4ExtMulLowI16X8U, Binary),
            (I32x4ExtMulHighI16x8U, I32X4ExtMulHighI16X8U, Binary),
            (I64x2Abs, I64X2Abs, Unary),
            (I64x2Neg, I64X2Neg, Unary),
            (I64x2AllTrue, I64X2AllTrue, Unary),
            (I64x2Bitmask, I64X2Bitmask, Unary),
            (I64x2ExtendLowI32x4S, I64X2ExtendLowI32X4S, Unary),
            (I64x2ExtendHighI32x4S, I64X2ExtendHighI32X4S, Unary),
            (I64x2ExtendLowI32x4U, I64X2ExtendLowI32X4U, Unary),
            (I64x2ExtendHighI32x4U, I64X2ExtendHighI32X4U, Unary),
            (I64x2Shl, I64X2Shl, Binary),
            (I64x2ShrS, I64X2ShrS, Binary),
            (I64x2ShrU, I64X2ShrU, Binary),
            (I64x2Add, I64X2Add, Binary),
            (I64x2Sub, I64X2Sub, Binary),
            (I64x2Mul, I64X2Mul, Binary),
            (I64x2ExtMulLowI32x4S, I64X2ExtMulLowI32X4S, Binary),
            (I64x2ExtMulHighI32x4S, I64X2ExtMulHighI32X4S, Binary),
            (I64x2ExtMulLowI32x4U, I64X2ExtMulLowI32X4U, Binary),
            (I64x2ExtMulHighI32x4U, I64X2ExtMulHighI32X4U, Binary),
            (F32x4Ceil, F32X4Ceil, Unary),
            (F32x4Floor, F32X4Floor, Unary),
            (F32x4Trunc, F32X4Trunc, Unary),
            (F32x4Nearest, F32X4Nearest, Unary),
            (F32x4Abs, F32X4Abs, Unary),
            (F32x4Neg, F32X4Neg, Unary),
            (F32x4Sqrt, F32X4Sqrt, Unary),
            (F32x4Add, F32X4Add, Binary),
            (F32x4Sub, F32X4Sub, Binary),
            (F32x4Mul, F32X4Mul, Binary),
            (F32x4Div, F32X4Div, Binary),
            (F32x4Min, F32X4Min, Binary),
            (F32x4Max, F32X4Max, Binary),
            (F32x4PMin, F32X4PMin, Binary),
            (F32x4PMax, F32X4PMax, Binary),
            (F64x2Ceil, F64X2Ceil, Unary),
            (F64x2Floor, F64X2Floor, Unary),
            (F64x2Trunc, F64X2Trunc, Unary),
            (F64x2Nearest, F64X2Nearest, Unary),
            (F64x2Abs, F64X2Abs, Unary),
            (F64x2Neg, F64X2Neg, Unary),
            (F64x2Sqrt, F64X2Sqrt, Unary),
            (F64x2Add, F64X2Add, Binary),
            (F64x2Sub, F64X2Sub, Binary),
            (F64x2Mul, F64X2Mul, Binary),
            (F64x2Div, F64X2Div, Binary),
            (F64x2Min, F64X2Min, Binary),
            (F64x2Max, F64X2Max, Binary),
            (F64x2PMin, F64X2PMin, Binary),
            (F64x2PMax, F64X2PMax, Binary),
            (I32x4TruncSatF32x4S, I32X4TruncSatF32X4S, Unary),
            (I32x4TruncSatF32x4U, I32X4TruncSatF32X4U, Unary),
            (F32x4ConvertI32x4S, F32X4ConvertI32X4S, Unary),
            (F32x4ConvertI32x4U, F32X4ConvertI32X4U, Unary),
            (I32x4TruncSatF64x2SZero, I32X4TruncSatF64X2SZero, Unary),
            (I32x4TruncSatF64x2UZero, I32X4TruncSatF64X2UZero, Unary),
            (F64x2ConvertLowI32x4S, F64X2ConvertLowI32X4S, Unary),
            (F64x2ConvertLowI32x4U, F64X2ConvertLowI32X4U, Unary),
            (F32x4DemoteF64x2Zero, F32X4DemoteF64X2Zero, Unary),
            (F64x2PromoteLowF32x4, F64X2PromoteLowF32X4, Unary),
        }
    };
}

for_each_simple_operator!(define_simple_lowering);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_table_matches_enum_order() {
        assert_eq!(Opcode::Unreachable as usize, 0);
        assert_eq!(Opcode::I32Add.name(), "i32.add");
        assert_eq!(Opcode::I32Add.info().result, CodeType::I32);
        assert_eq!(
            Opcode::F64Min.info().params,
            [CodeType::F64, CodeType::F64, CodeType::___]
        );
        assert_eq!(Opcode::I64Eqz.info().result, CodeType::I32);
        assert_eq!(Opcode::I64Eqz.info().params[0], CodeType::I64);
    }

    #[test]
    fn from_u16_round_trips() {
        for (i, _) in OP_INFO.iter().enumerate() {
            let op = Opcode::from_u16(i as u16).unwrap();
            assert_eq!(op as usize, i);
        }
        assert!(Opcode::from_u16(OP_INFO.len() as u16).is_none());
    }

    #[test]
    fn shapes_select_record_layouts() {
        assert_eq!(Opcode::I32Add.shape(), Shape::Binary);
        assert_eq!(Opcode::F32Sqrt.shape(), Shape::Unary);
        assert_eq!(Opcode::Const128.shape(), Shape::Const128);
        assert_eq!(Opcode::BrTable.shape(), Shape::BrTable);
        assert_eq!(Opcode::V128Load8Lane.shape(), Shape::LoadLane);
        assert_eq!(Opcode::I8X16Shuffle.shape(), Shape::Shuffle);
    }

    #[test]
    fn record_sizes_are_packed() {
        assert_eq!(std::mem::size_of::<Simple>(), 2);
        assert_eq!(std::mem::size_of::<Move>(), 6);
        assert_eq!(std::mem::size_of::<Jump>(), 6);
        assert_eq!(std::mem::size_of::<JumpIf>(), 8);
        assert_eq!(std::mem::size_of::<Const32>(), 8);
        assert_eq!(std::mem::size_of::<Const64>(), 12);
        assert_eq!(std::mem::size_of::<Const128>(), 20);
        assert_eq!(std::mem::size_of::<BinaryOp>(), 10);
        assert_eq!(std::mem::size_of::<UnaryOp>(), 8);
        assert_eq!(std::mem::size_of::<End>(), 4);
        assert_eq!(std::mem::size_of::<Call>(), 8);
        assert_eq!(std::mem::size_of::<BrTable>(), 8);
        assert_eq!(std::mem::size_of::<Shuffle>(), 24);
    }

    #[test]
    fn jump_if_true_and_false_share_a_layout() {
        let t = JumpIf::new(Opcode::JumpIfTrue, 3, -8);
        let f = JumpIf::new(Opcode::JumpIfFalse, 3, -8);
        assert_eq!({ t.offset }, { f.offset });
        assert_ne!({ t.code }, { f.code });
    }

    #[test]
    fn simple_lowering_covers_numeric_and_simd_ops() {
        use wasmparser::Operator;
        let (op, class) = simple_opcode(&Operator::I32Add).unwrap();
        assert_eq!(op, Opcode::I32Add);
        assert_eq!(class, OpClass::Binary);
        let (op, class) = simple_opcode(&Operator::F64Lt).unwrap();
        assert_eq!(op, Opcode::F64Lt);
        assert_eq!(class, OpClass::BinaryCompare);
        let (op, class) = simple_opcode(&Operator::V128Bitselect).unwrap();
        assert_eq!(op, Opcode::V128BitSelect);
        assert_eq!(class, OpClass::Ternary);
        let (_, class) = simple_opcode(&Operator::F32ReinterpretI32).unwrap();
        assert_eq!(class, OpClass::Reinterpret);
        assert!(simple_opcode(&Operator::Drop).is_none());
    }
}
