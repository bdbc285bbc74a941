//! Linear decoding of a function's bytecode buffer.
//!
//! The walker yields one decoded record per step, advancing by the
//! record's size (including variable-width trailers). It backs the
//! textual `dump` debug aid and lets tests assert on emitted records
//! without touching raw bytes.

use std::fmt::Write as _;

use super::{Opcode, Shape};

/// A decoded view of one bytecode record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Simple {
        code: Opcode,
    },
    Unary {
        code: Opcode,
        flags: u16,
        src: u16,
        dst: u16,
    },
    Binary {
        code: Opcode,
        flags: u16,
        src0: u16,
        src1: u16,
        dst: u16,
    },
    Ternary {
        code: Opcode,
        src0: u16,
        src1: u16,
        src2: u16,
        dst: u16,
    },
    Const32 {
        dst: u16,
        value: u32,
    },
    Const64 {
        dst: u16,
        value: u64,
    },
    Const128 {
        dst: u16,
        value: [u8; 16],
    },
    Move {
        code: Opcode,
        src: u16,
        dst: u16,
    },
    GlobalAccess {
        code: Opcode,
        slot: u16,
        global_index: u32,
    },
    Load {
        code: Opcode,
        src: u16,
        dst: u16,
    },
    Store {
        code: Opcode,
        src0: u16,
        src1: u16,
    },
    MemoryLoad {
        code: Opcode,
        src: u16,
        dst: u16,
        offset: u32,
    },
    MemoryStore {
        code: Opcode,
        src0: u16,
        src1: u16,
        offset: u32,
    },
    LoadLane {
        code: Opcode,
        src0: u16,
        src1: u16,
        dst: u16,
        lane: u16,
        offset: u32,
    },
    StoreLane {
        code: Opcode,
        src0: u16,
        src1: u16,
        lane: u16,
        offset: u32,
    },
    ExtractLane {
        code: Opcode,
        lane: u16,
        src: u16,
        dst: u16,
    },
    ReplaceLane {
        code: Opcode,
        lane: u16,
        src0: u16,
        src1: u16,
        dst: u16,
    },
    Shuffle {
        src0: u16,
        src1: u16,
        dst: u16,
        lanes: [u8; 16],
    },
    Jump {
        offset: i32,
    },
    JumpIf {
        code: Opcode,
        src: u16,
        offset: i32,
    },
    /// Table slots include the default target as the last entry.
    BrTable {
        src: u16,
        targets: Vec<i32>,
    },
    End {
        offsets: Vec<u16>,
    },
    Call {
        func_index: u32,
        offsets: Vec<u16>,
    },
    CallIndirect {
        table_index: u32,
        type_index: u32,
        src: u16,
        offsets: Vec<u16>,
    },
    Select {
        cond: u16,
        value_size: u16,
        src0: u16,
        src1: u16,
        dst: u16,
    },
    Throw {
        tag_index: u32,
        offsets: Vec<u16>,
    },
    RefFunc {
        func_index: u32,
        dst: u16,
    },
    BulkMemory {
        code: Opcode,
        index0: u32,
        index1: u32,
        src0: u16,
        src1: u16,
        src2: u16,
    },
    SegmentDrop {
        code: Opcode,
        seg_index: u32,
    },
    MemorySize {
        mem_index: u32,
        dst: u16,
    },
    MemoryGrow {
        mem_index: u32,
        src: u16,
        dst: u16,
    },
    TableGet {
        table_index: u32,
        src: u16,
        dst: u16,
    },
    TableSet {
        table_index: u32,
        src0: u16,
        src1: u16,
    },
    TableGrow {
        table_index: u32,
        src0: u16,
        src1: u16,
        dst: u16,
    },
    TableSize {
        table_index: u32,
        dst: u16,
    },
}

impl Record {
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Record::Simple { code }
            | Record::Unary { code, .. }
            | Record::Binary { code, .. }
            | Record::Ternary { code, .. }
            | Record::Move { code, .. }
            | Record::GlobalAccess { code, .. }
            | Record::Load { code, .. }
            | Record::Store { code, .. }
            | Record::MemoryLoad { code, .. }
            | Record::MemoryStore { code, .. }
            | Record::LoadLane { code, .. }
            | Record::StoreLane { code, .. }
            | Record::ExtractLane { code, .. }
            | Record::ReplaceLane { code, .. }
            | Record::JumpIf { code, .. }
            | Record::BulkMemory { code, .. }
            | Record::SegmentDrop { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Iterator over `(byte_offset, record)` pairs of one bytecode buffer.
pub struct BytecodeReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BytecodeReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BytecodeReader { bytes, pos: 0 }
    }

    fn u16_at(&self, off: usize) -> u16 {
        u16::from_le_bytes(self.bytes[off..off + 2].try_into().unwrap())
    }

    fn u32_at(&self, off: usize) -> u32 {
        u32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap())
    }

    fn i32_at(&self, off: usize) -> i32 {
        i32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap())
    }

    fn u64_at(&self, off: usize) -> u64 {
        u64::from_le_bytes(self.bytes[off..off + 8].try_into().unwrap())
    }

    fn u16_slice(&self, off: usize, count: usize) -> Vec<u16> {
        (0..count).map(|i| self.u16_at(off + 2 * i)).collect()
    }
}

impl<'a> Iterator for BytecodeReader<'a> {
    type Item = (usize, Record);

    fn next(&mut self) -> Option<(usize, Record)> {
        if self.pos + 2 > self.bytes.len() {
            return None;
        }
        let at = self.pos;
        let code = Opcode::from_u16(self.u16_at(at))?;
        let (record, size) = match code.shape() {
            Shape::Simple => (Record::Simple { code }, 2),
            Shape::Unary => (
                Record::Unary {
                    code,
                    flags: self.u16_at(at + 2),
                    src: self.u16_at(at + 4),
                    dst: self.u16_at(at + 6),
                },
                8,
            ),
            Shape::Binary => (
                Record::Binary {
                    code,
                    flags: self.u16_at(at + 2),
                    src0: self.u16_at(at + 4),
                    src1: self.u16_at(at + 6),
                    dst: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::Ternary => (
                Record::Ternary {
                    code,
                    src0: self.u16_at(at + 2),
                    src1: self.u16_at(at + 4),
                    src2: self.u16_at(at + 6),
                    dst: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::Const32 => (
                Record::Const32 {
                    dst: self.u16_at(at + 2),
                    value: self.u32_at(at + 4),
                },
                8,
            ),
            Shape::Const64 => (
                Record::Const64 {
                    dst: self.u16_at(at + 2),
                    value: self.u64_at(at + 4),
                },
                12,
            ),
            Shape::Const128 => {
                let mut value = [0u8; 16];
                value.copy_from_slice(&self.bytes[at + 4..at + 20]);
                (
                    Record::Const128 {
                        dst: self.u16_at(at + 2),
                        value,
                    },
                    20,
                )
            }
            Shape::Move => (
                Record::Move {
                    code,
                    src: self.u16_at(at + 2),
                    dst: self.u16_at(at + 4),
                },
                6,
            ),
            Shape::GlobalAccess => (
                Record::GlobalAccess {
                    code,
                    slot: self.u16_at(at + 2),
                    global_index: self.u32_at(at + 4),
                },
                8,
            ),
            Shape::Load => (
                Record::Load {
                    code,
                    src: self.u16_at(at + 2),
                    dst: self.u16_at(at + 4),
                },
                6,
            ),
            Shape::Store => (
                Record::Store {
                    code,
                    src0: self.u16_at(at + 2),
                    src1: self.u16_at(at + 4),
                },
                6,
            ),
            Shape::MemoryLoad => (
                Record::MemoryLoad {
                    code,
                    src: self.u16_at(at + 2),
                    dst: self.u16_at(at + 4),
                    offset: self.u32_at(at + 6),
                },
                10,
            ),
            Shape::MemoryStore => (
                Record::MemoryStore {
                    code,
                    src0: self.u16_at(at + 2),
                    src1: self.u16_at(at + 4),
                    offset: self.u32_at(at + 6),
                },
                10,
            ),
            Shape::LoadLane => (
                Record::LoadLane {
                    code,
                    src0: self.u16_at(at + 2),
                    src1: self.u16_at(at + 4),
                    dst: self.u16_at(at + 6),
                    lane: self.u16_at(at + 8),
                    offset: self.u32_at(at + 10),
                },
                14,
            ),
            Shape::StoreLane => (
                Record::StoreLane {
                    code,
                    src0: self.u16_at(at + 2),
                    src1: self.u16_at(at + 4),
                    lane: self.u16_at(at + 6),
                    offset: self.u32_at(at + 8),
                },
                12,
            ),
            Shape::ExtractLane => (
                Record::ExtractLane {
                    code,
                    lane: self.u16_at(at + 2),
                    src: self.u16_at(at + 4),
                    dst: self.u16_at(at + 6),
                },
                8,
            ),
            Shape::ReplaceLane => (
                Record::ReplaceLane {
                    code,
                    lane: self.u16_at(at + 2),
                    src0: self.u16_at(at + 4),
                    src1: self.u16_at(at + 6),
                    dst: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::Shuffle => {
                let mut lanes = [0u8; 16];
                lanes.copy_from_slice(&self.bytes[at + 8..at + 24]);
                (
                    Record::Shuffle {
                        src0: self.u16_at(at + 2),
                        src1: self.u16_at(at + 4),
                        dst: self.u16_at(at + 6),
                        lanes,
                    },
                    24,
                )
            }
            Shape::Jump => (
                Record::Jump {
                    offset: self.i32_at(at + 2),
                },
                6,
            ),
            Shape::JumpIf => (
                Record::JumpIf {
                    code,
                    src: self.u16_at(at + 2),
                    offset: self.i32_at(at + 4),
                },
                8,
            ),
            Shape::BrTable => {
                let count = self.u32_at(at + 4) as usize;
                let targets = (0..count + 1).map(|i| self.i32_at(at + 8 + 4 * i)).collect();
                (
                    Record::BrTable {
                        src: self.u16_at(at + 2),
                        targets,
                    },
                    8 + 4 * (count + 1),
                )
            }
            Shape::End => {
                let count = self.u16_at(at + 2) as usize;
                (
                    Record::End {
                        offsets: self.u16_slice(at + 4, count),
                    },
                    4 + 2 * count,
                )
            }
            Shape::Call => {
                let count = self.u16_at(at + 6) as usize;
                (
                    Record::Call {
                        func_index: self.u32_at(at + 2),
                        offsets: self.u16_slice(at + 8, count),
                    },
                    8 + 2 * count,
                )
            }
            Shape::CallIndirect => {
                let count = self.u16_at(at + 12) as usize;
                (
                    Record::CallIndirect {
                        table_index: self.u32_at(at + 2),
                        type_index: self.u32_at(at + 6),
                        src: self.u16_at(at + 10),
                        offsets: self.u16_slice(at + 14, count),
                    },
                    14 + 2 * count,
                )
            }
            Shape::Select => (
                Record::Select {
                    cond: self.u16_at(at + 2),
                    value_size: self.u16_at(at + 4),
                    src0: self.u16_at(at + 6),
                    src1: self.u16_at(at + 8),
                    dst: self.u16_at(at + 10),
                },
                12,
            ),
            Shape::Throw => {
                let count = self.u16_at(at + 6) as usize;
                (
                    Record::Throw {
                        tag_index: self.u32_at(at + 2),
                        offsets: self.u16_slice(at + 8, count),
                    },
                    8 + 2 * count,
                )
            }
            Shape::RefFunc => (
                Record::RefFunc {
                    func_index: self.u32_at(at + 2),
                    dst: self.u16_at(at + 6),
                },
                8,
            ),
            Shape::BulkMemory => (
                Record::BulkMemory {
                    code,
                    index0: self.u32_at(at + 2),
                    index1: self.u32_at(at + 6),
                    src0: self.u16_at(at + 10),
                    src1: self.u16_at(at + 12),
                    src2: self.u16_at(at + 14),
                },
                16,
            ),
            Shape::SegmentDrop => (
                Record::SegmentDrop {
                    code,
                    seg_index: self.u32_at(at + 2),
                },
                6,
            ),
            Shape::MemorySize => (
                Record::MemorySize {
                    mem_index: self.u32_at(at + 2),
                    dst: self.u16_at(at + 6),
                },
                8,
            ),
            Shape::MemoryGrow => (
                Record::MemoryGrow {
                    mem_index: self.u32_at(at + 2),
                    src: self.u16_at(at + 6),
                    dst: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::TableGet => (
                Record::TableGet {
                    table_index: self.u32_at(at + 2),
                    src: self.u16_at(at + 6),
                    dst: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::TableSet => (
                Record::TableSet {
                    table_index: self.u32_at(at + 2),
                    src0: self.u16_at(at + 6),
                    src1: self.u16_at(at + 8),
                },
                10,
            ),
            Shape::TableGrow => (
                Record::TableGrow {
                    table_index: self.u32_at(at + 2),
                    src0: self.u16_at(at + 6),
                    src1: self.u16_at(at + 8),
                    dst: self.u16_at(at + 10),
                },
                12,
            ),
            Shape::TableSize => (
                Record::TableSize {
                    table_index: self.u32_at(at + 2),
                    dst: self.u16_at(at + 6),
                },
                8,
            ),
        };
        self.pos = at + size;
        Some((at, record))
    }
}

/// Render a bytecode buffer as one record per line.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (at, record) in BytecodeReader::new(bytes) {
        let name = match &record {
            Record::Const32 { .. } => Opcode::Const32.name(),
            Record::Const64 { .. } => Opcode::Const64.name(),
            Record::Const128 { .. } => Opcode::Const128.name(),
            Record::Shuffle { .. } => Opcode::I8X16Shuffle.name(),
            Record::Jump { .. } => Opcode::Jump.name(),
            Record::BrTable { .. } => Opcode::BrTable.name(),
            Record::End { .. } => Opcode::End.name(),
            Record::Call { .. } => Opcode::Call.name(),
            Record::CallIndirect { .. } => Opcode::CallIndirect.name(),
            Record::Select { .. } => Opcode::Select.name(),
            Record::Throw { .. } => Opcode::Throw.name(),
            Record::RefFunc { .. } => Opcode::RefFunc.name(),
            Record::MemorySize { .. } => Opcode::MemorySize.name(),
            Record::MemoryGrow { .. } => Opcode::MemoryGrow.name(),
            Record::TableGet { .. } => Opcode::TableGet.name(),
            Record::TableSet { .. } => Opcode::TableSet.name(),
            Record::TableGrow { .. } => Opcode::TableGrow.name(),
            Record::TableSize { .. } => Opcode::TableSize.name(),
            other => other.opcode().map(|c| c.name()).unwrap_or("???"),
        };
        let _ = writeln!(out, "{at:6}: {name} {record:?}");
    }
    out
}
