use crate::bytecode::dump::{BytecodeReader, Record};
use crate::bytecode::{Opcode, FLAG_MERGE_COMPARE};
use crate::{Engine, Module, ModuleFunction, ParsingResult};

fn compile(wat: &str) -> ParsingResult {
    Module::new(&Engine::default(), wat)
        .expect("module should compile")
        .into_result()
}

fn records(func: &ModuleFunction) -> Vec<(usize, Record)> {
    BytecodeReader::new(&func.byte_code).collect()
}

#[test]
fn identity_function_keeps_parameter_in_place() {
    let result = compile("(module (func (param i32) (result i32) local.get 0))");
    let func = &result.functions[0];
    let recs = records(func);
    // A single End whose result offset is the parameter's home slot;
    // no move is emitted.
    assert_eq!(recs, vec![(0, Record::End { offsets: vec![0] })]);
    assert_eq!(func.required_stack_size, 8);
}

#[test]
fn add_two_constants() {
    let result = compile("(module (func (result i32) i32.const 3 i32.const 4 i32.add))");
    let func = &result.functions[0];
    let recs = records(func);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 3 }),
            (8, Record::Const32 { dst: 4, value: 4 }),
            (
                16,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 0,
                    src1: 4,
                    dst: 0,
                }
            ),
            (26, Record::End { offsets: vec![0] }),
        ]
    );
    assert_eq!(func.required_stack_size, 8);
}

#[test]
fn if_else_with_result_patches_both_jumps() {
    let result = compile(
        "(module (func (result i32)
            i32.const 1
            (if (result i32) (then i32.const 10) (else i32.const 20))))",
    );
    let recs = records(&result.functions[0]);
    assert_eq!(recs[0], (0, Record::Const32 { dst: 0, value: 1 }));
    // JumpIfFalse lands exactly on the else arm.
    assert_eq!(
        recs[1],
        (
            8,
            Record::JumpIf {
                code: Opcode::JumpIfFalse,
                src: 0,
                offset: 22,
            }
        )
    );
    assert_eq!(recs[2], (16, Record::Const32 { dst: 0, value: 10 }));
    // The then arm jumps exactly to the end of the block.
    assert_eq!(recs[3], (24, Record::Jump { offset: 14 }));
    assert_eq!(recs[4], (30, Record::Const32 { dst: 0, value: 20 }));
    assert_eq!(recs[5], (38, Record::End { offsets: vec![0] }));
}

#[test]
fn loop_branch_jumps_backwards() {
    let result = compile("(module (func (loop (br_if 0 (i32.const 1)))))");
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 1 }),
            (
                8,
                Record::JumpIf {
                    code: Opcode::JumpIfTrue,
                    src: 0,
                    offset: -8,
                }
            ),
            (16, Record::End { offsets: vec![] }),
        ]
    );
}

#[test]
fn br_table_slots_resolve_to_block_ends() {
    let result = compile(
        "(module (func (param i32)
            (block
              (block
                (block
                  local.get 0
                  br_table 0 1 2)
                i32.const 1
                drop))))",
    );
    let recs = records(&result.functions[0]);
    let (at, Record::BrTable { src, targets }) = recs[0].clone() else {
        panic!("expected a br_table header, got {:?}", recs[0]);
    };
    assert_eq!(at, 0);
    assert_eq!(src, 0);
    // Slot values are relative to the header: the innermost block ends
    // right after the table, the outer two after the dropped constant.
    assert_eq!(targets, vec![20, 28, 28]);
    assert_eq!(recs[1], (20, Record::Const32 { dst: 4, value: 1 }));
    assert_eq!(recs[2], (28, Record::End { offsets: vec![] }));
}

#[test]
fn write_invalidated_local_reads_are_copied() {
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            i32.const 1
            local.set 0
            local.get 0
            i32.add))",
    );
    let recs = records(&result.functions[0]);
    // Both reads overlap a live range that sees the write, so both are
    // copied out of the home slot before use.
    assert_eq!(
        recs,
        vec![
            (0, Record::Move { code: Opcode::Move32, src: 0, dst: 4 }),
            (6, Record::Const32 { dst: 8, value: 1 }),
            (14, Record::Move { code: Opcode::Move32, src: 8, dst: 0 }),
            (20, Record::Move { code: Opcode::Move32, src: 0, dst: 8 }),
            (
                26,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 4,
                    src1: 8,
                    dst: 4,
                }
            ),
            (36, Record::End { offsets: vec![4] }),
        ]
    );
}

#[test]
fn reads_outside_write_ranges_stay_direct() {
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            i32.const 1
            i32.add
            local.set 0
            local.get 0))",
    );
    let recs = records(&result.functions[0]);
    // The write happens after the first read's value is consumed and
    // before the second read's range opens: both reads alias slot 0.
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 8, value: 1 }),
            (
                8,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 0,
                    src1: 8,
                    dst: 4,
                }
            ),
            (18, Record::Move { code: Opcode::Move32, src: 4, dst: 0 }),
            (24, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn block_parameters_are_rehomed() {
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            (block (param i32) (result i32)
              i32.const 1
              i32.add)))",
    );
    let recs = records(&result.functions[0]);
    // The direct-referenced parameter is moved to its non-optimized
    // slot when the block binds it, so all entries agree on locations.
    assert_eq!(
        recs,
        vec![
            (0, Record::Move { code: Opcode::Move32, src: 0, dst: 4 }),
            (6, Record::Const32 { dst: 8, value: 1 }),
            (
                14,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 4,
                    src1: 8,
                    dst: 4,
                }
            ),
            (24, Record::End { offsets: vec![4] }),
        ]
    );
}

#[test]
fn compare_followed_by_branch_gets_merge_flag() {
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            i32.const 3
            i32.lt_s
            (if (result i32) (then i32.const 1) (else i32.const 0))))",
    );
    let recs = records(&result.functions[0]);
    let cmp = recs
        .iter()
        .find_map(|(_, r)| match r {
            Record::Binary { code: Opcode::I32LtS, flags, .. } => Some(*flags),
            _ => None,
        })
        .expect("compare record");
    assert_eq!(cmp, FLAG_MERGE_COMPARE);
}

#[test]
fn lone_compare_is_not_merge_tagged() {
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            i32.const 3
            i32.lt_s))",
    );
    let recs = records(&result.functions[0]);
    let flags = recs
        .iter()
        .find_map(|(_, r)| match r {
            Record::Binary { code: Opcode::I32LtS, flags, .. } => Some(*flags),
            _ => None,
        })
        .expect("compare record");
    assert_eq!(flags, 0);
}

#[test]
fn select_records_value_size_and_three_slots() {
    let result = compile(
        "(module (func (result i32)
            i32.const 1
            i32.const 2
            i32.const 0
            select))",
    );
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs[3],
        (
            24,
            Record::Select {
                cond: 8,
                value_size: 4,
                src0: 0,
                src1: 4,
                dst: 0,
            }
        )
    );
    assert_eq!(recs[4], (36, Record::End { offsets: vec![0] }));
}

#[test]
fn call_trailer_lists_argument_then_result_slots() {
    let result = compile(
        "(module
            (func $f (param i32) (result i32) local.get 0)
            (func (result i32) i32.const 7 call $f))",
    );
    let recs = records(&result.functions[1]);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 7 }),
            (
                8,
                Record::Call {
                    func_index: 0,
                    offsets: vec![0, 0],
                }
            ),
            (20, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn call_indirect_remembers_signature_and_table() {
    let result = compile(
        "(module
            (type $t (func (param i32) (result i32)))
            (table 1 funcref)
            (func (param i32) (result i32) local.get 0)
            (func (result i32)
              i32.const 5
              i32.const 0
              call_indirect (type $t)))",
    );
    let recs = records(&result.functions[1]);
    assert_eq!(
        recs[2],
        (
            16,
            Record::CallIndirect {
                table_index: 0,
                type_index: 0,
                src: 4,
                offsets: vec![0, 0],
            }
        )
    );
}

#[test]
fn global_accesses_are_width_tagged() {
    let result = compile(
        "(module
            (global $g (mut i64) (i64.const 5))
            (func
              global.get $g
              drop
              i64.const 1
              global.set $g))",
    );
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs,
        vec![
            (
                0,
                Record::GlobalAccess {
                    code: Opcode::GlobalGet64,
                    slot: 0,
                    global_index: 0,
                }
            ),
            (8, Record::Const64 { dst: 0, value: 1 }),
            (
                20,
                Record::GlobalAccess {
                    code: Opcode::GlobalSet64,
                    slot: 0,
                    global_index: 0,
                }
            ),
            (28, Record::End { offsets: vec![] }),
        ]
    );
    // The global's init expression is itself a tiny compiled function.
    let init = result.global_types[0].init.as_ref().expect("init expr");
    assert_eq!(
        records(init),
        vec![
            (0, Record::Const64 { dst: 0, value: 5 }),
            (12, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn zero_offset_loads_and_stores_use_short_forms() {
    let result = compile(
        "(module (memory 1)
            (func (param i32) (result i32) local.get 0 i32.load)
            (func (param i32) local.get 0 i32.const 0 i32.store offset=8))",
    );
    let load = records(&result.functions[0]);
    assert_eq!(
        load[0],
        (0, Record::Load { code: Opcode::Load32, src: 0, dst: 4 })
    );
    let store = records(&result.functions[1]);
    assert_eq!(store[0], (0, Record::Const32 { dst: 8, value: 0 }));
    assert_eq!(
        store[1],
        (
            8,
            Record::MemoryStore {
                code: Opcode::I32Store,
                src0: 0,
                src1: 8,
                offset: 8,
            }
        )
    );
}

#[test]
fn throw_suspends_emission_and_records_catch_region() {
    let result = compile(
        "(module
            (tag $t (param i32))
            (func
              try
                i32.const 5 throw $t
              catch $t
                drop
              end))",
    );
    let func = &result.functions[0];
    let recs = records(func);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 5 }),
            (
                8,
                Record::Throw {
                    tag_index: 0,
                    offsets: vec![0],
                }
            ),
            (18, Record::End { offsets: vec![] }),
        ]
    );
    assert_eq!(func.catch_info.len(), 1);
    let catch = &func.catch_info[0];
    assert_eq!(catch.try_start, 0);
    assert_eq!(catch.try_end, 18);
    assert_eq!(catch.catch_start, 18);
    assert_eq!(catch.stack_size_at_catch, 0);
    assert_eq!(catch.tag_index, 0);
}

#[test]
fn fallthrough_try_jumps_over_handler() {
    let result = compile(
        "(module
            (tag $t)
            (func try catch $t end))",
    );
    let func = &result.functions[0];
    let recs = records(func);
    assert_eq!(
        recs,
        vec![
            (0, Record::Jump { offset: 6 }),
            (6, Record::End { offsets: vec![] }),
        ]
    );
    assert_eq!(func.catch_info.len(), 1);
    let catch = &func.catch_info[0];
    assert_eq!(catch.try_start, 0);
    assert_eq!(catch.try_end, 0);
    assert_eq!(catch.catch_start, 6);
    assert_eq!(catch.tag_index, 0);
}

#[test]
fn catch_all_uses_sentinel_tag() {
    let result = compile(
        "(module
            (tag $t)
            (func try catch_all end))",
    );
    let func = &result.functions[0];
    assert_eq!(func.catch_info.len(), 1);
    assert_eq!(func.catch_info[0].tag_index, u32::MAX);
}

#[test]
fn unreachable_suspends_until_block_end() {
    let result = compile("(module (func (block unreachable i32.const 1 drop)))");
    let recs = records(&result.functions[0]);
    // Nothing after the unreachable is emitted; the suspension
    // propagates out of the block, so not even a final End appears.
    assert_eq!(recs, vec![(0, Record::Simple { code: Opcode::Unreachable })]);
}

#[test]
fn return_emits_end_and_stops() {
    let result = compile("(module (func (result i32) i32.const 1 return))");
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 1 }),
            (8, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn branch_past_all_blocks_acts_like_return() {
    let result = compile(
        "(module (func (result i32)
            (block (result i32)
              i32.const 7
              br 1)))",
    );
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs,
        vec![
            (0, Record::Const32 { dst: 0, value: 7 }),
            (8, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn conditional_return_jumps_over_inline_end() {
    let result = compile(
        "(module (func (param i32) (result i32)
            i32.const 1
            local.get 0
            br_if 0
            drop
            i32.const 2))",
    );
    let recs = records(&result.functions[0]);
    // JumpIfFalse skips exactly the inline End record (8 + 4 + 2 bytes).
    assert_eq!(
        recs[1],
        (
            8,
            Record::JumpIf {
                code: Opcode::JumpIfFalse,
                src: 0,
                offset: 14,
            }
        )
    );
    assert_eq!(recs[2], (16, Record::End { offsets: vec![4] }));
    assert_eq!(recs[3], (22, Record::Const32 { dst: 4, value: 2 }));
    assert_eq!(recs[4], (30, Record::End { offsets: vec![4] }));
}

#[test]
fn reinterpret_casts_lower_to_moves_or_nothing() {
    let result = compile(
        "(module (func (param f32) (result i32)
            local.get 0
            i32.reinterpret_f32))",
    );
    let recs = records(&result.functions[0]);
    // The parameter aliases slot 0 and the result lands in a fresh
    // slot, so the cast is a single 4-byte move.
    assert_eq!(
        recs,
        vec![
            (0, Record::Move { code: Opcode::Move32, src: 0, dst: 4 }),
            (6, Record::End { offsets: vec![4] }),
        ]
    );
}

#[test]
fn ref_null_and_is_null_use_pointer_width() {
    let result = compile(
        "(module (func (result i32)
            ref.null func
            ref.is_null))",
    );
    let recs = records(&result.functions[0]);
    if std::mem::size_of::<usize>() == 8 {
        assert_eq!(recs[0], (0, Record::Const64 { dst: 0, value: 0 }));
        assert_eq!(
            recs[1],
            (
                12,
                Record::Unary {
                    code: Opcode::I64Eqz,
                    flags: 0,
                    src: 0,
                    dst: 0,
                }
            )
        );
    } else {
        assert_eq!(recs[0], (0, Record::Const32 { dst: 0, value: 0 }));
    }
}

#[test]
fn v128_constants_and_lane_ops() {
    let result = compile(
        "(module (func (result i32)
            v128.const i32x4 1 2 3 4
            i32x4.extract_lane 2))",
    );
    let recs = records(&result.functions[0]);
    let mut expected = [0u8; 16];
    expected[0..4].copy_from_slice(&1u32.to_le_bytes());
    expected[4..8].copy_from_slice(&2u32.to_le_bytes());
    expected[8..12].copy_from_slice(&3u32.to_le_bytes());
    expected[12..16].copy_from_slice(&4u32.to_le_bytes());
    assert_eq!(
        recs,
        vec![
            (0, Record::Const128 { dst: 0, value: expected }),
            (
                20,
                Record::ExtractLane {
                    code: Opcode::I32X4ExtractLane,
                    lane: 2,
                    src: 0,
                    dst: 0,
                }
            ),
            (28, Record::End { offsets: vec![0] }),
        ]
    );
}

#[test]
fn oversized_stack_is_rejected() {
    let pushes = "(i32.const 0) ".repeat(17000);
    let drops = "(drop) ".repeat(17000);
    let wat = format!("(module (func {pushes} {drops}))");
    let err = Module::new(&Engine::default(), &wat).unwrap_err();
    assert_eq!(err.to_string(), "too many stack usage");
}

#[test]
fn overlapping_direct_references_share_the_home_slot() {
    // Three overlapping reads of the same local, no writes: every read
    // aliases the home slot and the adds consume them pairwise.
    let result = compile(
        "(module (func (param i32) (result i32)
            local.get 0
            local.get 0
            local.get 0
            i32.add
            i32.add))",
    );
    let recs = records(&result.functions[0]);
    assert_eq!(
        recs,
        vec![
            (
                0,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 0,
                    src1: 0,
                    dst: 8,
                }
            ),
            (
                10,
                Record::Binary {
                    code: Opcode::I32Add,
                    flags: 0,
                    src0: 0,
                    src1: 8,
                    dst: 4,
                }
            ),
            (20, Record::End { offsets: vec![4] }),
        ]
    );
}
