//! Whole-module parsing tests: section assembly, index spaces and the
//! error surfaces of the top-level parse.

use kelp::{
    CompileError, Engine, ExternKind, Module, SegmentMode, ValueType,
};

fn parse(wat: &str) -> Module {
    Module::new(&Engine::default(), wat).expect("module should parse")
}

#[test]
fn version_and_empty_module() {
    let module = parse("(module)");
    let result = module.result();
    assert_eq!(result.version, 1);
    assert!(result.functions.is_empty());
    assert!(result.start.is_none());
    assert_eq!(result.ref_size as usize, std::mem::size_of::<usize>());
}

#[test]
fn imports_occupy_the_front_of_each_index_space() {
    let module = parse(
        r#"(module
            (import "env" "f" (func $f (param i32)))
            (import "env" "t" (table 1 funcref))
            (import "env" "m" (memory 1))
            (import "env" "g" (global i64))
            (func (param i32))
        )"#,
    );
    let result = module.result();
    assert_eq!(result.imports.len(), 4);
    assert_eq!(result.imports[0].kind, ExternKind::Function);
    assert_eq!(result.imports[0].module, "env");
    assert_eq!(result.imports[0].field, "f");
    assert_eq!(result.imports[0].index, 0);
    assert_eq!(result.imports[1].kind, ExternKind::Table);
    assert_eq!(result.imports[2].kind, ExternKind::Memory);
    assert_eq!(result.imports[3].kind, ExternKind::Global);

    // The imported function holds an empty body; the defined one was
    // compiled.
    assert_eq!(result.functions.len(), 2);
    assert!(result.functions[0].byte_code.is_empty());
    assert!(!result.functions[1].byte_code.is_empty());
    assert_eq!(result.global_types[0].value_type, ValueType::I64);
    assert!(result.global_types[0].init.is_none());
}

#[test]
fn exports_keep_kind_and_item_index() {
    let module = parse(
        r#"(module
            (memory 1)
            (global $g i32 (i32.const 0))
            (func $f)
            (export "run" (func $f))
            (export "mem" (memory 0))
            (export "g" (global $g))
        )"#,
    );
    let result = module.result();
    assert_eq!(result.exports.len(), 3);
    assert_eq!(result.exports[0].kind, ExternKind::Function);
    assert_eq!(result.exports[0].name, "run");
    assert_eq!(result.exports[0].item_index, 0);
    assert_eq!(result.exports[1].kind, ExternKind::Memory);
    assert_eq!(result.exports[2].kind, ExternKind::Global);
    assert_eq!(module.export_func("run"), Some(0));
    assert_eq!(module.export_func("mem"), None);
}

#[test]
fn multi_memory_modules_parse() {
    let module = parse(
        r#"(module
            (memory $a 1 2)
            (memory $b 3)
        )"#,
    );
    let result = module.result();
    assert_eq!(result.memory_types.len(), 2);
    assert_eq!(result.memory_types[0].initial, 1);
    assert_eq!(result.memory_types[0].maximum, Some(2));
    assert_eq!(result.memory_types[1].initial, 3);
    assert_eq!(result.memory_types[1].maximum, None);
}

#[test]
fn tables_and_element_segments() {
    let module = parse(
        r#"(module
            (table $t 4 10 funcref)
            (func $a)
            (func $b)
            (elem (table $t) (i32.const 1) func $a $b)
            (elem func $a)
            (elem declare func $b)
        )"#,
    );
    let result = module.result();
    assert_eq!(result.table_types.len(), 1);
    assert_eq!(result.table_types[0].element_type, ValueType::FuncRef);
    assert_eq!(result.table_types[0].initial, 4);
    assert_eq!(result.table_types[0].maximum, Some(10));

    assert_eq!(result.elements.len(), 3);
    let active = &result.elements[0];
    assert_eq!(active.mode, SegmentMode::Active);
    assert_eq!(active.table_index, 0);
    assert!(active.offset.is_some());
    assert_eq!(active.function_indices, vec![0, 1]);
    assert_eq!(result.elements[1].mode, SegmentMode::Passive);
    assert!(result.elements[1].offset.is_none());
    assert_eq!(result.elements[2].mode, SegmentMode::Declared);
}

#[test]
fn element_expressions_map_ref_null_to_sentinel() {
    let module = parse(
        r#"(module
            (table 4 funcref)
            (func $a)
            (elem (i32.const 0) funcref (ref.func $a) (ref.null func))
        )"#,
    );
    let result = module.result();
    assert_eq!(result.elements[0].function_indices, vec![0, u32::MAX]);
}

#[test]
fn data_segments_keep_bytes_and_memory_index() {
    let module = parse(
        r#"(module
            (memory 1)
            (data (i32.const 16) "hello")
            (data "passive")
        )"#,
    );
    let result = module.result();
    assert_eq!(result.datas.len(), 2);
    assert_eq!(result.datas[0].memory_index, 0);
    assert!(result.datas[0].offset.is_some());
    assert_eq!(result.datas[0].data, b"hello");
    assert!(result.datas[1].offset.is_none());
    assert_eq!(result.datas[1].data, b"passive");
}

#[test]
fn start_function_and_tags() {
    let module = parse(
        r#"(module
            (tag $t (param i32 i64))
            (func $init)
            (start $init)
        )"#,
    );
    let result = module.result();
    assert_eq!(result.start, Some(0));
    assert_eq!(result.tag_types.len(), 1);
    let sig = result.tag_types[0].sig_index as usize;
    assert_eq!(
        result.function_types[sig].params(),
        &[ValueType::I32, ValueType::I64]
    );
}

#[test]
fn locals_grow_the_required_stack() {
    let module = parse("(module (func (local i64 i32)))");
    let func = &module.result().functions[0];
    assert_eq!(func.locals, vec![ValueType::I64, ValueType::I32]);
    assert_eq!(func.required_stack_size_due_to_local, 12);
    assert_eq!(func.required_stack_size, 12);
}

#[test]
fn malformed_binaries_are_rejected() {
    let engine = Engine::default();
    let err = Module::from_bytes(&engine, b"\0nope").unwrap_err();
    assert!(err.downcast_ref::<CompileError>().is_some());
}

#[test]
fn features_outside_the_accepted_set_are_rejected() {
    let engine = Engine::default();
    // Tail calls validate only with a feature this engine disables.
    let err = Module::new(
        &engine,
        "(module (func $f) (func (return_call $f)))",
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CompileError>(),
        Some(CompileError::Validation(_))
    ));
}

#[test]
fn type_mismatches_fail_validation() {
    let engine = Engine::default();
    let err = Module::new(&engine, "(module (func (result i32) i64.const 1))").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CompileError>(),
        Some(CompileError::Validation(_))
    ));
}

#[test]
fn dump_renders_one_line_per_record() {
    let module = parse("(module (func (result i32) i32.const 3 i32.const 4 i32.add))");
    let text = module.dump_func(0);
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("i32.add"));
    assert!(text.contains("const.32"));
}
