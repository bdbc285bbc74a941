//! Parsed module entities and the aggregate parsing result.
//!
//! `ParsingResult` owns everything the parser produces. Cross-references
//! between entities are plain indices into the parallel vectors, so the
//! ownership tree has no cycles and teardown is a single drop.

use crate::bytecode;
use crate::engine::Engine;
use crate::parse;
use crate::value::{ref_size, FunctionType, ValueType};

/// What kind of entity an import or export refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternKind {
    Function,
    Table,
    Memory,
    Global,
    Tag,
}

/// One import: kind, module/field names and the index of the imported
/// entity in its kind's index space.
#[derive(Debug, Clone)]
pub struct ImportType {
    pub kind: ExternKind,
    pub module: String,
    pub field: String,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct ExportType {
    pub kind: ExternKind,
    pub name: String,
    pub item_index: u32,
}

#[derive(Debug, Clone)]
pub struct TableType {
    pub element_type: ValueType,
    pub initial: u64,
    pub maximum: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MemoryType {
    pub initial: u64,
    pub maximum: Option<u64>,
}

/// A global's type plus its compiled init expression (absent for
/// imported globals).
#[derive(Debug)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool,
    pub init: Option<ModuleFunction>,
}

/// A tag's signature, as an index into the function-type list.
#[derive(Debug, Clone)]
pub struct TagType {
    pub sig_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Active,
    Passive,
    Declared,
}

/// An element segment. Entries are function indices; `u32::MAX` stands
/// for `ref.null`.
#[derive(Debug)]
pub struct Element {
    pub mode: SegmentMode,
    pub table_index: u32,
    pub offset: Option<ModuleFunction>,
    pub function_indices: Vec<u32>,
}

#[derive(Debug)]
pub struct Data {
    pub memory_index: u32,
    pub offset: Option<ModuleFunction>,
    pub data: Vec<u8>,
}

/// One guarded byte range of a function's bytecode. `tag_index` is
/// `u32::MAX` for `catch_all` handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchInfo {
    pub try_start: u32,
    pub try_end: u32,
    pub catch_start: u32,
    pub stack_size_at_catch: u32,
    pub tag_index: u32,
}

/// A function's type, declared locals and compiled bytecode.
///
/// Imported functions keep an empty bytecode buffer. The buffer is
/// mutated only while the function body is compiled; afterwards the
/// whole struct is immutable.
#[derive(Debug)]
pub struct ModuleFunction {
    pub func_type: FunctionType,
    /// Declared locals, excluding parameters.
    pub locals: Vec<ValueType>,
    pub byte_code: Vec<u8>,
    /// High-water mark of the value stack, in bytes.
    pub required_stack_size: u32,
    /// Portion of the stack occupied by declared locals.
    pub required_stack_size_due_to_local: u32,
    pub catch_info: Vec<CatchInfo>,
}

impl ModuleFunction {
    pub(crate) fn new(func_type: FunctionType) -> Self {
        ModuleFunction {
            func_type,
            locals: Vec::new(),
            byte_code: Vec::new(),
            required_stack_size: 0,
            required_stack_size_due_to_local: 0,
            catch_info: Vec::new(),
        }
    }

    /// Render the compiled bytecode as text (for debugging).
    pub fn dump(&self) -> String {
        bytecode::dump::disassemble(&self.byte_code)
    }
}

/// Everything decoded from one wasm binary, in section order.
#[derive(Debug)]
pub struct ParsingResult {
    pub version: u32,
    pub function_types: Vec<FunctionType>,
    pub functions: Vec<ModuleFunction>,
    pub imports: Vec<ImportType>,
    pub exports: Vec<ExportType>,
    pub table_types: Vec<TableType>,
    pub memory_types: Vec<MemoryType>,
    pub global_types: Vec<GlobalType>,
    pub tag_types: Vec<TagType>,
    pub elements: Vec<Element>,
    pub datas: Vec<Data>,
    pub start: Option<u32>,
    /// Byte width of reference values, fixed at construction. Selects
    /// between the 32- and 64-bit lowerings of `ref.null`/`ref.is_null`.
    pub ref_size: u32,
}

impl ParsingResult {
    pub(crate) fn new() -> Self {
        ParsingResult {
            version: 0,
            function_types: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            table_types: Vec::new(),
            memory_types: Vec::new(),
            global_types: Vec::new(),
            tag_types: Vec::new(),
            elements: Vec::new(),
            datas: Vec::new(),
            start: None,
            ref_size: ref_size(),
        }
    }
}

/// A parsed and compiled wasm module (immutable).
#[derive(Debug)]
pub struct Module {
    result: ParsingResult,
}

impl Module {
    /// Parse a WAT string into a module.
    pub fn new(engine: &Engine, wat: &str) -> Result<Self, anyhow::Error> {
        let bytes = wat::parse_str(wat)?;
        Self::from_bytes(engine, &bytes)
    }

    /// Create a module from raw wasm bytes.
    pub fn from_bytes(engine: &Engine, bytes: &[u8]) -> Result<Self, anyhow::Error> {
        let result = parse::parse(engine, bytes)?;
        Ok(Module { result })
    }

    pub fn result(&self) -> &ParsingResult {
        &self.result
    }

    pub fn into_result(self) -> ParsingResult {
        self.result
    }

    /// Look up an exported function's index by name.
    pub fn export_func(&self, name: &str) -> Option<u32> {
        self.result
            .exports
            .iter()
            .find(|e| e.kind == ExternKind::Function && e.name == name)
            .map(|e| e.item_index)
    }

    /// Dump one function's bytecode (for debugging).
    pub fn dump_func(&self, idx: usize) -> String {
        self.result.functions[idx].dump()
    }
}
