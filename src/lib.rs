pub mod bytecode;
mod engine;
mod error;
pub mod floats;
mod module;
mod parse;
mod value;

pub use engine::Engine;
pub use error::CompileError;
pub use module::{
    CatchInfo, Data, Element, ExportType, ExternKind, GlobalType, ImportType, MemoryType, Module,
    ModuleFunction, ParsingResult, SegmentMode, TableType, TagType,
};
pub use value::{stack_allocated_size, value_size, FunctionType, ValueType};
