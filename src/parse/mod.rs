//! Top-level binary parsing: validation, the section payload loop and
//! assembly of the `ParsingResult`.
//!
//! The whole binary is validated up front, so section decoding below can
//! rely on well-formed, type-correct input; the compiler's own stack
//! checks are debug assertions. Sections are consumed in binary order
//! and every entity index equals the current length of its list.

pub(crate) mod compiler;

use crate::engine::Engine;
use crate::error::CompileError;
use crate::module::{
    Data, Element, ExportType, ExternKind, GlobalType, ImportType, MemoryType, ModuleFunction,
    ParsingResult, SegmentMode, TableType, TagType,
};
use crate::value::{to_value_type, FunctionType, ValueType};
use compiler::FunctionCompiler;
use wasmparser::{
    CompositeInnerType, ConstExpr, ElementItems, ElementKind, ExternalKind, FunctionBody, Operator,
    Parser, Payload, TypeRef, ValType,
};

pub(crate) fn parse(engine: &Engine, bytes: &[u8]) -> Result<ParsingResult, CompileError> {
    let mut validator = engine.new_validator();
    validator
        .validate_all(bytes)
        .map_err(|e| CompileError::Validation(e.to_string()))?;

    let mut builder = ModuleBuilder::new();
    let parser = Parser::new(0);
    for payload in parser.parse_all(bytes) {
        builder.process_payload(payload.map_err(CompileError::malformed)?)?;
    }
    Ok(builder.result)
}

struct ModuleBuilder {
    result: ParsingResult,
    /// Function-kind imports occupy the first indices of the function
    /// space; code entries continue after them.
    num_function_imports: usize,
    code_entries: usize,
}

impl ModuleBuilder {
    fn new() -> Self {
        ModuleBuilder {
            result: ParsingResult::new(),
            num_function_imports: 0,
            code_entries: 0,
        }
    }

    fn process_payload(&mut self, payload: Payload<'_>) -> Result<(), CompileError> {
        match payload {
            Payload::Version { num, .. } => {
                self.result.version = num as u32;
            }
            Payload::TypeSection(reader) => {
                for group in reader {
                    let group = group.map_err(CompileError::malformed)?;
                    for sub in group.types() {
                        match &sub.composite_type.inner {
                            CompositeInnerType::Func(ft) => {
                                self.result.function_types.push(convert_func_type(ft)?);
                            }
                            other => {
                                return Err(CompileError::Unsupported(format!(
                                    "composite type {other:?} is not supported"
                                )))
                            }
                        }
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    self.parse_import(import.map_err(CompileError::malformed)?)?;
                }
            }
            Payload::FunctionSection(reader) => {
                for sig_index in reader {
                    let sig_index = sig_index.map_err(CompileError::malformed)?;
                    let func_type = self.result.function_types[sig_index as usize].clone();
                    self.result.functions.push(ModuleFunction::new(func_type));
                }
            }
            Payload::TableSection(reader) => {
                for table in reader {
                    let table = table.map_err(CompileError::malformed)?;
                    if let wasmparser::TableInit::Expr(_) = table.init {
                        return Err(CompileError::Unsupported(
                            "table init expressions are not supported".to_string(),
                        ));
                    }
                    self.result.table_types.push(convert_table_type(&table.ty)?);
                }
            }
            Payload::MemorySection(reader) => {
                for memory in reader {
                    let memory = memory.map_err(CompileError::malformed)?;
                    self.result.memory_types.push(MemoryType {
                        initial: memory.initial,
                        maximum: memory.maximum,
                    });
                }
            }
            Payload::TagSection(reader) => {
                for tag in reader {
                    let tag = tag.map_err(CompileError::malformed)?;
                    self.result.tag_types.push(TagType {
                        sig_index: tag.func_type_idx,
                    });
                }
            }
            Payload::GlobalSection(reader) => {
                for global in reader {
                    let global = global.map_err(CompileError::malformed)?;
                    let value_type = to_value_type(global.ty.content_type)?;
                    self.result.global_types.push(GlobalType {
                        value_type,
                        mutable: global.ty.mutable,
                        init: None,
                    });
                    let init = self.compile_init_expr(value_type, &global.init_expr)?;
                    self.result
                        .global_types
                        .last_mut()
                        .expect("global just pushed")
                        .init = Some(init);
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.map_err(CompileError::malformed)?;
                    self.result.exports.push(ExportType {
                        kind: convert_extern_kind(export.kind),
                        name: export.name.to_string(),
                        item_index: export.index,
                    });
                }
            }
            Payload::StartSection { func, .. } => {
                self.result.start = Some(func);
            }
            Payload::ElementSection(reader) => {
                for element in reader {
                    self.parse_element(element.map_err(CompileError::malformed)?)?;
                }
            }
            Payload::DataSection(reader) => {
                for data in reader {
                    self.parse_data(data.map_err(CompileError::malformed)?)?;
                }
            }
            Payload::CodeSectionEntry(body) => {
                self.compile_function_body(body)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_import(&mut self, import: wasmparser::Import<'_>) -> Result<(), CompileError> {
        let (kind, index) = match import.ty {
            TypeRef::Func(sig_index) => {
                let index = self.result.functions.len() as u32;
                let func_type = self.result.function_types[sig_index as usize].clone();
                self.result.functions.push(ModuleFunction::new(func_type));
                self.num_function_imports += 1;
                (ExternKind::Function, index)
            }
            TypeRef::Table(ty) => {
                let index = self.result.table_types.len() as u32;
                self.result.table_types.push(convert_table_type(&ty)?);
                (ExternKind::Table, index)
            }
            TypeRef::Memory(ty) => {
                let index = self.result.memory_types.len() as u32;
                self.result.memory_types.push(MemoryType {
                    initial: ty.initial,
                    maximum: ty.maximum,
                });
                (ExternKind::Memory, index)
            }
            TypeRef::Global(ty) => {
                let index = self.result.global_types.len() as u32;
                self.result.global_types.push(GlobalType {
                    value_type: to_value_type(ty.content_type)?,
                    mutable: ty.mutable,
                    init: None,
                });
                (ExternKind::Global, index)
            }
            TypeRef::Tag(ty) => {
                let index = self.result.tag_types.len() as u32;
                self.result.tag_types.push(TagType {
                    sig_index: ty.func_type_idx,
                });
                (ExternKind::Tag, index)
            }
        };
        self.result.imports.push(ImportType {
            kind,
            module: import.module.to_string(),
            field: import.name.to_string(),
            index,
        });
        Ok(())
    }

    fn parse_element(&mut self, element: wasmparser::Element<'_>) -> Result<(), CompileError> {
        let (mode, table_index, offset) = match &element.kind {
            ElementKind::Active {
                table_index,
                offset_expr,
            } => {
                let offset = self.compile_init_expr(ValueType::I32, offset_expr)?;
                (SegmentMode::Active, table_index.unwrap_or(0), Some(offset))
            }
            ElementKind::Passive => (SegmentMode::Passive, 0, None),
            ElementKind::Declared => (SegmentMode::Declared, 0, None),
        };

        let mut function_indices = Vec::new();
        match element.items {
            ElementItems::Functions(items) => {
                for index in items {
                    function_indices.push(index.map_err(CompileError::malformed)?);
                }
            }
            ElementItems::Expressions(_, items) => {
                for expr in items {
                    let expr = expr.map_err(CompileError::malformed)?;
                    function_indices.push(element_expr_function_index(&expr)?);
                }
            }
        }

        self.result.elements.push(Element {
            mode,
            table_index,
            offset,
            function_indices,
        });
        Ok(())
    }

    fn parse_data(&mut self, data: wasmparser::Data<'_>) -> Result<(), CompileError> {
        let (memory_index, offset) = match &data.kind {
            wasmparser::DataKind::Active {
                memory_index,
                offset_expr,
            } => {
                let offset = self.compile_init_expr(ValueType::I32, offset_expr)?;
                (*memory_index, Some(offset))
            }
            wasmparser::DataKind::Passive => (0, None),
        };
        self.result.datas.push(Data {
            memory_index,
            offset,
            data: data.data.to_vec(),
        });
        Ok(())
    }

    /// Compile a constant init expression into a tiny `() -> ty` function.
    fn compile_init_expr(
        &self,
        ty: ValueType,
        expr: &ConstExpr<'_>,
    ) -> Result<ModuleFunction, CompileError> {
        let func_type = FunctionType::for_init_expr(ty);
        let compiler = FunctionCompiler::new(&self.result, func_type.clone());
        let compiled = compiler.compile_init_expr(expr)?;
        Ok(compiled.into_function(func_type))
    }

    fn compile_function_body(&mut self, body: FunctionBody<'_>) -> Result<(), CompileError> {
        let func_index = self.num_function_imports + self.code_entries;
        self.code_entries += 1;

        let func_type = self.result.functions[func_index].func_type.clone();
        let compiler = FunctionCompiler::new(&self.result, func_type.clone());
        let compiled = compiler.compile_body(&body)?;

        self.result.functions[func_index] = compiled.into_function(func_type);
        Ok(())
    }
}

fn convert_func_type(ft: &wasmparser::FuncType) -> Result<FunctionType, CompileError> {
    let params = ft
        .params()
        .iter()
        .map(|t| to_value_type(*t))
        .collect::<Result<Vec<_>, _>>()?;
    let results = ft
        .results()
        .iter()
        .map(|t| to_value_type(*t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FunctionType::new(params, results))
}

fn convert_table_type(ty: &wasmparser::TableType) -> Result<TableType, CompileError> {
    Ok(TableType {
        element_type: to_value_type(ValType::Ref(ty.element_type))?,
        initial: ty.initial,
        maximum: ty.maximum,
    })
}

fn convert_extern_kind(kind: ExternalKind) -> ExternKind {
    match kind {
        ExternalKind::Func => ExternKind::Function,
        ExternalKind::Table => ExternKind::Table,
        ExternalKind::Memory => ExternKind::Memory,
        ExternalKind::Global => ExternKind::Global,
        ExternalKind::Tag => ExternKind::Tag,
    }
}

/// Decode one element expression item: `ref.null` becomes `u32::MAX`,
/// `ref.func i` becomes `i`.
fn element_expr_function_index(expr: &ConstExpr<'_>) -> Result<u32, CompileError> {
    let mut reader = expr.get_operators_reader();
    let mut value = None;
    while !reader.eof() {
        match reader.read().map_err(CompileError::malformed)? {
            Operator::RefNull { .. } => value = Some(u32::MAX),
            Operator::RefFunc { function_index } => value = Some(function_index),
            Operator::End => {}
            op => return Err(CompileError::unsupported(&op)),
        }
    }
    value.ok_or_else(|| CompileError::Malformed("empty element expression".to_string()))
}
