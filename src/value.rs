//! Semantic sizes of wasm values on the byte-addressed value stack.
//!
//! The compiler reasons about the runtime value stack entirely
//! symbolically: every live value has a byte offset (its slot) and a
//! size. i32/f32 take 4 bytes, i64/f64 take 8, v128 takes 16 and
//! references take the machine pointer size.

use crate::error::CompileError;
use wasmparser::ValType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
    Void,
}

/// Byte size of a reference on the value stack (machine pointer width).
pub(crate) fn ref_size() -> u32 {
    std::mem::size_of::<usize>() as u32
}

/// Unpadded byte size of a value of type `ty`.
pub fn value_size(ty: ValueType) -> u32 {
    match ty {
        ValueType::I32 | ValueType::F32 => 4,
        ValueType::I64 | ValueType::F64 => 8,
        ValueType::V128 => 16,
        ValueType::FuncRef | ValueType::ExternRef => ref_size(),
        ValueType::Void => 0,
    }
}

/// Byte size a value of type `ty` occupies on the value stack,
/// rounded up to slot granularity.
pub fn stack_allocated_size(ty: ValueType) -> u32 {
    (value_size(ty) + 3) & !3
}

pub(crate) fn to_value_type(ty: ValType) -> Result<ValueType, CompileError> {
    match ty {
        ValType::I32 => Ok(ValueType::I32),
        ValType::I64 => Ok(ValueType::I64),
        ValType::F32 => Ok(ValueType::F32),
        ValType::F64 => Ok(ValueType::F64),
        ValType::V128 => Ok(ValueType::V128),
        ValType::Ref(r) => {
            if r.heap_type() == wasmparser::HeapType::FUNC {
                Ok(ValueType::FuncRef)
            } else if r.heap_type() == wasmparser::HeapType::EXTERN {
                Ok(ValueType::ExternRef)
            } else {
                Err(CompileError::Unsupported(format!(
                    "reference type {r:?} is not supported"
                )))
            }
        }
    }
}

/// An ordered parameter list and result list, with the precomputed
/// byte size of the parameter area on the value stack.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    params: Vec<ValueType>,
    results: Vec<ValueType>,
    param_stack_size: u32,
}

impl FunctionType {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        let param_stack_size = params.iter().map(|t| stack_allocated_size(*t)).sum();
        FunctionType {
            params,
            results,
            param_stack_size,
        }
    }

    /// The `() -> ty` signature used for constant init expressions.
    pub(crate) fn for_init_expr(ty: ValueType) -> Self {
        FunctionType::new(Vec::new(), vec![ty])
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn results(&self) -> &[ValueType] {
        &self.results
    }

    pub fn param_stack_size(&self) -> u32 {
        self.param_stack_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_sizes() {
        assert_eq!(value_size(ValueType::I32), 4);
        assert_eq!(value_size(ValueType::F32), 4);
        assert_eq!(value_size(ValueType::I64), 8);
        assert_eq!(value_size(ValueType::F64), 8);
        assert_eq!(value_size(ValueType::V128), 16);
        assert_eq!(value_size(ValueType::FuncRef), ref_size());
    }

    #[test]
    fn param_stack_size_sums_allocated_sizes() {
        let ft = FunctionType::new(
            vec![ValueType::I32, ValueType::I64, ValueType::V128],
            vec![ValueType::I32],
        );
        assert_eq!(ft.param_stack_size(), 4 + 8 + 16);
    }

    #[test]
    fn init_expr_type_has_no_params() {
        let ft = FunctionType::for_init_expr(ValueType::F64);
        assert!(ft.params().is_empty());
        assert_eq!(ft.results(), &[ValueType::F64]);
        assert_eq!(ft.param_stack_size(), 0);
    }
}
