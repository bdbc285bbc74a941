use thiserror::Error;

/// Errors surfaced by the module parser and bytecode compiler.
///
/// All variants render as plain human-readable strings; parsing aborts
/// at the first error and any partially built result is dropped.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input is not a well-formed wasm binary (truncation, bad magic,
    /// malformed LEB128, ...).
    #[error("{0}")]
    Malformed(String),

    /// The binary is well-formed but rejected by validation.
    #[error("{0}")]
    Validation(String),

    /// A function needs more than `u16::MAX` bytes of value stack.
    #[error("too many stack usage")]
    StackLimitExceeded,

    /// An instruction outside the supported feature set.
    #[error("unsupported instruction: {0}")]
    Unsupported(String),
}

impl CompileError {
    pub(crate) fn malformed(err: wasmparser::BinaryReaderError) -> Self {
        CompileError::Malformed(err.to_string())
    }

    pub(crate) fn unsupported(op: &wasmparser::Operator<'_>) -> Self {
        CompileError::Unsupported(format!("{op:?}"))
    }
}
