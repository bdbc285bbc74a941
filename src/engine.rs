use wasmparser::{Validator, WasmFeatures};

/// Shared compilation configuration.
///
/// The feature set is pinned to the proposals the bytecode compiler
/// understands; everything else is rejected by validation before any
/// bytecode is generated.
pub struct Engine {
    features: WasmFeatures,
}

impl Engine {
    /// Create a new validator with the engine's features.
    pub fn new_validator(&self) -> Validator {
        Validator::new_with_features(self.features)
    }

    pub fn features(&self) -> WasmFeatures {
        self.features
    }
}

impl Default for Engine {
    fn default() -> Self {
        let mut features = WasmFeatures::default();
        features.set(WasmFeatures::MUTABLE_GLOBAL, true);
        features.set(WasmFeatures::SIGN_EXTENSION, true);
        features.set(WasmFeatures::SATURATING_FLOAT_TO_INT, true);
        features.set(WasmFeatures::MULTI_VALUE, true);
        features.set(WasmFeatures::REFERENCE_TYPES, true);
        features.set(WasmFeatures::BULK_MEMORY, true);
        features.set(WasmFeatures::MULTI_MEMORY, true);
        features.set(WasmFeatures::SIMD, true);
        features.set(WasmFeatures::EXCEPTIONS, true);
        features.set(WasmFeatures::LEGACY_EXCEPTIONS, true);

        features.set(WasmFeatures::THREADS, false);
        features.set(WasmFeatures::SHARED_EVERYTHING_THREADS, false);
        features.set(WasmFeatures::TAIL_CALL, false);
        features.set(WasmFeatures::FUNCTION_REFERENCES, false);
        features.set(WasmFeatures::GC, false);
        features.set(WasmFeatures::MEMORY64, false);
        features.set(WasmFeatures::RELAXED_SIMD, false);
        features.set(WasmFeatures::EXTENDED_CONST, false);
        features.set(WasmFeatures::COMPONENT_MODEL, false);
        features.set(WasmFeatures::CUSTOM_PAGE_SIZES, false);
        Self { features }
    }
}
