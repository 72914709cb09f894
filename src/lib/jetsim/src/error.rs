//! Error taxonomy for the solver core (see `spec.md` §7).
//!
//! Divergence and degenerate-face recovery are deliberately *not*
//! represented here — both are handled locally (reset to ambient, zero
//! flux) and only logged, per the propagation policy in §7. Only the
//! invalid-argument class is surfaced to the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("grid dimensions must be at least 4x4, got {nx}x{ny}")]
    InvalidGrid { nx: usize, ny: usize },

    #[error("boundary parameters must be positive and finite: {reason}")]
    InvalidBoundaryParams { reason: String },

    #[error("unknown scalar field mode: {0}")]
    UnknownScalarMode(String),
}

impl From<SolverError> for wasm_bindgen::JsValue {
    fn from(err: SolverError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
