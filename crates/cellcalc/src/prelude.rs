//! Prelude module - common imports for cellcalc users
//!
//! ```rust
//! use cellcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationStats,
    CellAddress,
    CellError,
    // Formula types
    Evaluation,
    Evaluator,
    EvaluatorOptions,
    // Error types
    Error,
    Result,
    Token,
    // Main types
    Worksheet,
    // Extension traits
    WorksheetCalculationExt,
};
