//! # cellcalc-formula
//!
//! Formula tokenizer and evaluator for cellcalc.
//!
//! This crate provides:
//! - Formula tokenizing (text → tokens)
//! - Formula evaluation (tokens → value), a fused recursive descent over
//!   `+ - * /`, parentheses and cell references
//! - Dependency tracking for calculation order
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_formula::{evaluate, tokenize, EmptySource};
//!
//! let tokens = tokenize("=(2+3)*4").unwrap();
//! let result = evaluate(&tokens, &EmptySource);
//! assert_eq!(result.value, 20.0);
//! assert_eq!(result.error_message(), "");
//! ```

pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod tokenizer;

pub use dependency::{extract_references, DependencyGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, CellSnapshot, CellSource, EmptySource, Evaluation, Evaluator, EvaluatorOptions,
};
pub use tokenizer::tokenize;
