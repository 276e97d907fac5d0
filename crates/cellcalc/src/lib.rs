//! # cellcalc
//!
//! A spreadsheet-style formula engine: arithmetic formulas over numbers and
//! cell references, evaluated with correct precedence and a stable error
//! taxonomy instead of panics.
//!
//! ## Features
//!
//! - Tokenize formula text (`=A1*(2+3)`)
//! - Evaluate `+ - * /` with parentheses and cell references
//! - Recalculate a whole worksheet in dependency order
//! - Detect circular references during recalculation
//!
//! ## Example
//!
//! ```rust
//! use cellcalc::prelude::*;
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! cellcalc::set_formula(&mut sheet, "A1", "=10").unwrap();
//! cellcalc::set_formula(&mut sheet, "B1", "=A1/4").unwrap();
//!
//! let stats = sheet.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 2);
//!
//! let b1 = sheet.cell("B1").unwrap().unwrap();
//! assert_eq!(b1.value, 2.5);
//! assert_eq!(b1.error_message(), "");
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{CalculationOptions, CalculationStats, WorksheetCalculationExt};

// Re-export core types
pub use cellcalc_core::{
    CellAddress, CellData, CellError, Error, Operator, Result, Token, Worksheet, MAX_COLS,
    MAX_ROWS,
};

// Re-export formula types
pub use cellcalc_formula::{
    evaluate, extract_references, tokenize, CellSnapshot, CellSource, DependencyGraph,
    EmptySource, Evaluation, Evaluator, EvaluatorOptions, FormulaError, FormulaResult,
};

/// Tokenize `text` and store it as the formula of cell `label`
///
/// The cell's result is reset; call
/// [`calculate`](WorksheetCalculationExt::calculate) to compute it.
pub fn set_formula(sheet: &mut Worksheet, label: &str, text: &str) -> Result<()> {
    let address = CellAddress::parse(label)?;
    let tokens = tokenize(text).map_err(|e| Error::FormulaParse(e.to_string()))?;
    sheet.set_cell_formula_at(address, tokens, text.trim())
}
