//! # cellcalc-core
//!
//! Core data structures for the cellcalc formula engine.
//!
//! This crate provides the fundamental types used throughout cellcalc:
//! - [`CellAddress`] - Cell addressing and the label-validity convention
//! - [`Token`] - The lexical units a formula is made of
//! - [`CellError`] - The stable error taxonomy stored alongside cell values
//! - [`Worksheet`] - A sparse store of formula cells and their computed results
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{Operator, Token, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet
//!     .set_cell_formula("A1", vec![Token::Number(2.0)], "2")
//!     .unwrap();
//! sheet
//!     .set_cell_formula(
//!         "B1",
//!         vec![
//!             Token::reference("A1").unwrap(),
//!             Token::Operator(Operator::Multiply),
//!             Token::Number(3.0),
//!         ],
//!         "A1*3",
//!     )
//!     .unwrap();
//!
//! assert_eq!(sheet.formula_cells().count(), 2);
//! ```

pub mod cell;
pub mod error;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellData, CellError, CellStorage, Operator, Token};
pub use error::{Error, Result};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;
