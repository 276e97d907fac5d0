//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`Token`] - One lexical unit of a stored formula
//! - [`CellError`] - The error recorded against a cell
//! - [`CellData`] - A cell's formula together with its last computed result

mod address;
mod storage;
mod token;
mod value;

pub use address::CellAddress;
pub use storage::CellStorage;
pub use token::{Operator, Token};
pub use value::{CellData, CellError};
