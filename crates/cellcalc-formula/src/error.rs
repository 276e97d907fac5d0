//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while tokenizing formula text
///
/// Evaluation itself never fails this way: its outcome is always an
/// [`Evaluation`](crate::Evaluation) carrying an optional cell error.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Character that cannot start any token
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    /// Malformed numeric literal
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Reference to invalid cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
