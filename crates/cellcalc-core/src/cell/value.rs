//! Cell error and cell data types

use super::Token;
use thiserror::Error;

/// Errors recorded against a cell's computed value
///
/// The `Display` form of every variant is a stable identifier that callers
/// can show to a user or persist next to the cell. [`CellError::from_message`]
/// maps such a string back to its variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// The formula has no tokens
    #[error("EmptyFormula")]
    EmptyFormula,
    /// Unexpected token, unmatched parenthesis or trailing tokens
    #[error("InvalidFormula")]
    InvalidFormula,
    /// Right-hand side of a division evaluated to exactly zero
    #[error("DivideByZero")]
    DivideByZero,
    /// A referenced cell holds no formula
    #[error("InvalidCell")]
    InvalidCell,
    /// Parentheses nest deeper than the evaluator allows
    #[error("FormulaTooComplex")]
    FormulaTooComplex,
    /// The cell takes part in a reference cycle
    #[error("CircularReference")]
    CircularReference,
    /// An error message from outside this taxonomy, kept verbatim
    #[error("{0}")]
    Other(String),
}

impl CellError {
    /// Get the stable identifier for this error
    pub fn as_str(&self) -> &str {
        match self {
            CellError::EmptyFormula => "EmptyFormula",
            CellError::InvalidFormula => "InvalidFormula",
            CellError::DivideByZero => "DivideByZero",
            CellError::InvalidCell => "InvalidCell",
            CellError::FormulaTooComplex => "FormulaTooComplex",
            CellError::CircularReference => "CircularReference",
            CellError::Other(msg) => msg,
        }
    }

    /// Map a stored message back to an error
    ///
    /// Unknown messages become [`CellError::Other`] so they survive unchanged.
    /// An empty message means no error and yields `None`.
    pub fn from_message(msg: &str) -> Option<Self> {
        let err = match msg {
            "" => return None,
            "EmptyFormula" => CellError::EmptyFormula,
            "InvalidFormula" => CellError::InvalidFormula,
            "DivideByZero" => CellError::DivideByZero,
            "InvalidCell" => CellError::InvalidCell,
            "FormulaTooComplex" => CellError::FormulaTooComplex,
            "CircularReference" => CellError::CircularReference,
            other => CellError::Other(other.to_string()),
        };
        Some(err)
    }
}

/// A stored formula together with its last computed result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// Formula text as entered, kept for display
    pub source: String,
    /// Tokenized formula
    pub formula: Vec<Token>,
    /// Last computed value (meaningless while `error` is set)
    pub value: f64,
    /// Error from the last evaluation, if any
    pub error: Option<CellError>,
}

impl CellData {
    /// Create a cell holding a formula that has not been evaluated yet
    pub fn new<S: Into<String>>(formula: Vec<Token>, source: S) -> Self {
        Self {
            source: source.into(),
            formula,
            value: 0.0,
            error: None,
        }
    }

    /// Check if the last evaluation failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error message, or `""` when the cell evaluated cleanly
    pub fn error_message(&self) -> &str {
        self.error.as_ref().map_or("", CellError::as_str)
    }
}
