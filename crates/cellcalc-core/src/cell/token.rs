//! Formula tokens

use super::CellAddress;
use crate::error::{Error, Result};
use std::fmt;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// The operator's source symbol
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Look up an operator by its symbol
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// One lexical unit of a formula
///
/// The kind of a token is decided once, when it is produced; evaluation only
/// matches on the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// Numeric literal
    Number(f64),
    /// `+`, `-`, `*` or `/`
    Operator(Operator),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// Reference to another cell
    Reference(CellAddress),
}

impl Token {
    /// Create a reference token from a cell label
    pub fn reference(label: &str) -> Result<Self> {
        CellAddress::parse(label).map(Token::Reference)
    }

    /// Classify the text form of a single token
    ///
    /// Numbers are written in plain decimal or exponent form and may carry a
    /// sign (`-3.5`, `1e3`). Words such as `inf` or `NaN` are not numbers.
    ///
    /// ```
    /// use cellcalc_core::{CellAddress, Operator, Token};
    ///
    /// assert_eq!(Token::from_text("2.5").unwrap(), Token::Number(2.5));
    /// assert_eq!(Token::from_text("*").unwrap(), Token::Operator(Operator::Multiply));
    /// assert_eq!(
    ///     Token::from_text("B3").unwrap(),
    ///     Token::Reference(CellAddress::new(2, 1))
    /// );
    /// assert!(Token::from_text("inf").is_err());
    /// ```
    pub fn from_text(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(op) = Operator::from_symbol(c) {
                return Ok(Token::Operator(op));
            }
            match c {
                '(' => return Ok(Token::LeftParen),
                ')' => return Ok(Token::RightParen),
                _ => {}
            }
        }

        if is_numeric_text(text) {
            if let Ok(n) = text.parse::<f64>() {
                return Ok(Token::Number(n));
            }
        }

        if CellAddress::is_valid_label(text) {
            return Token::reference(text);
        }

        Err(Error::InvalidToken(text.to_string()))
    }

    /// Check if this token is a cell reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Token::Reference(_))
    }

    /// Get the referenced address, if this is a reference
    pub fn as_reference(&self) -> Option<CellAddress> {
        match self {
            Token::Reference(addr) => Some(*addr),
            _ => None,
        }
    }
}

fn is_numeric_text(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Operator(op) => write!(f, "{}", op.symbol()),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Reference(addr) => write!(f, "{}", addr),
        }
    }
}

impl From<f64> for Token {
    fn from(n: f64) -> Self {
        Token::Number(n)
    }
}

impl From<Operator> for Token {
    fn from(op: Operator) -> Self {
        Token::Operator(op)
    }
}

impl From<CellAddress> for Token {
    fn from(addr: CellAddress) -> Self {
        Token::Reference(addr)
    }
}
