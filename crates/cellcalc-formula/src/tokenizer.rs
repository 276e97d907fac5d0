//! Formula tokenizer
//!
//! Turns formula source text into the token sequence the evaluator consumes.

use crate::error::{FormulaError, FormulaResult};
use cellcalc_core::{CellAddress, Operator, Token};

/// Tokenize a formula string
///
/// A single leading `=` is optional and whitespace between tokens is ignored.
/// Empty input yields an empty token list.
///
/// # Example
/// ```rust
/// use cellcalc_formula::tokenize;
///
/// let tokens = tokenize("=A1*(2+3.5)").unwrap();
/// assert_eq!(tokens.len(), 7);
/// assert!(tokenize("=1^2").is_err());
/// ```
pub fn tokenize(formula: &str) -> FormulaResult<Vec<Token>> {
    let formula = formula.trim_start();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    let mut tokenizer = Tokenizer::new(formula);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token()? {
        tokens.push(token);
    }

    tracing::debug!(formula, count = tokens.len(), "tokenized formula");
    Ok(tokens)
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_token(&mut self) -> FormulaResult<Option<Token>> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(None),
        };

        if let Some(op) = Operator::from_symbol(c) {
            self.advance();
            return Ok(Some(Token::Operator(op)));
        }

        match c {
            '(' => {
                self.advance();
                return Ok(Some(Token::LeftParen));
            }
            ')' => {
                self.advance();
                return Ok(Some(Token::RightParen));
            }
            _ => {}
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number().map(Some);
        }

        if c.is_ascii_alphabetic() {
            return self.scan_reference().map(Some);
        }

        Err(FormulaError::UnexpectedCharacter {
            ch: c,
            position: self.pos,
        })
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part, only when digits actually follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let digits_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self
                .peek_char_at(digits_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digits_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::InvalidNumber(num_str.to_string()))
    }

    fn scan_reference(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric())
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        CellAddress::parse(text)
            .map(Token::Reference)
            .map_err(|e| FormulaError::InvalidReference(format!("'{}': {}", text, e)))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}
