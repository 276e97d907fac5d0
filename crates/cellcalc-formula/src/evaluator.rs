//! Formula evaluator
//!
//! A recursive descent over the token sequence that computes values as the
//! grammar is recognized; no syntax tree is built.
//!
//! ```text
//! expression := term { ('+' | '-') term }
//! term       := factor { ('*' | '/') factor }
//! factor     := NUMBER | CELL_REF | '(' expression ')'
//! ```
//!
//! Evaluation never fails outright. Errors are recorded in per-call state
//! and parsing keeps going, so every call ends after at most one pass over
//! the tokens with a deterministic `(value, error)` outcome.

use cellcalc_core::{CellAddress, CellData, CellError, Operator, Token, Worksheet};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// What the evaluator can see of a referenced cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot<'a> {
    /// The cell's stored formula (empty when the cell holds nothing)
    pub formula: &'a [Token],
    /// Last computed value; ignored while `error` is set
    pub value: f64,
    /// Error from the cell's last evaluation
    pub error: Option<&'a CellError>,
}

impl CellSnapshot<'static> {
    /// Snapshot of a cell that was never written
    pub const EMPTY: Self = CellSnapshot {
        formula: &[],
        value: 0.0,
        error: None,
    };
}

impl Default for CellSnapshot<'_> {
    fn default() -> Self {
        CellSnapshot::EMPTY
    }
}

impl<'a> From<&'a CellData> for CellSnapshot<'a> {
    fn from(cell: &'a CellData) -> Self {
        Self {
            formula: &cell.formula,
            value: cell.value,
            error: cell.error.as_ref(),
        }
    }
}

/// Read-only access to previously computed cells
///
/// The evaluator assumes every referenced cell is already up to date;
/// ordering recalculation is the caller's job.
pub trait CellSource {
    /// Look up a cell by address
    fn cell(&self, address: CellAddress) -> CellSnapshot<'_>;
}

impl<T: CellSource + ?Sized> CellSource for &T {
    fn cell(&self, address: CellAddress) -> CellSnapshot<'_> {
        (**self).cell(address)
    }
}

impl CellSource for Worksheet {
    fn cell(&self, address: CellAddress) -> CellSnapshot<'_> {
        self.cell_at(address).map(CellSnapshot::from).unwrap_or_default()
    }
}

impl<S: BuildHasher> CellSource for HashMap<CellAddress, CellData, S> {
    fn cell(&self, address: CellAddress) -> CellSnapshot<'_> {
        self.get(&address).map(CellSnapshot::from).unwrap_or_default()
    }
}

/// A source with no cells; every reference resolves to `InvalidCell`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl CellSource for EmptySource {
    fn cell(&self, _address: CellAddress) -> CellSnapshot<'_> {
        CellSnapshot::EMPTY
    }
}

/// Options for formula evaluation
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    /// Maximum parenthesis nesting depth (default: 256)
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Outcome of evaluating one formula
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The computed value
    ///
    /// `+∞` for a division by zero inside this formula. A missing `)` or
    /// trailing tokens keep the value computed so far. Every other error,
    /// including errors carried over from referenced cells, reports `0`.
    pub value: f64,
    /// The first error encountered, if any
    pub error: Option<CellError>,
    /// Number of tokens consumed
    pub consumed: usize,
}

impl Evaluation {
    /// Check if evaluation succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The error message, or `""` when evaluation succeeded
    pub fn error_message(&self) -> &str {
        self.error.as_ref().map_or("", CellError::as_str)
    }

    /// Convert into a `Result`, dropping the value on error
    pub fn into_result(self) -> Result<f64, CellError> {
        match self.error {
            None => Ok(self.value),
            Some(err) => Err(err),
        }
    }
}

/// Evaluate a formula against a cell source with default options
pub fn evaluate<S: CellSource + ?Sized>(formula: &[Token], cells: &S) -> Evaluation {
    Evaluator::new(cells).evaluate(formula)
}

/// Formula evaluator bound to a cell source
///
/// Holds no per-call state, so one evaluator can serve any number of
/// sequential or concurrent `evaluate` calls.
#[derive(Debug)]
pub struct Evaluator<'s, S: ?Sized> {
    cells: &'s S,
    options: EvaluatorOptions,
}

/// Per-call parse state
#[derive(Debug, Default)]
struct EvalState {
    /// Index of the next unconsumed token
    pos: usize,
    /// First error recorded; never replaced once set
    error: Option<CellError>,
    /// Value reported instead of the computed one, fixed with the first error
    fallback: Option<f64>,
    /// Current parenthesis nesting depth
    depth: usize,
}

impl EvalState {
    fn peek(&self, tokens: &[Token]) -> Option<Token> {
        tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Record an error unless one is already set
    ///
    /// `fallback` replaces the computed value in the final outcome; `None`
    /// keeps whatever the grammar computed.
    fn record(&mut self, error: CellError, fallback: Option<f64>) {
        if self.error.is_none() {
            self.error = Some(error);
            self.fallback = fallback;
        }
    }
}

impl<'s, S: CellSource + ?Sized> Evaluator<'s, S> {
    /// Create an evaluator with default options
    pub fn new(cells: &'s S) -> Self {
        Self::with_options(cells, EvaluatorOptions::default())
    }

    /// Create an evaluator with custom options
    pub fn with_options(cells: &'s S, options: EvaluatorOptions) -> Self {
        Self { cells, options }
    }

    /// Get the evaluator's options
    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    /// Evaluate a tokenized formula
    ///
    /// # Example
    /// ```rust
    /// use cellcalc_core::Token;
    /// use cellcalc_formula::{EmptySource, Evaluator};
    ///
    /// let tokens: Vec<Token> = ["2", "+", "3", "*", "4"]
    ///     .iter()
    ///     .map(|t| Token::from_text(t).unwrap())
    ///     .collect();
    /// let result = Evaluator::new(&EmptySource).evaluate(&tokens);
    /// assert_eq!(result.value, 14.0);
    /// assert!(result.is_ok());
    /// ```
    pub fn evaluate(&self, formula: &[Token]) -> Evaluation {
        if formula.is_empty() {
            return Evaluation {
                value: 0.0,
                error: Some(CellError::EmptyFormula),
                consumed: 0,
            };
        }

        let mut state = EvalState::default();
        let value = self.expression(formula, &mut state);

        if state.pos < formula.len() {
            state.record(CellError::InvalidFormula, None);
        }

        let value = state.fallback.unwrap_or(value);

        tracing::debug!(
            tokens = formula.len(),
            consumed = state.pos,
            value,
            error = ?state.error,
            "evaluated formula"
        );

        Evaluation {
            value,
            error: state.error,
            consumed: state.pos,
        }
    }

    // === Grammar ===

    fn expression(&self, tokens: &[Token], state: &mut EvalState) -> f64 {
        let mut value = self.term(tokens, state);

        loop {
            let op = match state.peek(tokens) {
                Some(Token::Operator(op @ (Operator::Add | Operator::Subtract))) => op,
                _ => break,
            };

            state.advance();
            let rhs = self.term(tokens, state);
            if op == Operator::Add {
                value += rhs;
            } else {
                value -= rhs;
            }
        }

        value
    }

    fn term(&self, tokens: &[Token], state: &mut EvalState) -> f64 {
        let mut value = self.factor(tokens, state);

        loop {
            let op = match state.peek(tokens) {
                Some(Token::Operator(op @ (Operator::Multiply | Operator::Divide))) => op,
                _ => break,
            };

            state.advance();
            let clean = state.error.is_none();
            let rhs = self.factor(tokens, state);
            if op == Operator::Multiply {
                value *= rhs;
            } else if rhs != 0.0 {
                value /= rhs;
            } else if !clean || state.error.is_none() {
                // Stops this term: the remaining factors are left unconsumed
                state.record(CellError::DivideByZero, Some(f64::INFINITY));
                return f64::INFINITY;
            }
            // Otherwise the divisor itself was malformed and its error stands
        }

        value
    }

    fn factor(&self, tokens: &[Token], state: &mut EvalState) -> f64 {
        match state.peek(tokens) {
            Some(Token::Number(n)) => {
                state.advance();
                n
            }

            Some(Token::Reference(address)) => {
                state.advance();
                self.dereference(address, state)
            }

            Some(Token::LeftParen) => {
                if state.depth >= self.options.max_depth {
                    state.record(CellError::FormulaTooComplex, Some(0.0));
                    return 0.0;
                }

                state.advance();
                state.depth += 1;
                let value = self.expression(tokens, state);
                state.depth -= 1;

                // A missing ')' is reported, but the inner value is kept
                if state.peek(tokens) == Some(Token::RightParen) {
                    state.advance();
                } else {
                    state.record(CellError::InvalidFormula, None);
                }
                value
            }

            // End of input, a stray operator or an unmatched ')'
            _ => {
                state.record(CellError::InvalidFormula, Some(0.0));
                0.0
            }
        }
    }

    fn dereference(&self, address: CellAddress, state: &mut EvalState) -> f64 {
        let cell = self.cells.cell(address);

        let error = match cell.error {
            Some(err) if *err != CellError::EmptyFormula => err.clone(),
            _ if cell.formula.is_empty() => CellError::InvalidCell,
            _ => return cell.value,
        };

        tracing::trace!(%address, %error, "referenced cell carries an error");
        state.record(error, Some(0.0));
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn toks(texts: &[&str]) -> Vec<Token> {
        texts
            .iter()
            .map(|t| Token::from_text(t).unwrap())
            .collect()
    }

    fn eval(texts: &[&str]) -> (f64, String) {
        eval_with(texts, &EmptySource)
    }

    fn eval_with<S: CellSource>(texts: &[&str], cells: &S) -> (f64, String) {
        let result = evaluate(&toks(texts), cells);
        (result.value, result.error_message().to_string())
    }

    fn cell(formula: &[&str], value: f64, error: Option<CellError>) -> CellData {
        CellData {
            source: formula.concat(),
            formula: toks(formula),
            value,
            error,
        }
    }

    fn store(cells: Vec<(&str, CellData)>) -> HashMap<CellAddress, CellData> {
        cells
            .into_iter()
            .map(|(label, data)| (CellAddress::parse(label).unwrap(), data))
            .collect()
    }

    fn ok(value: f64) -> (f64, String) {
        (value, String::new())
    }

    fn err(value: f64, error: &str) -> (f64, String) {
        (value, error.to_string())
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(eval(&[]), err(0.0, "EmptyFormula"));
        assert_eq!(evaluate(&[], &EmptySource).consumed, 0);
    }

    #[test]
    fn test_single_number() {
        assert_eq!(eval(&["42"]), ok(42.0));
        assert_eq!(eval(&["-3.5"]), ok(-3.5));
        assert_eq!(eval(&["0"]), ok(0.0));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval(&["2", "+", "3", "*", "4"]), ok(14.0));
        assert_eq!(eval(&["(", "2", "+", "3", ")", "*", "4"]), ok(20.0));
        assert_eq!(eval(&["2", "*", "3", "+", "4", "*", "5"]), ok(26.0));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(eval(&["10", "-", "3", "-", "2"]), ok(5.0));
        assert_eq!(eval(&["64", "/", "4", "/", "2"]), ok(8.0));
        assert_eq!(eval(&["10", "-", "(", "3", "-", "2", ")"]), ok(9.0));
    }

    #[test]
    fn test_nested_parentheses() {
        assert_eq!(
            eval(&["(", "(", "1", "+", "2", ")", "*", "(", "3", ")", ")"]),
            ok(9.0)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval(&["5", "/", "0"]), err(f64::INFINITY, "DivideByZero"));
        assert_eq!(
            eval(&["1", "+", "5", "/", "(", "2", "-", "2", ")"]),
            err(f64::INFINITY, "DivideByZero")
        );
    }

    #[test]
    fn test_division_by_zero_stops_the_term() {
        let result = evaluate(&toks(&["5", "/", "0", "*", "3"]), &EmptySource);
        assert_eq!(result.error, Some(CellError::DivideByZero));
        assert_eq!(result.value, f64::INFINITY);
        assert_eq!(result.consumed, 3);
    }

    #[test]
    fn test_division_by_zero_beats_trailing_tokens() {
        // The missing ')' and the leftover tokens are never reported
        assert_eq!(
            eval(&["(", "1", "/", "0", "2"]),
            err(f64::INFINITY, "DivideByZero")
        );
    }

    #[test]
    fn test_unmatched_open_paren_keeps_inner_value() {
        assert_eq!(eval(&["(", "1", "+", "2"]), err(3.0, "InvalidFormula"));
    }

    #[test]
    fn test_trailing_tokens() {
        assert_eq!(eval(&["1", "+", "2", "3"]), err(3.0, "InvalidFormula"));
        assert_eq!(eval(&["1", ")"]), err(1.0, "InvalidFormula"));
    }

    #[test]
    fn test_leading_minus_is_invalid() {
        assert_eq!(eval(&["-", "5"]), err(0.0, "InvalidFormula"));
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(eval(&["1", "+"]), err(0.0, "InvalidFormula"));
        assert_eq!(eval(&["*", "2"]), err(0.0, "InvalidFormula"));
        assert_eq!(eval(&["(", ")"]), err(0.0, "InvalidFormula"));
        assert_eq!(eval(&["4", "*", "+", "3"]), err(0.0, "InvalidFormula"));
    }

    #[test]
    fn test_missing_divisor_is_not_division_by_zero() {
        assert_eq!(eval(&["1", "/"]), err(0.0, "InvalidFormula"));
        assert_eq!(eval(&["2", "*", "3", "/"]), err(0.0, "InvalidFormula"));
        assert_eq!(eval(&["(", "1", "/", ")"]), err(0.0, "InvalidFormula"));
    }

    #[test]
    fn test_unclosed_zero_divisor_keeps_dividend() {
        // The divisor's missing ')' is the error, not the zero inside it
        assert_eq!(eval(&["6", "/", "(", "0"]), err(6.0, "InvalidFormula"));
    }

    #[test]
    fn test_zero_divisor_after_earlier_error() {
        let cells = store(vec![("A1", cell(&["0"], 0.0, None))]);
        // InvalidCell from Z1 wins; the later 1/A1 still stops its term
        let result = evaluate(&toks(&["Z1", "+", "1", "/", "A1", "*", "2"]), &cells);
        assert_eq!(result.error, Some(CellError::InvalidCell));
        assert_eq!(result.value, 0.0);
        assert_eq!(result.consumed, 5);
    }

    #[test]
    fn test_cell_reference() {
        let cells = store(vec![("A1", cell(&["5"], 5.0, None))]);
        assert_eq!(eval_with(&["A1", "*", "2"], &cells), ok(10.0));
    }

    #[test]
    fn test_reference_to_empty_cell() {
        let cells = store(vec![("B1", cell(&[], 0.0, None))]);
        assert_eq!(eval_with(&["B1"], &cells), err(0.0, "InvalidCell"));

        // Cells that were never written behave the same way
        assert_eq!(eval(&["C9", "+", "1"]), err(0.0, "InvalidCell"));
    }

    #[test]
    fn test_reference_to_cell_marked_empty_formula() {
        let cells = store(vec![(
            "B1",
            cell(&[], 0.0, Some(CellError::EmptyFormula)),
        )]);
        assert_eq!(eval_with(&["B1"], &cells), err(0.0, "InvalidCell"));
    }

    #[test]
    fn test_propagates_referenced_error_verbatim() {
        let cells = store(vec![
            (
                "B1",
                cell(&["1", "/", "0"], f64::INFINITY, Some(CellError::DivideByZero)),
            ),
            (
                "B2",
                cell(&["9"], 9.0, Some(CellError::Other("#SENSOR!".into()))),
            ),
        ]);
        assert_eq!(
            eval_with(&["B1", "+", "1"], &cells),
            err(0.0, "DivideByZero")
        );
        assert_eq!(eval_with(&["B2", "+", "1"], &cells), err(0.0, "#SENSOR!"));
    }

    #[test]
    fn test_reference_with_blank_stored_message() {
        let cells = store(vec![(
            "A1",
            cell(&["2"], 2.0, CellError::from_message("")),
        )]);
        let result = evaluate(&toks(&["A1", "+", "1"]), &cells);
        assert_eq!(result.error, None);
        assert_eq!(result.value, 3.0);
        assert_eq!(result.error_message().is_empty(), result.is_ok());
    }

    #[test]
    fn test_first_error_wins() {
        let cells = store(vec![(
            "A1",
            cell(&["1"], 1.0, Some(CellError::InvalidFormula)),
        )]);
        // InvalidCell from B1 comes first, the bad A1 second
        let result = evaluate(&toks(&["B1", "+", "A1", "+"]), &cells);
        assert_eq!(result.error, Some(CellError::InvalidCell));
        assert_eq!(result.consumed, 4);
    }

    #[test]
    fn test_lookup_error_keeps_consuming() {
        let result = evaluate(&toks(&["Z1", "+", "2", "*", "3"]), &EmptySource);
        assert_eq!(result.error, Some(CellError::InvalidCell));
        assert_eq!(result.consumed, 5);
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn test_worksheet_source() {
        let mut sheet = Worksheet::new("Sheet1");
        let a1 = CellAddress::parse("A1").unwrap();
        sheet.set_cell_formula_at(a1, toks(&["4"]), "4").unwrap();
        sheet.set_formula_result(a1, 4.0, None).unwrap();

        assert_eq!(eval_with(&["A1", "/", "8"], &sheet), ok(0.5));
    }

    #[test]
    fn test_nesting_limit() {
        let options = EvaluatorOptions { max_depth: 3 };
        let evaluator = Evaluator::with_options(&EmptySource, options);

        let within = toks(&["(", "(", "(", "1", ")", ")", ")"]);
        assert_eq!(evaluator.evaluate(&within).into_result(), Ok(1.0));

        let beyond = toks(&["(", "(", "(", "(", "1", ")", ")", ")", ")"]);
        let result = evaluator.evaluate(&beyond);
        assert_eq!(result.error, Some(CellError::FormulaTooComplex));
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let mut tokens = vec![Token::LeftParen; 100_000];
        tokens.push(Token::Number(1.0));
        let result = evaluate(&tokens, &EmptySource);
        assert_eq!(result.error, Some(CellError::FormulaTooComplex));
    }

    #[test]
    fn test_idempotent() {
        let cells = store(vec![("A1", cell(&["2"], 2.0, None))]);
        let formula = toks(&["A1", "*", "(", "3", "+", "A1", ")"]);
        let evaluator = Evaluator::new(&cells);

        let first = evaluator.evaluate(&formula);
        let second = evaluator.evaluate(&formula);
        assert_eq!(first, second);
        assert_eq!(first.value, 10.0);
    }

    #[test]
    fn test_error_state_does_not_leak_between_calls() {
        let evaluator = Evaluator::new(&EmptySource);
        assert!(!evaluator.evaluate(&toks(&["1", "/", "0"])).is_ok());
        assert_eq!(evaluator.evaluate(&toks(&["1", "+", "1"])).into_result(), Ok(2.0));
    }

    #[test]
    fn test_shared_across_threads() {
        let cells = store(vec![("A1", cell(&["3"], 3.0, None))]);
        let evaluator = Evaluator::new(&cells);
        let formula = toks(&["A1", "*", "A1"]);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| evaluator.evaluate(&formula)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().value, 9.0);
            }
        });
    }

    fn token_strategy() -> impl Strategy<Value = Token> {
        prop_oneof![
            (0u8..10).prop_map(|n| Token::Number(n as f64)),
            prop_oneof![
                Just(Operator::Add),
                Just(Operator::Subtract),
                Just(Operator::Multiply),
                Just(Operator::Divide),
            ]
            .prop_map(Token::Operator),
            Just(Token::LeftParen),
            Just(Token::RightParen),
            (0u16..3).prop_map(|col| Token::Reference(CellAddress::new(0, col))),
        ]
    }

    proptest! {
        #[test]
        fn prop_success_consumes_every_token(
            tokens in prop::collection::vec(token_strategy(), 0..24)
        ) {
            let cells = store(vec![
                ("A1", cell(&["1"], 1.0, None)),
                ("B1", cell(&["1", "/", "0"], f64::INFINITY, Some(CellError::DivideByZero))),
            ]);
            let result = evaluate(&tokens, &cells);
            prop_assert!(result.consumed <= tokens.len());
            if result.is_ok() {
                prop_assert_eq!(result.consumed, tokens.len());
            }
            prop_assert_eq!(result.error_message().is_empty(), result.error.is_none());
            if result.value.is_infinite() {
                prop_assert_eq!(result.error, Some(CellError::DivideByZero));
            }
        }

        #[test]
        fn prop_matches_precedence_fold(
            first in 0u8..20,
            rest in prop::collection::vec((0usize..3, 0u8..20), 0..8)
        ) {
            let ops = [Operator::Add, Operator::Subtract, Operator::Multiply];
            let mut tokens = vec![Token::Number(first as f64)];
            for &(op, n) in &rest {
                tokens.push(Token::Operator(ops[op]));
                tokens.push(Token::Number(n as f64));
            }

            // Sum of products
            let mut total = 0.0;
            let mut sign = 1.0;
            let mut product = first as f64;
            for &(op, n) in &rest {
                match ops[op] {
                    Operator::Multiply => product *= n as f64,
                    other => {
                        total += sign * product;
                        sign = if other == Operator::Add { 1.0 } else { -1.0 };
                        product = n as f64;
                    }
                }
            }
            total += sign * product;

            let result = evaluate(&tokens, &EmptySource);
            prop_assert_eq!(result.into_result(), Ok(total));
        }
    }
}
