//! Expression evaluation.
//!
//! Ties the tokenizer, parser and symbol table together into a single
//! string-in, result-out call, and walks parsed trees.

use serde::{Deserialize, Serialize};

use super::ast::{BinOp, Expr, UnaryOp};
use super::error::{CalcError, ErrorKind, EvalError};
use super::format::format_number;
use super::parser::parse;
use super::symbols::{SYMBOLS, Symbol, SymbolTable, power};
use super::token::tokenize;

/// Resource guards applied to untrusted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Longest accepted expression, in characters.
    pub max_input_len: usize,
    /// Deepest accepted expression tree, and deepest nesting of parentheses,
    /// negations, exponents and call arguments.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_len: 1000,
            max_depth: 64,
        }
    }
}

/// Result of evaluating a calculator expression.
#[derive(Clone, Debug)]
pub enum CalcResult {
    /// Successful calculation with a finite numeric result.
    Success {
        /// The trimmed expression.
        expression: String,
        /// The numeric value.
        value: f64,
        /// The formatted value.
        result: String,
    },
    /// The expression was rejected or could not be evaluated.
    Error {
        /// The trimmed expression.
        expression: String,
        error: CalcError,
    },
}

impl CalcResult {
    /// Get the expression that was evaluated.
    pub fn expression(&self) -> &str {
        match self {
            Self::Success { expression, .. } => expression,
            Self::Error { expression, .. } => expression,
        }
    }

    /// Check if this is a successful result.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Get the display string (result or error message).
    pub fn display(&self) -> String {
        match self {
            Self::Success { result, .. } => result.clone(),
            Self::Error { error, .. } => error.to_string(),
        }
    }

    /// Error classification, if this is an error.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error, .. } => Some(error.kind()),
        }
    }

    /// Convert to the `{ok, result}` / `{ok, error}` wire shape.
    pub fn to_response(&self) -> CalcResponse {
        match self {
            Self::Success { result, .. } => CalcResponse::success(result.clone()),
            Self::Error { error, .. } => CalcResponse::failure(error.to_string()),
        }
    }
}

/// The JSON body returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalcResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalcResponse {
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Evaluate a user-supplied expression.
///
/// Surrounding whitespace is ignored and blank input evaluates to `0`
/// without being parsed.
pub fn evaluate_expression(input: &str, limits: &Limits) -> CalcResult {
    let expression = input.trim().to_string();
    let len = input_len(&expression);

    match calculate(&expression, limits) {
        Ok((value, result)) => {
            tracing::debug!(len, %result, "evaluated expression");
            CalcResult::Success {
                expression,
                value,
                result,
            }
        }
        Err(error) => {
            if error.kind() == ErrorKind::Forbidden {
                tracing::warn!(%error, "rejected expression");
            } else {
                tracing::debug!(len, %error, "expression failed");
            }
            CalcResult::Error { expression, error }
        }
    }
}

/// Length as the input limit counts it: characters, not bytes.
pub(crate) fn input_len(expression: &str) -> usize {
    expression.chars().count()
}

fn calculate(expression: &str, limits: &Limits) -> Result<(f64, String), CalcError> {
    if expression.is_empty() {
        return Ok((0.0, "0".to_string()));
    }

    let len = input_len(expression);
    if len > limits.max_input_len {
        return Err(CalcError::InputTooLong {
            len,
            limit: limits.max_input_len,
        });
    }

    let tokens = tokenize(expression)?;
    let tree = parse(&tokens, limits.max_depth)?;
    tracing::trace!(depth = tree.depth(), %tree, "parsed expression");

    let value = evaluate(&tree, &SYMBOLS)?;
    let result = format_number(value)?;
    Ok((value, result))
}

/// Walk `expr`, resolving names against `symbols`.
///
/// Operands and arguments are evaluated left to right. Every intermediate
/// value must be finite.
pub fn evaluate(expr: &Expr, symbols: &SymbolTable) -> Result<f64, EvalError> {
    let value = match expr {
        Expr::Literal(value) => *value,
        Expr::Identifier(name) => match symbols.get(name) {
            Some(Symbol::Constant(value)) => *value,
            _ => return Err(EvalError::UnknownName(name.clone())),
        },
        Expr::Unary(UnaryOp::Neg, inner) => -evaluate(inner, symbols)?,
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, symbols)?;
            let right = evaluate(right, symbols)?;
            match op {
                BinOp::Add => left + right,
                BinOp::Sub => left - right,
                BinOp::Mul => left * right,
                BinOp::Div => {
                    if right == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    left / right
                }
                BinOp::Pow => power(left, right)?,
            }
        }
        Expr::Call(name, args) => {
            let Some(Symbol::Function(function)) = symbols.get(name) else {
                return Err(EvalError::UnknownName(name.clone()));
            };
            if !function.arity.accepts(args.len()) {
                return Err(EvalError::ArityMismatch {
                    name: function.name.to_string(),
                    expected: function.arity,
                    got: args.len(),
                });
            }
            let values = args
                .iter()
                .map(|arg| evaluate(arg, symbols))
                .collect::<Result<Vec<_>, _>>()?;
            (function.call)(&values)?
        }
    };

    if !value.is_finite() {
        return Err(EvalError::NonFiniteResult);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> Result<String, CalcError> {
        match evaluate_expression(input, &Limits::default()) {
            CalcResult::Success { result, .. } => Ok(result),
            CalcResult::Error { error, .. } => Err(error),
        }
    }

    fn eval_err(input: &str) -> EvalError {
        match eval(input) {
            Err(CalcError::Eval(err)) => err,
            other => panic!("expected evaluation error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_basic_evaluation() {
        let result = evaluate_expression("2 + 2", &Limits::default());
        assert!(result.is_success());
        assert_eq!(result.display(), "4");
        assert_eq!(result.expression(), "2 + 2");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), "7");
        assert_eq!(eval("(1 + 2) * 3").unwrap(), "9");
        assert_eq!(eval("10 / 4").unwrap(), "2.5");
        assert_eq!(eval("8 / 4 / 2").unwrap(), "1");
        assert_eq!(eval("10 - 3 - 2").unwrap(), "5");
        assert_eq!(eval("1 / 3").unwrap(), "0.3333333333333333");
    }

    #[test]
    fn test_power_and_negation() {
        assert_eq!(eval("2^3^2").unwrap(), "512");
        assert_eq!(eval("-2^2").unwrap(), "-4");
        assert_eq!(eval("(-2)^2").unwrap(), "4");
        assert_eq!(eval("2^-1").unwrap(), "0.5");
        assert_eq!(eval("--3").unwrap(), "3");
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("pow(2,10)").unwrap(), "1024");
        assert_eq!(eval("sqrt(16)").unwrap(), "4");
        assert_eq!(eval("sin(0)").unwrap(), "0");
        assert_eq!(eval("cos(0)").unwrap(), "1");
        assert_eq!(eval("abs(-5)").unwrap(), "5");
        assert_eq!(eval("round(2.5)").unwrap(), "2");
        assert_eq!(eval("int(7.9)").unwrap(), "7");
        assert_eq!(eval("float(3)").unwrap(), "3");
        assert_eq!(eval("log(1)").unwrap(), "0");
        assert_eq!(eval("round(pi * 100)").unwrap(), "314");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(eval("").unwrap(), "0");
        assert_eq!(eval("   ").unwrap(), "0");
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_err("1/0"), EvalError::DivisionByZero);
        assert_eq!(eval_err("1/(2-2)"), EvalError::DivisionByZero);
        assert_eq!(eval_err("0^-1"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(eval_err("sqrt(-1)"), EvalError::DomainError { name, .. } if name == "sqrt"));
        assert!(matches!(eval_err("log(0)"), EvalError::DomainError { name, .. } if name == "log"));
        assert!(matches!(eval_err("(-8)^(1/3)"), EvalError::DomainError { name, .. } if name == "pow"));
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            eval_err("sqrt(1,2)"),
            EvalError::ArityMismatch {
                name: "sqrt".into(),
                expected: crate::calculator::symbols::Arity::Exact(1),
                got: 2,
            }
        );
        assert!(matches!(eval_err("pow(2)"), EvalError::ArityMismatch { .. }));
        assert!(matches!(eval_err("int(1, 2)"), EvalError::ArityMismatch { .. }));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(eval_err("x + 1"), EvalError::UnknownName("x".into()));
        assert_eq!(eval_err("__import__"), EvalError::UnknownName("__import__".into()));
        assert_eq!(eval_err("exec(1)"), EvalError::UnknownName("exec".into()));
        assert_eq!(eval_err("open(1)"), EvalError::UnknownName("open".into()));
        // Constants are not callable and functions are not values.
        assert_eq!(eval_err("pi(1)"), EvalError::UnknownName("pi".into()));
        assert_eq!(eval_err("sin + 1"), EvalError::UnknownName("sin".into()));
    }

    #[test]
    fn test_unknown_name_checked_before_arguments() {
        assert_eq!(eval_err("nope(1/0)"), EvalError::UnknownName("nope".into()));
    }

    #[test]
    fn test_left_operand_fails_first() {
        assert_eq!(eval_err("y + 1/0"), EvalError::UnknownName("y".into()));
        assert_eq!(eval_err("1/0 + y"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(eval_err("10^400"), EvalError::NonFiniteResult);
        assert_eq!(eval_err("1e308 * 10"), EvalError::NonFiniteResult);
        assert_eq!(eval_err("1e999"), EvalError::NonFiniteResult);
    }

    #[test]
    fn test_lexical_rejection() {
        assert!(matches!(eval("os.system('ls')"), Err(CalcError::Lex(_))));
        assert!(matches!(eval("1 % 2"), Err(CalcError::Lex(_))));
    }

    #[test]
    fn test_input_too_long() {
        let limits = Limits {
            max_input_len: 5,
            ..Limits::default()
        };
        let result = evaluate_expression("1+1+1+1", &limits);
        assert!(matches!(
            result,
            CalcResult::Error {
                error: CalcError::InputTooLong { len: 7, limit: 5 },
                ..
            }
        ));
        // Surrounding whitespace does not count.
        assert!(evaluate_expression("  1+1  ", &limits).is_success());
    }

    #[test]
    fn test_input_length_counts_characters() {
        assert_eq!(input_len("π*π"), 3);
        assert_eq!(input_len("1+1"), 3);

        let limits = Limits {
            max_input_len: 5,
            ..Limits::default()
        };
        // Seven bytes but only five characters: past the tokenizer, not the limit.
        let result = evaluate_expression("π*π*π", &limits);
        assert!(matches!(
            result,
            CalcResult::Error {
                error: CalcError::Lex(_),
                ..
            }
        ));

        let result = evaluate_expression("ππππππ", &limits);
        assert!(matches!(
            result,
            CalcResult::Error {
                error: CalcError::InputTooLong { len: 6, limit: 5 },
                ..
            }
        ));
    }

    #[test]
    fn test_response_shape() {
        let ok = evaluate_expression("pow(2,10)", &Limits::default()).to_response();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"ok": true, "result": "1024"})
        );

        let err = evaluate_expression("1/0", &Limits::default()).to_response();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"ok": false, "error": "Division by zero"})
        );
    }

    #[test]
    fn test_integral_results_round_trip() {
        for input in ["2^10", "-17 * 3", "10^15", "2^60"] {
            let first = eval(input).unwrap();
            assert_eq!(eval(&first).unwrap(), first);
        }
    }
}
