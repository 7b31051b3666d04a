//! Error types for tokenizing, parsing and evaluating expressions.

use thiserror::Error;

use super::symbols::Arity;

/// How an error should be reported to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or a numeric fault.
    BadRequest,
    /// The expression referenced a name outside the symbol table.
    Forbidden,
}

/// Invalid character in the source text.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("unexpected character '{character}' at position {position}")]
pub struct LexError {
    pub position: usize,
    pub character: char,
}

/// Malformed grammar.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("expected {expected} at position {position}, found {found}")]
pub struct ParseError {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

/// Failure while walking a parsed expression.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("Function or constant '{0}' not allowed")]
    UnknownName(String),

    #[error("{name}() takes {expected} argument(s), {got} given")]
    ArityMismatch {
        name: String,
        expected: Arity,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{name}: {message}")]
    DomainError { name: String, message: String },

    #[error("Result is not a finite number")]
    NonFiniteResult,
}

/// Any failure on the way from source text to a formatted result.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CalcError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("Expression too long ({len} characters, limit is {limit})")]
    InputTooLong { len: usize, limit: usize },

    #[error("Expression nested too deeply (limit is {limit})")]
    TooDeep { limit: usize },
}

impl CalcError {
    /// Classify the error for transport-level status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Eval(EvalError::UnknownName(_)) => ErrorKind::Forbidden,
            _ => ErrorKind::BadRequest,
        }
    }
}
