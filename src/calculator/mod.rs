//! Calculator module for evaluating arithmetic expressions.
//!
//! This module provides functionality to:
//! - Tokenize and parse expressions into a tree
//! - Evaluate trees against a closed table of constants and functions
//! - Format results and map failures to user-facing messages

mod ast;
mod error;
mod evaluation;
mod format;
mod parser;
mod symbols;
mod token;

pub use ast::{BinOp, Expr, UnaryOp};
pub use error::{CalcError, ErrorKind, EvalError, LexError, ParseError};
pub use evaluation::{CalcResponse, CalcResult, Limits, evaluate, evaluate_expression};
pub(crate) use evaluation::input_len;
pub use format::format_number;
pub use parser::parse;
pub use symbols::{Arity, Function, SYMBOLS, Symbol, SymbolTable};
pub use token::{Token, TokenKind, tokenize};
