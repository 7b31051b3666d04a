//! The closed set of names an expression may refer to.
//!
//! Nothing outside this table is resolvable. The table is built once per
//! process and only ever read afterwards.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use super::error::EvalError;

/// Signature shared by all built-in functions.
pub type BuiltinFn = fn(&[f64]) -> Result<f64, EvalError>;

/// Number of arguments a function accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range.
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::Between(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// A callable entry in the symbol table.
#[derive(Clone, Copy, Debug)]
pub struct Function {
    pub name: &'static str,
    pub arity: Arity,
    pub call: BuiltinFn,
}

#[derive(Clone, Copy, Debug)]
pub enum Symbol {
    Constant(f64),
    Function(Function),
}

/// Immutable name lookup used by the evaluator.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<&'static str, Symbol>,
}

lazy_static! {
    /// The process-wide table: `pi`, `e` and the whitelisted functions.
    pub static ref SYMBOLS: SymbolTable = SymbolTable::standard();
}

impl SymbolTable {
    /// Build the standard table.
    pub fn standard() -> Self {
        let mut table = Self::default();

        table.constant("pi", std::f64::consts::PI);
        table.constant("e", std::f64::consts::E);

        table.function("sin", Arity::Exact(1), |a| Ok(a[0].sin()));
        table.function("cos", Arity::Exact(1), |a| Ok(a[0].cos()));
        table.function("tan", Arity::Exact(1), |a| Ok(a[0].tan()));
        table.function("sqrt", Arity::Exact(1), sqrt);
        table.function("log", Arity::Exact(1), log);
        table.function("abs", Arity::Exact(1), |a| Ok(a[0].abs()));
        table.function("round", Arity::Exact(1), |a| Ok(a[0].round_ties_even()));
        table.function("pow", Arity::Exact(2), |a| power(a[0], a[1]));
        table.function("int", Arity::Between(0, 1), |a| {
            Ok(a.first().map_or(0.0, |x| x.trunc()))
        });
        table.function("float", Arity::Between(0, 1), |a| {
            Ok(a.first().copied().unwrap_or(0.0))
        });

        table
    }

    fn constant(&mut self, name: &'static str, value: f64) {
        self.symbols.insert(name, Symbol::Constant(value));
    }

    fn function(&mut self, name: &'static str, arity: Arity, call: BuiltinFn) {
        self.symbols
            .insert(name, Symbol::Function(Function { name, arity, call }));
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// All resolvable names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.symbols.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn domain_error(name: &str) -> EvalError {
    EvalError::DomainError {
        name: name.to_string(),
        message: "math domain error".to_string(),
    }
}

fn sqrt(args: &[f64]) -> Result<f64, EvalError> {
    let x = args[0];
    if x < 0.0 {
        return Err(domain_error("sqrt"));
    }
    Ok(x.sqrt())
}

fn log(args: &[f64]) -> Result<f64, EvalError> {
    let x = args[0];
    if x <= 0.0 {
        return Err(domain_error("log"));
    }
    Ok(x.ln())
}

/// Exponentiation shared by `pow(a, b)` and `a ^ b`.
pub fn power(base: f64, exponent: f64) -> Result<f64, EvalError> {
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(EvalError::DomainError {
            name: "pow".to_string(),
            message: "negative number cannot be raised to a fractional power".to_string(),
        });
    }
    Ok(base.powf(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[f64]) -> Result<f64, EvalError> {
        match SYMBOLS.get(name) {
            Some(Symbol::Function(f)) => (f.call)(args),
            other => panic!("{} is not a function: {:?}", name, other),
        }
    }

    #[test]
    fn test_exact_name_set() {
        assert_eq!(
            SYMBOLS.names(),
            vec![
                "abs", "cos", "e", "float", "int", "log", "pi", "pow", "round", "sin", "sqrt",
                "tan"
            ]
        );
    }

    #[test]
    fn test_functions_know_their_names() {
        for name in SYMBOLS.names() {
            if let Some(Symbol::Function(f)) = SYMBOLS.get(name) {
                assert_eq!(f.name, name);
            }
        }
    }

    #[test]
    fn test_host_names_absent() {
        for name in ["__import__", "exec", "open", "eval", "os", "sys", "print", "exp"] {
            assert!(SYMBOLS.get(name).is_none(), "{} should not resolve", name);
        }
    }

    #[test]
    fn test_constants() {
        assert!(matches!(SYMBOLS.get("pi"), Some(Symbol::Constant(v)) if *v == std::f64::consts::PI));
        assert!(matches!(SYMBOLS.get("e"), Some(Symbol::Constant(v)) if *v == std::f64::consts::E));
    }

    #[test]
    fn test_arity() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
        assert!(Arity::Between(0, 1).accepts(0));
        assert!(Arity::Between(0, 1).accepts(1));
        assert!(!Arity::Between(0, 1).accepts(2));
        assert_eq!(Arity::Between(0, 1).to_string(), "0 to 1");
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(call("sqrt", &[-1.0]), Err(EvalError::DomainError { .. })));
        assert!(matches!(call("log", &[0.0]), Err(EvalError::DomainError { .. })));
        assert!(matches!(call("log", &[-2.0]), Err(EvalError::DomainError { .. })));
        assert_eq!(call("sqrt", &[9.0]), Ok(3.0));
        assert_eq!(call("log", &[1.0]), Ok(0.0));
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(call("round", &[2.5]), Ok(2.0));
        assert_eq!(call("round", &[3.5]), Ok(4.0));
        assert_eq!(call("round", &[-2.6]), Ok(-3.0));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", &[-3.7]), Ok(-3.0));
        assert_eq!(call("int", &[]), Ok(0.0));
        assert_eq!(call("float", &[1.25]), Ok(1.25));
        assert_eq!(call("float", &[]), Ok(0.0));
    }

    #[test]
    fn test_power_rules() {
        assert_eq!(power(2.0, 10.0), Ok(1024.0));
        assert_eq!(power(-8.0, 2.0), Ok(64.0));
        assert_eq!(power(0.0, -1.0), Err(EvalError::DivisionByZero));
        assert!(matches!(power(-8.0, 0.5), Err(EvalError::DomainError { .. })));
    }
}
