//! Expression tree produced by the parser.

use std::fmt;

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }
}

/// A parsed expression. Each node owns its children.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(f64),
    /// A bare name, resolved against the constants at evaluation time.
    Identifier(String),
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Nesting depth of the tree; a lone literal has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Identifier(_) => 1,
            Self::Call(_, args) => 1 + args.iter().map(Expr::depth).max().unwrap_or(0),
            Self::Unary(_, inner) => 1 + inner.depth(),
            Self::Binary(_, left, right) => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Fully parenthesized rendering, mostly useful in logs and test failures.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{}", n),
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Self::Unary(UnaryOp::Neg, inner) => write!(f, "(-{})", inner),
            Self::Binary(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}
