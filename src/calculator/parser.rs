//! Recursive-descent parser.
//!
//! Precedence, loosest first:
//!
//! | level | syntax | associativity |
//! |-------|--------|---------------|
//! | expr  | `a + b`, `a - b` | left |
//! | term  | `a * b`, `a / b` | left |
//! | unary | `-a` | prefix |
//! | power | `a ^ b` | right, exponent may carry its own `-` |
//! | atom  | number, name, `f(a, b)`, `(a)` | |
//!
//! So `-2^2` is `-(2^2)` and `2^3^2` is `2^(3^2)`.

use super::ast::{BinOp, Expr, UnaryOp};
use super::error::{CalcError, ParseError};
use super::token::{Token, TokenKind};

/// Parse a token stream (as produced by [`tokenize`](super::token::tokenize))
/// into an expression tree.
///
/// Every token up to the `End` sentinel must be consumed. Both the parser's
/// own recursion and the height of the resulting tree are capped at
/// `max_depth`; going past either fails with [`CalcError::TooDeep`] before
/// the stack can grow further.
pub fn parse(tokens: &[Token], max_depth: usize) -> Result<Expr, CalcError> {
    if tokens.is_empty() {
        return Err(ParseError {
            position: 0,
            expected: "a number, name or '('".to_string(),
            found: TokenKind::End.to_string(),
        }
        .into());
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let node = parser.expr()?;
    if parser.current().kind != TokenKind::End {
        return Err(parser.unexpected("an operator or end of input").into());
    }
    Ok(node.expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        // The tokenizer always terminates the stream with `End`, and `advance`
        // never moves past it.
        let tokens = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.current().kind != TokenKind::End {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError {
            position: token.position,
            expected: expected.to_string(),
            found: token.kind.to_string(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn check_height(&self, height: usize) -> Result<(), CalcError> {
        if height > self.max_depth {
            return Err(CalcError::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn binary(&self, op: BinOp, left: Node, right: Node) -> Result<Node, CalcError> {
        let height = 1 + left.height.max(right.height);
        self.check_height(height)?;
        Ok(Node {
            expr: Expr::Binary(op, Box::new(left.expr), Box::new(right.expr)),
            height,
        })
    }

    fn expr(&mut self) -> Result<Node, CalcError> {
        let mut left = self.term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Node, CalcError> {
        let mut left = self.unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Node, CalcError> {
        // Every recursive path in the grammar passes through here.
        self.depth += 1;
        self.check_height(self.depth)?;

        let result = if self.current().kind == TokenKind::Minus {
            self.advance();
            self.unary().and_then(|inner| {
                let height = inner.height + 1;
                self.check_height(height)?;
                Ok(Node {
                    expr: Expr::Unary(UnaryOp::Neg, Box::new(inner.expr)),
                    height,
                })
            })
        } else {
            self.power()
        };

        self.depth -= 1;
        result
    }

    fn power(&mut self) -> Result<Node, CalcError> {
        let base = self.atom()?;

        if self.current().kind == TokenKind::Caret {
            self.advance();
            let exponent = self.unary()?;
            return self.binary(BinOp::Pow, base, exponent);
        }

        Ok(base)
    }

    fn atom(&mut self) -> Result<Node, CalcError> {
        let token = self.current();
        match &token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Node::leaf(Expr::Literal(*n)))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.current().kind != TokenKind::LParen {
                    return Ok(Node::leaf(Expr::Identifier(name.clone())));
                }

                self.advance();
                let mut args = Vec::new();
                let mut height = 0;
                if self.current().kind != TokenKind::RParen {
                    loop {
                        let arg = self.expr()?;
                        height = height.max(arg.height);
                        args.push(arg.expr);
                        if self.current().kind != TokenKind::Comma {
                            break;
                        }
                        self.advance();
                    }
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                self.check_height(height + 1)?;
                Ok(Node {
                    expr: Expr::Call(name.clone(), args),
                    height: height + 1,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("a number, name or '('").into()),
        }
    }
}

/// A subtree and its height, matching [`Expr::depth`].
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }
}
