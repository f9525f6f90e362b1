// Formula parser - converts formula source (leading '=' already stripped)
// into an AST. Supports: numbers, cell refs (A1), basic math (+, -, *, /),
// unary sign, parentheses.

use thiserror::Error;

use crate::addr::Addr;

/// The parser rejected a formula source string.
///
/// Distinct from evaluation failures: a `ParseError` surfaces synchronously
/// at assignment time and leaves the sheet untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(String);

impl ParseError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Arithmetic expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Cell reference, always within sheet bounds
    CellRef(Addr),
    UnaryOp {
        op: UnOp,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
}

/// Parse a formula source string (without the leading `=`) into an AST.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::new("empty formula"));
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        return Err(ParseError::new("unexpected trailing input"));
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    CellRef(Addr),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        num.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Optional exponent (1e3, 2.5E-1)
                if let Some(&marker @ ('e' | 'E')) = chars.peek() {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let mut exp = String::new();
                    exp.push(marker);
                    if let Some(&sign @ ('+' | '-')) = lookahead.peek() {
                        exp.push(sign);
                        lookahead.next();
                    }
                    if lookahead.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                        while let Some(&digit) = lookahead.peek().filter(|ch| ch.is_ascii_digit()) {
                            exp.push(digit);
                            lookahead.next();
                        }
                        num.push_str(&exp);
                        chars = lookahead;
                    }
                }
                let n: f64 = num
                    .parse()
                    .map_err(|_| ParseError::new(format!("bad number: {num}")))?;
                tokens.push(Token::Number(n));
            }
            'A'..='Z' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let addr = Addr::from_a1(&ident);
                if addr == Addr::NONE {
                    return Err(ParseError::new(format!("bad cell reference: {ident}")));
                }
                tokens.push(Token::CellRef(addr));
            }
            _ => {
                return Err(ParseError::new(format!("unexpected character: {c:?}")));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(Op::Add),
            Some(Token::Minus) => Some(Op::Sub),
            _ => None,
        } {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // term := unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(Op::Mul),
            Some(Token::Slash) => Some(Op::Div),
            _ => None,
        } {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // unary := ('+' | '-') unary | atom
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Plus) => Some(UnOp::Plus),
            Some(Token::Minus) => Some(UnOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_atom()
    }

    // atom := number | cellref | '(' expr ')'
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::CellRef(addr)) => Ok(Expr::CellRef(*addr)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError::new("missing closing parenthesis")),
                }
            }
            Some(_) => Err(ParseError::new("unexpected token")),
            None => Err(ParseError::new("unexpected end of formula")),
        }
    }
}
