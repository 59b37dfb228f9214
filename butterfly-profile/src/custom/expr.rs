//! Condition expressions
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | "true" | "false"
//!          | IDENT [ cmp literal | "in" "[" literal ( "," literal )* "]" ]
//! cmp     := "==" | "!=" | "<" | "<=" | ">" | ">="
//! literal := NUMBER | IDENT | "true" | "false"
//! ```
//!
//! There are no calls, no arithmetic and no references to computed values; an
//! identifier on the left always names an encoded value.

use std::fmt;
use thiserror::Error;

/// Deepest allowed nesting of parentheses and `!`
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {position}: {message}")]
pub struct SyntaxError {
    /// Byte offset into the condition
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn is_ordering(&self) -> bool {
        !matches!(self, CmpOp::Eq | CmpOp::Ne)
    }

    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    /// Enum value name, matched case-insensitively
    Name(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(bool),
    /// Bare boolean encoded value
    Attr { name: String, position: usize },
    Compare {
        name: String,
        position: usize,
        op: CmpOp,
        value: Literal,
    },
    In {
        name: String,
        position: usize,
        values: Vec<Literal>,
    },
    Not(Box<Expr>),
    /// Operands of a `&&` chain, at least two
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            end: input.len(),
        };
        let expr = parser.or()?;
        match parser.peek() {
            None => Ok(expr),
            Some((token, position)) => Err(SyntaxError::new(position, format!("unexpected {}", token.describe()))),
        }
    }

    /// Encoded value names referenced, in source order
    pub fn attributes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_attributes(&mut names);
        names
    }

    fn collect_attributes<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Const(_) => {}
            Expr::Attr { name, .. } | Expr::Compare { name, .. } | Expr::In { name, .. } => names.push(name),
            Expr::Not(inner) => inner.collect_attributes(names),
            Expr::And(terms) | Expr::Or(terms) => {
                for term in terms {
                    term.collect_attributes(names);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("'{s}'"),
            Token::Number(n) => format!("number {n}"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Not => "'!'".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Cmp(op) => format!("'{}'", op.as_str()),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, SyntaxError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let next = bytes.get(i + 1).copied();

        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b',' => Token::Comma,
            b'&' if next == Some(b'&') => Token::And,
            b'|' if next == Some(b'|') => Token::Or,
            b'=' if next == Some(b'=') => Token::Cmp(CmpOp::Eq),
            b'!' if next == Some(b'=') => Token::Cmp(CmpOp::Ne),
            b'<' if next == Some(b'=') => Token::Cmp(CmpOp::Le),
            b'>' if next == Some(b'=') => Token::Cmp(CmpOp::Ge),
            b'!' => Token::Not,
            b'<' => Token::Cmp(CmpOp::Lt),
            b'>' => Token::Cmp(CmpOp::Gt),
            b'0'..=b'9' | b'-' | b'.' => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &input[start..i];
                let value: f64 = text
                    .parse()
                    .map_err(|_| SyntaxError::new(start, format!("invalid number '{text}'")))?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push((Token::Ident(input[start..i].to_string()), start));
                continue;
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(SyntaxError::new(start, format!("unexpected character '{ch}'")));
            }
        };

        i += match &token {
            Token::And | Token::Or => 2,
            Token::Cmp(op) if !matches!(op, CmpOp::Lt | CmpOp::Gt) => 2,
            _ => 1,
        };
        tokens.push((token, start));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<(&Token, usize)> {
        self.tokens.get(self.pos).map(|(t, p)| (t, *p))
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |(_, p)| p)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().is_some_and(|(t, _)| t == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", expected.describe())))
        }
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        match self.peek() {
            Some((token, position)) => SyntaxError::new(position, format!("{what}, found {}", token.describe())),
            None => SyntaxError::new(self.end, format!("{what}, found end of input")),
        }
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SyntaxError::new(self.position(), "expression nested too deeply"));
        }
        Ok(())
    }

    // Chains are collected flat so that tree depth only grows with nesting.
    fn or(&mut self) -> Result<Expr, SyntaxError> {
        let mut terms = vec![self.and()?];
        while self.eat(&Token::Or) {
            terms.push(self.and()?);
        }
        Ok(if terms.len() == 1 { terms.swap_remove(0) } else { Expr::Or(terms) })
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        let mut terms = vec![self.unary()?];
        while self.eat(&Token::And) {
            terms.push(self.unary()?);
        }
        Ok(if terms.len() == 1 { terms.swap_remove(0) } else { Expr::And(terms) })
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Not) {
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.next() {
            Some((Token::LParen, _)) => {
                self.enter()?;
                let inner = self.or()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some((Token::Ident(name), position)) => match name.as_str() {
                "true" => Ok(Expr::Const(true)),
                "false" => Ok(Expr::Const(false)),
                "in" => Err(SyntaxError::new(position, "expected a value name before 'in'")),
                _ => self.comparison(name, position),
            },
            Some((token, position)) => Err(SyntaxError::new(
                position,
                format!("expected a condition, found {}", token.describe()),
            )),
            None => Err(SyntaxError::new(self.end, "expected a condition, found end of input")),
        }
    }

    fn comparison(&mut self, name: String, position: usize) -> Result<Expr, SyntaxError> {
        match self.peek() {
            Some((Token::Cmp(op), _)) => {
                let op = *op;
                self.pos += 1;
                let value = self.literal()?;
                Ok(Expr::Compare {
                    name,
                    position,
                    op,
                    value,
                })
            }
            Some((Token::Ident(word), _)) if word == "in" => {
                self.pos += 1;
                self.expect(Token::LBracket)?;
                let mut values = vec![self.literal()?];
                while self.eat(&Token::Comma) {
                    values.push(self.literal()?);
                }
                self.expect(Token::RBracket)?;
                Ok(Expr::In {
                    name,
                    position,
                    values,
                })
            }
            _ => Ok(Expr::Attr { name, position }),
        }
    }

    fn literal(&mut self) -> Result<Literal, SyntaxError> {
        match self.peek() {
            Some((Token::Number(n), _)) => {
                let n = *n;
                self.pos += 1;
                Ok(Literal::Number(n))
            }
            Some((Token::Ident(word), _)) => {
                let literal = match word.as_str() {
                    "true" => Literal::Bool(true),
                    "false" => Literal::Bool(false),
                    _ => Literal::Name(word.clone()),
                };
                self.pos += 1;
                Ok(literal)
            }
            _ => Err(self.unexpected("expected a value")),
        }
    }
}
