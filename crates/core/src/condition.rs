// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandboxed condition evaluation for trigger guards
//!
//! Conditions gate whether a matched line fires its actions. The
//! grammar is deliberately narrow: comparisons (`<`, `<=`, `>`, `>=`,
//! `==`, `!=`), boolean `and`/`or`/`not`, parentheses, and the numeric
//! coercions `int(x)` / `float(x)` over captured variables and
//! literals. Captured variables are always strings until coerced.
//! There is no function table beyond the two coercions and no access
//! to anything outside the supplied variable map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from parsing a condition expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("unexpected end of condition")]
    UnexpectedEnd,
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),
    #[error("expected '{expected}', found '{found}'")]
    Expected { expected: &'static str, found: String },
}

/// Errors from evaluating a parsed condition against captures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("cannot convert '{value}' to {target}")]
    BadCoercion { value: String, target: &'static str },
    #[error("cannot compare {lhs} {op} {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("condition is not boolean (got {0})")]
    NotBoolean(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coercion {
    Int,
    Float,
}

/// A runtime value during evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Var(String),
    Coerce { kind: Coercion, arg: Box<Expr> },
    Compare { op: CmpOp, lhs: Box<Expr>, rhs: Box<Expr> },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// A parsed, reusable condition expression
///
/// Serializes as its source string so definitions stay plain data.
#[derive(Debug, Clone)]
pub struct Condition {
    source: String,
    root: Expr,
}

impl Condition {
    /// Parse a condition expression, rejecting anything outside the grammar
    pub fn parse(input: &str) -> Result<Self, ConditionError> {
        let tokens = lex(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_expr()?;
        if let Some(tok) = parser.peek() {
            return Err(ConditionError::UnexpectedToken(tok.describe()));
        }
        Ok(Self {
            source: input.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a capture snapshot; the result must be boolean
    pub fn evaluate(&self, vars: &BTreeMap<String, String>) -> Result<bool, EvalError> {
        match eval(&self.root, vars)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::NotBoolean(other.kind())),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Condition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Condition::parse(&source).map_err(serde::de::Error::custom)
    }
}

// ---- lexer ----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    True,
    False,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => name.clone(),
            Token::Int(i) => i.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Cmp(op) => op.symbol().to_string(),
            Token::And => "and".to_string(),
            Token::Or => "or".to_string(),
            Token::Not => "not".to_string(),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(match ident.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "true" => Token::True,
                "false" => Token::False,
                _ => Token::Ident(ident),
            });
        } else if c.is_ascii_digit() || c == '-' {
            tokens.push(lex_number(&mut chars)?);
        } else if c == '"' || c == '\'' {
            let quote = c;
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some(c) => text.push(c),
                    None => return Err(ConditionError::UnterminatedString),
                }
            }
            tokens.push(Token::Str(text));
        } else {
            chars.next();
            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '<' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        Token::Cmp(CmpOp::Le)
                    } else {
                        Token::Cmp(CmpOp::Lt)
                    }
                }
                '>' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        Token::Cmp(CmpOp::Ge)
                    } else {
                        Token::Cmp(CmpOp::Gt)
                    }
                }
                '=' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        Token::Cmp(CmpOp::Eq)
                    } else {
                        return Err(ConditionError::UnexpectedChar('='));
                    }
                }
                '!' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        Token::Cmp(CmpOp::Ne)
                    } else {
                        return Err(ConditionError::UnexpectedChar('!'));
                    }
                }
                other => return Err(ConditionError::UnexpectedChar(other)),
            };
            tokens.push(token);
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<Token, ConditionError> {
    let mut text = String::new();
    if chars.peek() == Some(&'-') {
        text.push('-');
        chars.next();
        if !matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            return Err(ConditionError::UnexpectedChar('-'));
        }
    }
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if seen_dot {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ConditionError::BadNumber(text))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ConditionError::BadNumber(text))
    }
}

// ---- parser ----

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self) -> Result<(), ConditionError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(tok) => Err(ConditionError::Expected {
                expected: ")",
                found: tok.describe(),
            }),
            None => Err(ConditionError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ConditionError> {
        let lhs = self.parse_operand()?;
        if let Some(Token::Cmp(op)) = self.peek() {
            let op = *op;
            self.advance();
            let rhs = self.parse_operand()?;
            return Ok(Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn parse_operand(&mut self) -> Result<Expr, ConditionError> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let coercion = match name.as_str() {
                    "int" => Some(Coercion::Int),
                    "float" => Some(Coercion::Float),
                    _ => None,
                };
                match coercion {
                    Some(kind) if matches!(self.peek(), Some(Token::LParen)) => {
                        self.advance();
                        let arg = self.parse_operand()?;
                        self.expect_rparen()?;
                        Ok(Expr::Coerce {
                            kind,
                            arg: Box::new(arg),
                        })
                    }
                    _ => Ok(Expr::Var(name)),
                }
            }
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(tok) => Err(ConditionError::UnexpectedToken(tok.describe())),
            None => Err(ConditionError::UnexpectedEnd),
        }
    }
}

// ---- evaluation ----

fn eval(expr: &Expr, vars: &BTreeMap<String, String>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => vars
            .get(name)
            .map(|v| Value::Str(v.clone()))
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Expr::Coerce { kind, arg } => {
            let value = eval(arg, vars)?;
            match kind {
                Coercion::Int => coerce_int(value).map(Value::Int),
                Coercion::Float => coerce_float(value).map(Value::Float),
            }
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval(lhs, vars)?;
            let rhs = eval(rhs, vars)?;
            compare(*op, lhs, rhs).map(Value::Bool)
        }
        Expr::And(lhs, rhs) => {
            if !eval_bool(lhs, vars)? {
                return Ok(Value::Bool(false));
            }
            eval_bool(rhs, vars).map(Value::Bool)
        }
        Expr::Or(lhs, rhs) => {
            if eval_bool(lhs, vars)? {
                return Ok(Value::Bool(true));
            }
            eval_bool(rhs, vars).map(Value::Bool)
        }
        Expr::Not(inner) => eval_bool(inner, vars).map(|b| Value::Bool(!b)),
    }
}

fn eval_bool(expr: &Expr, vars: &BTreeMap<String, String>) -> Result<bool, EvalError> {
    match eval(expr, vars)? {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotBoolean(other.kind())),
    }
}

fn coerce_int(value: Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Float(f) => Ok(f as i64),
        Value::Str(s) => s.trim().parse::<i64>().map_err(|_| EvalError::BadCoercion {
            value: s,
            target: "int",
        }),
        Value::Bool(b) => Err(EvalError::BadCoercion {
            value: b.to_string(),
            target: "int",
        }),
    }
}

fn coerce_float(value: Value) -> Result<f64, EvalError> {
    match value {
        Value::Int(i) => Ok(i as f64),
        Value::Float(f) => Ok(f),
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| EvalError::BadCoercion {
            value: s,
            target: "float",
        }),
        Value::Bool(b) => Err(EvalError::BadCoercion {
            value: b.to_string(),
            target: "float",
        }),
    }
}

/// Equality works within a kind (numbers compare numerically across
/// int/float). Ordering requires numeric operands: captured variables
/// are strings and must be coerced first, which keeps "9" > "10"
/// lexicographic surprises out of the grammar.
fn compare(op: CmpOp, lhs: Value, rhs: Value) -> Result<bool, EvalError> {
    let mismatch = || EvalError::TypeMismatch {
        op: op.symbol(),
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    };

    match op {
        CmpOp::Eq | CmpOp::Ne => {
            let equal = match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => a == b,
                (Value::Float(a), Value::Float(b)) => a == b,
                (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
                (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
                (Value::Str(a), Value::Str(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                _ => return Err(mismatch()),
            };
            Ok(if op == CmpOp::Eq { equal } else { !equal })
        }
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let (a, b) = match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => (*a as f64, *b as f64),
                (Value::Float(a), Value::Float(b)) => (*a, *b),
                (Value::Int(a), Value::Float(b)) => (*a as f64, *b),
                (Value::Float(a), Value::Int(b)) => (*a, *b as f64),
                _ => return Err(mismatch()),
            };
            Ok(match op {
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
            })
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
