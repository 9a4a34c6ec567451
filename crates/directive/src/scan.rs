// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level scanners for directive attribute syntax

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Errors from the character-level scanners
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated list")]
    UnterminatedList,
    #[error("unterminated call arguments")]
    UnterminatedCall,
    #[error("unterminated params map")]
    UnterminatedMap,
    #[error("expected `=` after `{0}`")]
    ExpectedEquals(String),
    #[error("expected `:` after `{0}`")]
    ExpectedColon(String),
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
}

/// One attribute value from an inline directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Quoted or bare scalar
    Scalar(String),
    /// Bracketed name list, e.g. `[loss_value, step]`
    List(Vec<String>),
    /// Call form, e.g. `notify_email(to="me@lab")`
    Call {
        name: String,
        args: Vec<(String, String)>,
    },
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_key(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut key = String::new();
    while let Some(c) = chars.next_if(|&c| is_key_char(c)) {
        key.push(c);
    }
    key
}

/// Read a `"..."` or `'...'` string, opening quote not yet consumed
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, ScanError> {
    let quote = chars.next().ok_or(ScanError::UnexpectedEnd)?;
    let mut value = String::new();
    for c in chars.by_ref() {
        if c == quote {
            return Ok(value);
        }
        value.push(c);
    }
    Err(ScanError::UnterminatedString)
}

/// Read a bare token, stopping at whitespace or punctuation
fn read_bare(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next_if(|&c| !c.is_whitespace() && !matches!(c, '(' | ')' | ',')) {
        value.push(c);
    }
    value
}

/// Read a `[a, b]` list, opening bracket not yet consumed
fn read_list(chars: &mut Peekable<Chars<'_>>) -> Result<Vec<String>, ScanError> {
    chars.next(); // consume `[`
    let mut body = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            return Ok(body
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect());
        }
        body.push(c);
    }
    Err(ScanError::UnterminatedList)
}

/// Read `(key="value", ...)` call arguments, opening paren not yet consumed
fn read_call_args(chars: &mut Peekable<Chars<'_>>) -> Result<Vec<(String, String)>, ScanError> {
    chars.next(); // consume `(`
    let mut args = Vec::new();
    loop {
        skip_whitespace(chars);
        match chars.peek() {
            None => return Err(ScanError::UnterminatedCall),
            Some(')') => {
                chars.next();
                return Ok(args);
            }
            Some(&c) if is_key_char(c) => {
                let key = read_key(chars);
                match chars.next() {
                    Some('=') => {}
                    _ => return Err(ScanError::ExpectedEquals(key)),
                }
                let value = match chars.peek() {
                    Some('"') | Some('\'') => read_quoted(chars)?,
                    Some(_) => read_bare(chars),
                    None => return Err(ScanError::UnterminatedCall),
                };
                args.push((key, value));
                skip_whitespace(chars);
                match chars.peek() {
                    Some(',') => {
                        chars.next();
                    }
                    Some(')') | None => {}
                    Some(&c) => return Err(ScanError::UnexpectedChar(c)),
                }
            }
            Some(&c) => return Err(ScanError::UnexpectedChar(c)),
        }
    }
}

/// Scan an inline directive's `key=value` attribute list
pub fn scan_attributes(input: &str) -> Result<Vec<(String, AttrValue)>, ScanError> {
    let mut chars = input.chars().peekable();
    let mut attrs = Vec::new();

    loop {
        skip_whitespace(&mut chars);
        let Some(&c) = chars.peek() else {
            return Ok(attrs);
        };
        if !is_key_char(c) {
            return Err(ScanError::UnexpectedChar(c));
        }
        let key = read_key(&mut chars);
        match chars.next() {
            Some('=') => {}
            _ => return Err(ScanError::ExpectedEquals(key)),
        }
        let value = match chars.peek() {
            Some('"') | Some('\'') => AttrValue::Scalar(read_quoted(&mut chars)?),
            Some('[') => AttrValue::List(read_list(&mut chars)?),
            Some(_) => {
                let token = read_bare(&mut chars);
                // a bare value followed by `(` is a call: action=log_event(...)
                if chars.peek() == Some(&'(') {
                    AttrValue::Call {
                        name: token,
                        args: read_call_args(&mut chars)?,
                    }
                } else {
                    AttrValue::Scalar(token)
                }
            }
            None => return Err(ScanError::UnexpectedEnd),
        };
        attrs.push((key, value));
    }
}

/// Scan a shorthand action call: `cancel_job`, `cancel_job()` or
/// `notify_email(to="me@lab", subject="alert")`
pub fn scan_call(input: &str) -> Result<(String, Vec<(String, String)>), ScanError> {
    let mut chars = input.trim().chars().peekable();
    let name = read_key(&mut chars);
    if name.is_empty() {
        return match chars.peek() {
            Some(&c) => Err(ScanError::UnexpectedChar(c)),
            None => Err(ScanError::UnexpectedEnd),
        };
    }
    match chars.peek() {
        None => Ok((name, Vec::new())),
        Some('(') => {
            let args = read_call_args(&mut chars)?;
            skip_whitespace(&mut chars);
            match chars.peek() {
                None => Ok((name, args)),
                Some(&c) => Err(ScanError::UnexpectedChar(c)),
            }
        }
        Some(&c) => Err(ScanError::UnexpectedChar(c)),
    }
}

/// Scan an inline params map: `{to: "me@lab", subject: "alert"}`
pub fn scan_map(input: &str) -> Result<Vec<(String, String)>, ScanError> {
    let mut chars = input.trim().chars().peekable();
    match chars.next() {
        Some('{') => {}
        Some(c) => return Err(ScanError::UnexpectedChar(c)),
        None => return Err(ScanError::UnexpectedEnd),
    }
    let mut entries = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            None => return Err(ScanError::UnterminatedMap),
            Some('}') => {
                chars.next();
                skip_whitespace(&mut chars);
                return match chars.peek() {
                    None => Ok(entries),
                    Some(&c) => Err(ScanError::UnexpectedChar(c)),
                };
            }
            Some(&c) if is_key_char(c) => {
                let key = read_key(&mut chars);
                match chars.next() {
                    Some(':') => {}
                    _ => return Err(ScanError::ExpectedColon(key)),
                }
                skip_whitespace(&mut chars);
                let value = match chars.peek() {
                    Some('"') | Some('\'') => read_quoted(&mut chars)?,
                    Some(_) => {
                        let mut value = String::new();
                        while let Some(c) = chars.next_if(|&c| !matches!(c, ',' | '}')) {
                            value.push(c);
                        }
                        value.trim_end().to_string()
                    }
                    None => return Err(ScanError::UnterminatedMap),
                };
                entries.push((key, value));
                skip_whitespace(&mut chars);
                if chars.peek() == Some(&',') {
                    chars.next();
                }
            }
            Some(&c) => return Err(ScanError::UnexpectedChar(c)),
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
