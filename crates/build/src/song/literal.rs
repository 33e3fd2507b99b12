//! Parser for the JS literal subset song exports are written in
//!
//! Supported: numbers (decimal, exponent, hex, optional sign), quoted strings,
//! `true`, `false`, `null`, `undefined`, arrays with holes and trailing commas,
//! objects with identifier, string or number keys, and comments. Nothing is
//! evaluated; anything else is a parse error.

use crate::error::{PackError, Result};
use serde_json::{Map, Number, Value};

/// Parses `text` as a single literal value
///
/// Array holes (`[1,,2]`) and `undefined` become `null`.
///
/// # Errors
/// `SongLiteral` with the byte offset of the first unexpected input.
pub fn parse_literal(text: &str) -> Result<Value> {
    let mut parser = LiteralParser { text, pos: 0 };
    let value = parser.value()?;
    parser.skip_trivia()?;
    if parser.pos < text.len() {
        return Err(parser.error("unexpected input after literal"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn error(&self, message: &str) -> PackError {
        PackError::SongLiteral {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.peek() != Some(expected) {
            return Err(self.error(&format!("expected `{expected}`")));
        }
        self.pos += expected.len_utf8();
        Ok(())
    }

    /// Skips whitespace and comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                let end = trimmed.find("*/").ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some('"' | '\'') => self.string().map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number().map(Value::Number),
            Some(c) if is_identifier_start(c) => {
                let start = self.pos;
                match self.identifier() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    _ => {
                        self.pos = start;
                        Err(self.error("expressions are not allowed in song literals"))
                    }
                }
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of literal")),
        }
    }

    fn array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                // Elision: a hole in the array
                Some(',') => {
                    self.pos += 1;
                    items.push(Value::Null);
                }
                _ => {
                    items.push(self.value()?);
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some(']') => {
                            self.pos += 1;
                            return Ok(Value::Array(items));
                        }
                        _ => return Err(self.error("expected `,` or `]`")),
                    }
                }
            }
        }
    }

    fn object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_trivia()?;
            let key = match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some('"' | '\'') => self.string()?,
                Some(c) if c.is_ascii_digit() => self.number()?.to_string(),
                Some(c) if is_identifier_start(c) => self.identifier().to_string(),
                _ => return Err(self.error("expected property name")),
            };

            self.skip_trivia()?;
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.error("expected `,` or `}`")),
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        let len: usize = self.rest().chars().take_while(|c| is_identifier_part(*c)).map(char::len_utf8).sum();
        self.pos += len;
        &self.text[start..self.pos]
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        let quote = self.peek().ok_or_else(|| self.error("expected string"))?;
        self.pos += 1;

        let mut result = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.pos += offset + 1;
                    return Ok(result);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => result.push('\n'),
                    Some((_, 't')) => result.push('\t'),
                    Some((_, 'r')) => result.push('\r'),
                    Some((_, '0')) => result.push('\0'),
                    Some((_, escaped)) => result.push(escaped),
                    None => break,
                },
                '\n' => break,
                c => result.push(c),
            }
        }

        self.pos = start;
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Number> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => true,
            Some('+') => false,
            _ => {
                return self.unsigned_number(start, false);
            }
        };
        self.pos += 1;
        self.unsigned_number(start, negative)
    }

    fn unsigned_number(&mut self, start: usize, negative: bool) -> Result<Number> {
        let rest = self.rest();

        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            let digits: String = hex.chars().take_while(char::is_ascii_hexdigit).collect();
            let value = i64::from_str_radix(&digits, 16).map_err(|_| self.error("invalid hex number"))?;
            self.pos += 2 + digits.len();
            return Ok(Number::from(if negative { -value } else { value }));
        }

        let len = rest
            .char_indices()
            .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || matches!(c, 'e' | 'E') || (matches!(c, '-' | '+') && i > 0 && matches!(rest.as_bytes()[i - 1], b'e' | b'E')))
            .count();
        let digits = &rest[..len];
        self.pos += len;

        let parsed: f64 = digits.parse().map_err(|_| PackError::SongLiteral {
            offset: start,
            message: format!("invalid number `{}`", &self.text[start..self.pos]),
        })?;
        let value = if negative { -parsed } else { parsed };

        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Ok(Number::from(value as i64))
        } else {
            Number::from_f64(value).ok_or_else(|| PackError::SongLiteral {
                offset: start,
                message: "number is not finite".to_string(),
            })
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
