//! Key paths addressing shapes, connections, classes and attributes.
//!
//! ```text
//! "a"."b"               shape b nested in shape a
//! "a" -> "b"            a new connection (create only)
//! ("a" -> "b")[0]       an existing connection
//! "a".style.fill        attribute of a shape
//! classes.pods.label    attribute of a class
//! ```

use std::fmt::Write;

use crate::error::{DiagramError, DiagramResult};
use crate::lex::{lex, Token};

/// First segments that start an attribute path rather than name a shape.
pub const RESERVED: &[&str] = &[
    "label", "class", "tooltip", "style", "shape", "link", "icon", "near", "width", "height",
];

/// Name of the top level block holding class definitions.
pub const CLASSES: &str = "classes";

/// Quote a single key segment so that dots and other punctuation are taken literally.
#[must_use]
pub fn quote(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 2);
    out.push('"');
    for c in segment.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a shape path as a key.
#[must_use]
pub fn shape_key<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&quote(segment.as_ref()));
    }
    out
}

/// Render the key of an existing connection.
#[must_use]
pub fn connection_key<S: AsRef<str>>(src: &[S], dst: &[S], index: usize) -> String {
    let mut out = String::new();
    let _ = write!(out, "({} -> {})[{index}]", shape_key(src), shape_key(dst));
    out
}

/// What a key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Key {
    Shape(Vec<String>),
    Connection {
        src: Vec<String>,
        dst: Vec<String>,
        index: Option<usize>,
    },
    Class(String),
}

struct KeyParser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> KeyParser<'a> {
    fn new(text: &'a str) -> DiagramResult<Self> {
        let tokens = lex(text)
            .map_err(|e| DiagramError::InvalidKey(text.to_string(), e.to_string()))?
            .into_iter()
            .map(|s| s.token)
            .collect();
        Ok(Self {
            text,
            tokens,
            pos: 0,
        })
    }

    fn invalid(&self, message: impl Into<String>) -> DiagramError {
        DiagramError::InvalidKey(self.text.to_string(), message.into())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect(&mut self, expected: &Token) -> DiagramResult<()> {
        match self.tokens.get(self.pos) {
            Some(t) if t == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(self.invalid(format!(
                "expected {}, found {}",
                expected.describe(),
                t.describe()
            ))),
            None => Err(self.invalid(format!("expected {}", expected.describe()))),
        }
    }

    fn segment(&mut self) -> DiagramResult<(String, bool)> {
        match self.tokens.get(self.pos) {
            Some(Token::Quoted(s)) => {
                self.pos += 1;
                Ok((s.clone(), true))
            }
            Some(Token::Bare(s)) => {
                self.pos += 1;
                Ok((s.clone(), false))
            }
            Some(t) => Err(self.invalid(format!("expected a key segment, found {}", t.describe()))),
            None => Err(self.invalid("expected a key segment")),
        }
    }

    /// Parse a dotted path. With `stop_at_reserved`, an unquoted reserved
    /// segment ends the path and is left unconsumed.
    fn path(&mut self, stop_at_reserved: bool) -> DiagramResult<Vec<String>> {
        let mut segments = vec![self.segment()?.0];
        while self.peek() == Some(&Token::Dot) {
            if stop_at_reserved {
                if let Some(Token::Bare(next)) = self.tokens.get(self.pos + 1) {
                    if RESERVED.contains(&next.as_str()) {
                        break;
                    }
                }
            }
            self.pos += 1;
            segments.push(self.segment()?.0);
        }
        Ok(segments)
    }

    fn index(&mut self) -> DiagramResult<usize> {
        self.expect(&Token::LBracket)?;
        let (raw, _) = self.segment()?;
        let index = raw
            .parse()
            .map_err(|_| self.invalid(format!("invalid connection index {raw:?}")))?;
        self.expect(&Token::RBracket)?;
        Ok(index)
    }

    fn key(&mut self, stop_at_reserved: bool) -> DiagramResult<Key> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let src = self.path(false)?;
            self.expect(&Token::Arrow)?;
            let dst = self.path(false)?;
            self.expect(&Token::RParen)?;
            let index = self.index()?;
            return Ok(Key::Connection {
                src,
                dst,
                index: Some(index),
            });
        }

        if let Some(Token::Bare(first)) = self.peek() {
            if first == CLASSES {
                self.pos += 1;
                self.expect(&Token::Dot)?;
                let (name, _) = self.segment()?;
                return Ok(Key::Class(name));
            }
        }

        let src = self.path(stop_at_reserved)?;
        if self.peek() == Some(&Token::Arrow) {
            self.pos += 1;
            let dst = self.path(false)?;
            return Ok(Key::Connection {
                src,
                dst,
                index: None,
            });
        }
        Ok(Key::Shape(src))
    }

    fn finish(&self) -> DiagramResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(self.invalid(format!("unexpected {}", t.describe()))),
        }
    }
}

/// Parse a key naming a shape or connection.
pub(crate) fn parse_key(text: &str) -> DiagramResult<Key> {
    let mut parser = KeyParser::new(text)?;
    let key = parser.key(false)?;
    parser.finish()?;
    if matches!(key, Key::Class(_)) {
        return Err(parser.invalid("classes can only be used in attribute paths"));
    }
    Ok(key)
}

/// Parse `<key>.<attr>[.<attr>...]` into the target key and the dotted attribute name.
pub(crate) fn parse_attribute_path(text: &str) -> DiagramResult<(Key, String)> {
    let mut parser = KeyParser::new(text)?;
    let key = parser.key(true)?;
    if matches!(key, Key::Connection { index: None, .. }) {
        return Err(parser.invalid("connection attributes need an indexed key"));
    }
    parser.expect(&Token::Dot)?;
    let mut attr = parser.segment()?.0;
    while parser.peek() == Some(&Token::Dot) {
        parser.pos += 1;
        attr.push('.');
        attr.push_str(&parser.segment()?.0);
    }
    parser.finish()?;
    Ok((key, attr))
}
