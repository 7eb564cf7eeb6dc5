//! Parser for diagram source text.

use crate::ast::{ensure, find_mut, Attributes, Connection, DiagramSource};
use crate::error::{DiagramError, DiagramResult};
use crate::key::{CLASSES, RESERVED};
use crate::lex::{lex, Spanned, Token};

pub(crate) fn parse(text: &str) -> DiagramResult<DiagramSource> {
    let mut parser = Parser {
        tokens: lex(text)?,
        pos: 0,
    };
    let mut source = DiagramSource::default();
    parser.shape_block(&mut source, &[])?;
    if let Some(t) = parser.tokens.get(parser.pos) {
        return Err(DiagramError::Parse {
            line: t.line,
            message: format!("unexpected {}", t.token.describe()),
        });
    }
    Ok(source)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn error(&self, message: impl Into<String>) -> DiagramError {
        DiagramError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn unexpected(&self, wanted: &str) -> DiagramError {
        match self.peek() {
            Some(t) => self.error(format!("expected {wanted}, found {}", t.describe())),
            None => self.error(format!("expected {wanted}, found end of input")),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&Token::Newline) {}
    }

    fn end_of_statement(&mut self) -> DiagramResult<()> {
        match self.peek() {
            None | Some(Token::RBrace) => Ok(()),
            Some(Token::Newline) => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected("end of line")),
        }
    }

    fn segment(&mut self) -> DiagramResult<String> {
        match self.peek() {
            Some(Token::Quoted(s) | Token::Bare(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("a key")),
        }
    }

    fn path(&mut self) -> DiagramResult<Vec<String>> {
        let mut segments = vec![self.segment()?];
        while self.eat(&Token::Dot) {
            segments.push(self.segment()?);
        }
        Ok(segments)
    }

    fn value(&mut self) -> DiagramResult<String> {
        match self.peek() {
            Some(Token::Quoted(s) | Token::Bare(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    fn starts_attribute(&self) -> bool {
        matches!(self.peek(), Some(Token::Bare(s)) if RESERVED.contains(&s.as_str()))
    }

    /// `attr.path: value` statements until `}`.
    fn attribute_block(&mut self, attributes: &mut Attributes) -> DiagramResult<()> {
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBrace) {
                return Ok(());
            }
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            let name = self.path()?.join(".");
            if !self.eat(&Token::Colon) {
                return Err(self.unexpected("':'"));
            }
            let value = self.value()?;
            attributes.insert(name, value);
            self.end_of_statement()?;
        }
    }

    fn classes(&mut self, source: &mut DiagramSource) -> DiagramResult<()> {
        if !self.eat(&Token::LBrace) {
            return Err(self.unexpected("'{'"));
        }
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBrace) {
                return Ok(());
            }
            let name = self.segment()?;
            if !(self.eat(&Token::Colon) && self.eat(&Token::LBrace)) {
                return Err(self.unexpected("': {'"));
            }
            let attributes = source.classes.entry(name).or_default();
            self.attribute_block(attributes)?;
            self.end_of_statement()?;
        }
    }

    /// Statements of the container at `prefix` until `}` or end of input.
    fn shape_block(&mut self, source: &mut DiagramSource, prefix: &[String]) -> DiagramResult<()> {
        loop {
            self.skip_newlines();
            match self.peek() {
                None | Some(Token::RBrace) => return Ok(()),
                _ => {}
            }

            if prefix.is_empty() && self.peek() == Some(&Token::Bare(CLASSES.into())) {
                self.pos += 1;
                if !self.eat(&Token::Colon) {
                    return Err(self.unexpected("':'"));
                }
                self.classes(source)?;
                self.end_of_statement()?;
                continue;
            }

            if self.starts_attribute() {
                if prefix.is_empty() {
                    return Err(self.error("attribute outside of a shape"));
                }
                let name = self.path()?.join(".");
                if !self.eat(&Token::Colon) {
                    return Err(self.unexpected("':'"));
                }
                let value = self.value()?;
                if let Some(shape) = find_mut(&mut source.shapes, prefix) {
                    shape.attributes.insert(name, value);
                }
                self.end_of_statement()?;
                continue;
            }

            let mut path = prefix.to_vec();
            path.extend(self.path()?);

            if self.eat(&Token::Arrow) {
                let mut dst = prefix.to_vec();
                dst.extend(self.path()?);
                self.connection(source, path, dst)?;
            } else {
                ensure(&mut source.shapes, &path);
                if self.eat(&Token::Colon) {
                    if self.eat(&Token::LBrace) {
                        self.shape_block(source, &path)?;
                        if !self.eat(&Token::RBrace) {
                            return Err(self.unexpected("'}'"));
                        }
                    } else {
                        let label = self.value()?;
                        if let Some(shape) = find_mut(&mut source.shapes, &path) {
                            shape.attributes.insert("label".into(), label);
                        }
                    }
                }
            }
            self.end_of_statement()?;
        }
    }

    fn connection(
        &mut self,
        source: &mut DiagramSource,
        src: Vec<String>,
        dst: Vec<String>,
    ) -> DiagramResult<()> {
        ensure(&mut source.shapes, &src);
        ensure(&mut source.shapes, &dst);
        let mut attributes = Attributes::new();
        if self.eat(&Token::Colon) {
            if self.eat(&Token::LBrace) {
                self.attribute_block(&mut attributes)?;
            } else {
                attributes.insert("label".into(), self.value()?);
            }
        }
        let index = source
            .connections
            .iter()
            .filter(|c| c.src == src && c.dst == dst)
            .count();
        source.connections.push(Connection {
            src,
            dst,
            index,
            attributes,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hand_written() {
        let source = parse(
            r##"
# a comment
classes: {
  pods: { style.fill: "#eee" }
}
cluster: {
  label: "The cluster"
  web; db
  web -> db: uses
}
lonely: "Lonely node"
"##,
        )
        .unwrap();

        assert_eq!(source.classes()["pods"]["style.fill"], "#eee");
        let cluster = &source.shapes()[0];
        assert_eq!(cluster.attributes["label"], "The cluster");
        assert_eq!(cluster.children.len(), 2);
        assert_eq!(source.shapes()[1].attributes["label"], "Lonely node");

        let conn = &source.connections()[0];
        assert_eq!(conn.src, vec!["cluster".to_string(), "web".to_string()]);
        assert_eq!(conn.attributes["label"], "uses");
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse("a: {\n  b\n").unwrap_err();
        assert!(matches!(err, DiagramError::Parse { .. }));

        let err = parse("a\nb c\n").unwrap_err();
        assert_eq!(
            err,
            DiagramError::Parse {
                line: 2,
                message: "expected end of line, found c".into(),
            }
        );

        assert!(parse("label: x").is_err());
        assert!(parse("}").is_err());
    }
}
