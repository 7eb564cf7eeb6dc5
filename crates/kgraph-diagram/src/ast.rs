//! The editable diagram source.
//!
//! A [`DiagramSource`] is a tree of shapes plus a flat list of connections
//! between shape paths and a set of named classes. It is edited through three
//! key-addressed primitives ([`create`](DiagramSource::create),
//! [`delete`](DiagramSource::delete) and [`set`](DiagramSource::set)) and
//! serialized with [`format`](DiagramSource::format), whose output is
//! canonical: equal sources always produce byte-identical text.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::{DiagramError, DiagramResult};
use crate::key::{self, connection_key, parse_attribute_path, parse_key, quote, shape_key, Key};

/// Attribute name (possibly dotted, e.g. `style.fill`) to value.
pub type Attributes = BTreeMap<String, String>;

/// A shape, possibly containing other shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    /// Key of the shape within its parent.
    pub key: String,
    /// Attributes set on the shape.
    pub attributes: Attributes,
    /// Nested shapes in insertion order.
    pub children: Vec<Shape>,
}

impl Shape {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Whether this shape is drawn as a container.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A directed connection between two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Path of the source shape.
    pub src: Vec<String>,
    /// Path of the destination shape.
    pub dst: Vec<String>,
    /// Index among connections with the same endpoints. Stable for the
    /// lifetime of the connection.
    pub index: usize,
    /// Attributes set on the connection.
    pub attributes: Attributes,
}

impl Connection {
    /// The key addressing this connection.
    #[must_use]
    pub fn key(&self) -> String {
        connection_key(&self.src, &self.dst, self.index)
    }

    fn touches(&self, path: &[String]) -> bool {
        self.src.starts_with(path) || self.dst.starts_with(path)
    }
}

/// Editable diagram source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramSource {
    pub(crate) classes: BTreeMap<String, Attributes>,
    pub(crate) shapes: Vec<Shape>,
    pub(crate) connections: Vec<Connection>,
}

fn find<'a>(shapes: &'a [Shape], path: &[String]) -> Option<&'a Shape> {
    let (first, rest) = path.split_first()?;
    let shape = shapes.iter().find(|s| &s.key == first)?;
    if rest.is_empty() {
        Some(shape)
    } else {
        find(&shape.children, rest)
    }
}

pub(crate) fn find_mut<'a>(shapes: &'a mut [Shape], path: &[String]) -> Option<&'a mut Shape> {
    let (first, rest) = path.split_first()?;
    let shape = shapes.iter_mut().find(|s| &s.key == first)?;
    if rest.is_empty() {
        Some(shape)
    } else {
        find_mut(&mut shape.children, rest)
    }
}

/// Walk `path`, creating missing shapes. Returns whether the last shape was created.
pub(crate) fn ensure(shapes: &mut Vec<Shape>, path: &[String]) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    let pos = if let Some(pos) = shapes.iter().position(|s| &s.key == first) {
        pos
    } else {
        shapes.push(Shape::new(first.clone()));
        if rest.is_empty() {
            return true;
        }
        shapes.len() - 1
    };
    if rest.is_empty() {
        return false;
    }
    ensure(&mut shapes[pos].children, rest)
}

fn remove(shapes: &mut Vec<Shape>, path: &[String]) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    let Some(pos) = shapes.iter().position(|s| &s.key == first) else {
        return false;
    };
    if rest.is_empty() {
        shapes.remove(pos);
        true
    } else {
        remove(&mut shapes[pos].children, rest)
    }
}

impl DiagramSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse source text produced by [`format`](Self::format) (or written by hand).
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Parse`] if the text is not valid diagram source.
    pub fn parse(text: &str) -> DiagramResult<Self> {
        crate::parse::parse(text)
    }

    /// Top level shapes.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// All connections in insertion order.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Class definitions.
    #[must_use]
    pub const fn classes(&self) -> &BTreeMap<String, Attributes> {
        &self.classes
    }

    /// Look up a shape by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or names a connection.
    pub fn shape(&self, key: &str) -> DiagramResult<Option<&Shape>> {
        match parse_key(key)? {
            Key::Shape(path) => Ok(find(&self.shapes, &path)),
            _ => Err(DiagramError::InvalidKey(key.into(), "not a shape key".into())),
        }
    }

    /// Look up a connection by its indexed key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or does not name an indexed connection.
    pub fn connection(&self, key: &str) -> DiagramResult<Option<&Connection>> {
        match parse_key(key)? {
            Key::Connection {
                src,
                dst,
                index: Some(index),
            } => Ok(self.find_connection(&src, &dst, index)),
            _ => Err(DiagramError::InvalidKey(
                key.into(),
                "not an indexed connection key".into(),
            )),
        }
    }

    fn find_connection(&self, src: &[String], dst: &[String], index: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.src == src && c.dst == dst && c.index == index)
    }

    /// Create a shape or a connection and return its key.
    ///
    /// Missing parents and connection endpoints are created implicitly. A new
    /// connection gets the next free index among connections with the same
    /// endpoints, so the returned key can differ from `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::AlreadyExists`] if the shape exists and
    /// [`DiagramError::InvalidKey`] if the key is malformed or an indexed
    /// connection key.
    pub fn create(&mut self, key: &str) -> DiagramResult<String> {
        match parse_key(key)? {
            Key::Shape(path) => {
                if !ensure(&mut self.shapes, &path) {
                    return Err(DiagramError::AlreadyExists(shape_key(&path)));
                }
                Ok(shape_key(&path))
            }
            Key::Connection {
                src,
                dst,
                index: None,
            } => {
                ensure(&mut self.shapes, &src);
                ensure(&mut self.shapes, &dst);
                let index = self
                    .connections
                    .iter()
                    .filter(|c| c.src == src && c.dst == dst)
                    .map(|c| c.index + 1)
                    .max()
                    .unwrap_or(0);
                let connection = Connection {
                    src,
                    dst,
                    index,
                    attributes: Attributes::new(),
                };
                let created = connection.key();
                self.connections.push(connection);
                Ok(created)
            }
            Key::Connection { .. } | Key::Class(_) => Err(DiagramError::InvalidKey(
                key.into(),
                "cannot create an indexed connection".into(),
            )),
        }
    }

    /// Delete a shape (with its children and every connection touching them)
    /// or a connection. Deleting something that does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::InvalidKey`] if the key is malformed.
    pub fn delete(&mut self, key: &str) -> DiagramResult<()> {
        match parse_key(key)? {
            Key::Shape(path) => {
                if remove(&mut self.shapes, &path) {
                    self.connections.retain(|c| !c.touches(&path));
                }
                Ok(())
            }
            Key::Connection {
                src,
                dst,
                index: Some(index),
            } => {
                self.connections
                    .retain(|c| !(c.src == src && c.dst == dst && c.index == index));
                Ok(())
            }
            Key::Connection { .. } | Key::Class(_) => Err(DiagramError::InvalidKey(
                key.into(),
                "connection deletion needs an indexed key".into(),
            )),
        }
    }

    /// Set an attribute: `path` is `<key>.<attribute>`.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::NotFound`] if the shape or connection does not
    /// exist and [`DiagramError::InvalidKey`] if the path is malformed.
    pub fn set(&mut self, path: &str, value: impl Into<String>) -> DiagramResult<()> {
        let (target, attribute) = parse_attribute_path(path)?;
        let attributes = match target {
            Key::Shape(shape_path) => {
                &mut find_mut(&mut self.shapes, &shape_path)
                    .ok_or_else(|| DiagramError::NotFound(shape_key(&shape_path)))?
                    .attributes
            }
            Key::Connection {
                src,
                dst,
                index: Some(index),
            } => {
                &mut self
                    .connections
                    .iter_mut()
                    .find(|c| c.src == src && c.dst == dst && c.index == index)
                    .ok_or_else(|| DiagramError::NotFound(connection_key(&src, &dst, index)))?
                    .attributes
            }
            Key::Class(name) => self.classes.entry(name).or_default(),
            Key::Connection { index: None, .. } => {
                return Err(DiagramError::InvalidKey(
                    path.into(),
                    "connection attributes need an indexed key".into(),
                ));
            }
        };
        attributes.insert(attribute, value.into());
        Ok(())
    }

    /// Serialize to canonical source text.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.classes.is_empty() {
            out.push_str(key::CLASSES);
            out.push_str(": {\n");
            for (name, attributes) in &self.classes {
                format_block(&mut out, 1, &quote(name), attributes, &[]);
            }
            out.push_str("}\n");
        }
        for shape in &self.shapes {
            format_shape(&mut out, 0, shape);
        }
        for connection in &self.connections {
            let head = format!(
                "{} -> {}",
                shape_key(&connection.src),
                shape_key(&connection.dst)
            );
            format_block(&mut out, 0, &head, &connection.attributes, &[]);
        }
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn format_shape(out: &mut String, depth: usize, shape: &Shape) {
    format_block(out, depth, &quote(&shape.key), &shape.attributes, &shape.children);
}

fn format_block(
    out: &mut String,
    depth: usize,
    head: &str,
    attributes: &Attributes,
    children: &[Shape],
) {
    indent(out, depth);
    out.push_str(head);
    if attributes.is_empty() && children.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(": {\n");
    for (name, value) in attributes {
        indent(out, depth + 1);
        let _ = writeln!(out, "{name}: {}", quote(value));
    }
    for child in children {
        format_shape(out, depth + 1, child);
    }
    indent(out, depth);
    out.push_str("}\n");
}
