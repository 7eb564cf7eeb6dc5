//! # kgraph-diagram
//!
//! A small diagram engine: an editable, key-addressed diagram source, a
//! canonical text format for it, a grid layout and an SVG renderer.
//!
//! ```rust
//! use kgraph_diagram::{DiagramEngine, DiagramSource, SvgEngine};
//!
//! let mut source = DiagramSource::new();
//! source.create(r#""ns"."pod""#).unwrap();
//! let edge = source.create(r#""ns"."pod" -> "ns""#).unwrap();
//! source.set(&format!("{edge}.class"), "arc_or").unwrap();
//!
//! let engine = SvgEngine::default();
//! let diagram = engine.compile(&source.format()).unwrap();
//! let svg = engine.render(&diagram).unwrap();
//! assert!(svg.starts_with(b"<svg"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod engine;
pub mod error;
pub mod key;
pub mod layout;
mod lex;
mod parse;
pub mod svg;

pub use ast::{Attributes, Connection, DiagramSource, Shape};
pub use engine::{DiagramEngine, SvgEngine};
pub use error::{DiagramError, DiagramResult};
pub use key::{connection_key, quote, shape_key};
pub use layout::{CompileOptions, Diagram, PlacedConnection, PlacedShape, Rect};
pub use svg::RenderOptions;
