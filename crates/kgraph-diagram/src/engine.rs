//! Compile-and-render entry points.

use tracing::debug;

use crate::ast::DiagramSource;
use crate::error::DiagramResult;
use crate::layout::{layout, CompileOptions, Diagram};
use crate::svg::{render, RenderOptions};

/// Turns diagram source text into image bytes.
pub trait DiagramEngine: Send + Sync {
    /// Parse and lay out diagram source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid diagram source.
    fn compile(&self, source: &str) -> DiagramResult<Diagram>;

    /// Rasterize a compiled diagram.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be produced.
    fn render(&self, diagram: &Diagram) -> DiagramResult<Vec<u8>>;

    /// MIME type of the bytes produced by [`render`](Self::render).
    fn content_type(&self) -> &'static str;
}

/// The built-in engine producing SVG.
#[derive(Debug, Clone, Default)]
pub struct SvgEngine {
    compile_options: CompileOptions,
    render_options: RenderOptions,
}

impl SvgEngine {
    /// Create an engine with the given options.
    #[must_use]
    pub const fn new(compile_options: CompileOptions, render_options: RenderOptions) -> Self {
        Self {
            compile_options,
            render_options,
        }
    }
}

impl DiagramEngine for SvgEngine {
    fn compile(&self, source: &str) -> DiagramResult<Diagram> {
        let parsed = DiagramSource::parse(source)?;
        let diagram = layout(&parsed, &self.compile_options);
        debug!(
            shapes = diagram.shapes.len(),
            connections = diagram.connections.len(),
            "Compiled diagram"
        );
        Ok(diagram)
    }

    fn render(&self, diagram: &Diagram) -> DiagramResult<Vec<u8>> {
        render(diagram, &self.render_options)
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagramError;

    #[test]
    fn test_engine_compiles_formatted_source() {
        let mut source = DiagramSource::new();
        source.create(r#""ns"."pod""#).unwrap();
        source.set(r#""ns"."pod".label"#, "pod").unwrap();

        let engine = SvgEngine::default();
        let diagram = engine.compile(&source.format()).unwrap();
        assert_eq!(diagram.shapes.len(), 2);

        let bytes = engine.render(&diagram).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains(">pod</text>"));
        assert_eq!(engine.content_type(), "image/svg+xml");
    }

    #[test]
    fn test_engine_rejects_invalid_source() {
        let err = SvgEngine::default().compile("a: {").unwrap_err();
        assert!(matches!(err, DiagramError::Parse { .. }));
    }
}
