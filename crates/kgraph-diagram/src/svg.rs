//! SVG rendering of a laid out diagram.

use std::fmt::Write;

use crate::ast::Attributes;
use crate::error::{DiagramError, DiagramResult};
use crate::layout::{Diagram, PlacedConnection, PlacedShape};

/// Rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Margin around the diagram.
    pub padding: f32,
    /// Font family for labels.
    pub font_family: String,
    /// Font size for labels.
    pub font_size: f32,
    /// Background color.
    pub background: String,
    /// Fill of leaf shapes without a class fill.
    pub node_fill: String,
    /// Fill of containers without a class fill.
    pub container_fill: String,
    /// Stroke color used when none is set.
    pub stroke: String,
    /// Label color used when none is set.
    pub font_color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            padding: 24.0,
            font_family: "Inter, system-ui, sans-serif".into(),
            font_size: 14.0,
            background: "#ffffff".into(),
            node_fill: "#f7f8fe".into(),
            container_fill: "#eef1f8".into(),
            stroke: "#0d32b2".into(),
            font_color: "#0a0f25".into(),
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn style<'a>(attributes: &'a Attributes, name: &str, fallback: &'a str) -> &'a str {
    attributes
        .get(&format!("style.{name}"))
        .map_or(fallback, String::as_str)
}

struct SvgWriter<'a> {
    out: String,
    options: &'a RenderOptions,
}

impl SvgWriter<'_> {
    fn shape(&mut self, shape: &PlacedShape) -> std::fmt::Result {
        let o = self.options;
        let b = shape.bounds;
        let default_fill = if shape.container { &o.container_fill } else { &o.node_fill };
        let fill = style(&shape.attributes, "fill", default_fill);
        let stroke = style(&shape.attributes, "stroke", &o.stroke);
        let stroke_width = style(&shape.attributes, "stroke-width", "2");
        let dash = style(&shape.attributes, "stroke-dash", "0");
        let opacity = style(&shape.attributes, "opacity", "1");
        let font_color = style(&shape.attributes, "font-color", &o.font_color);

        self.out.push_str("<g>");
        if let Some(tooltip) = shape.attributes.get("tooltip") {
            write!(self.out, "<title>{}</title>", escape_xml(tooltip))?;
        }
        write!(
            self.out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="4" fill="{}" stroke="{}" stroke-width="{}" stroke-dasharray="{}" opacity="{}"/>"#,
            b.x,
            b.y,
            b.width,
            b.height,
            escape_xml(fill),
            escape_xml(stroke),
            escape_xml(stroke_width),
            escape_xml(dash),
            escape_xml(opacity),
        )?;
        // containers carry their label in the header, leaves in the middle
        let (tx, ty, anchor) = if shape.container {
            (b.x + 12.0, b.y + 8.0 + o.font_size, "start")
        } else {
            let (cx, cy) = b.center();
            (cx, cy + o.font_size / 3.0, "middle")
        };
        write!(
            self.out,
            r#"<text x="{tx:.1}" y="{ty:.1}" text-anchor="{anchor}" fill="{}"{}>{}</text>"#,
            escape_xml(font_color),
            if shape.container { r#" font-weight="bold""# } else { "" },
            escape_xml(&shape.label),
        )?;
        self.out.push_str("</g>\n");
        Ok(())
    }

    fn connection(&mut self, connection: &PlacedConnection) -> std::fmt::Result {
        let a = &connection.attributes;
        let stroke = style(a, "stroke", &self.options.stroke);
        let stroke_width = style(a, "stroke-width", "2");
        let dash = style(a, "stroke-dash", "0");
        let opacity = style(a, "opacity", "1");
        write!(
            self.out,
            r#"<path d="M {:.1} {:.1} L {:.1} {:.1}" fill="none" stroke="{}" stroke-width="{}" stroke-dasharray="{}" opacity="{}" marker-end="url(#arrow)"/>"#,
            connection.from.0,
            connection.from.1,
            connection.to.0,
            connection.to.1,
            escape_xml(stroke),
            escape_xml(stroke_width),
            escape_xml(dash),
            escape_xml(opacity),
        )?;
        if let Some(label) = a.get("label") {
            let x = (connection.from.0 + connection.to.0) / 2.0;
            let y = (connection.from.1 + connection.to.1) / 2.0;
            write!(
                self.out,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="{}">{}</text>"#,
                self.options.font_size * 0.85,
                escape_xml(label),
            )?;
        }
        self.out.push('\n');
        Ok(())
    }

    fn document(&mut self, diagram: &Diagram) -> std::fmt::Result {
        let o = self.options;
        let width = diagram.width + 2.0 * o.padding;
        let height = diagram.height + 2.0 * o.padding;
        writeln!(
            self.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="{:.1} {:.1} {width:.1} {height:.1}" font-family="{}" font-size="{}">"#,
            -o.padding,
            -o.padding,
            escape_xml(&o.font_family),
            o.font_size,
        )?;
        writeln!(
            self.out,
            r#"<rect x="{:.1}" y="{:.1}" width="100%" height="100%" fill="{}"/>"#,
            -o.padding,
            -o.padding,
            escape_xml(&o.background),
        )?;
        writeln!(
            self.out,
            r#"<defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="{}"/></marker></defs>"#,
            escape_xml(&o.stroke),
        )?;
        for shape in &diagram.shapes {
            self.shape(shape)?;
        }
        for connection in &diagram.connections {
            self.connection(connection)?;
        }
        self.out.push_str("</svg>\n");
        Ok(())
    }
}

/// Render a laid out diagram as an SVG document.
///
/// # Errors
///
/// Returns [`DiagramError::Render`] if the document cannot be written.
pub fn render(diagram: &Diagram, options: &RenderOptions) -> DiagramResult<Vec<u8>> {
    let mut writer = SvgWriter {
        out: String::new(),
        options,
    };
    writer
        .document(diagram)
        .map_err(|e| DiagramError::Render(e.to_string()))?;
    Ok(writer.out.into_bytes())
}
