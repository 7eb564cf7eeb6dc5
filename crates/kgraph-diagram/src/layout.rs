//! Layout of a parsed diagram source.
//!
//! Shapes with children become containers whose children are arranged in a
//! grid; top level items are packed into rows. Connections are straight
//! segments between the borders of their endpoint shapes.

use std::collections::HashMap;

use crate::ast::{Attributes, DiagramSource, Shape};

/// Layout options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    /// Minimum width of a leaf shape.
    pub node_width: f32,
    /// Height of a leaf shape.
    pub node_height: f32,
    /// Approximate width of one label character.
    pub char_width: f32,
    /// Gap between neighbouring shapes.
    pub spacing: f32,
    /// Inner padding of containers.
    pub container_padding: f32,
    /// Height reserved for a container's label.
    pub label_height: f32,
    /// Maximum number of grid columns inside a container.
    pub max_columns: usize,
    /// Width after which top level items wrap to a new row.
    pub max_row_width: f32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 48.0,
            char_width: 8.0,
            spacing: 32.0,
            container_padding: 24.0,
            label_height: 28.0,
            max_columns: 4,
            max_row_width: 1600.0,
        }
    }
}

impl CompileOptions {
    /// Set the maximum number of grid columns inside a container.
    #[must_use]
    pub const fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns;
        self
    }

    /// Set the width after which top level items wrap.
    #[must_use]
    pub const fn with_max_row_width(mut self, width: f32) -> Self {
        self.max_row_width = width;
        self
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Center point.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point where the segment from the center towards `(tx, ty)` leaves the rectangle.
    #[must_use]
    pub fn boundary_towards(&self, tx: f32, ty: f32) -> (f32, f32) {
        let (cx, cy) = self.center();
        let (dx, dy) = (tx - cx, ty - cy);
        if dx == 0.0 && dy == 0.0 {
            return (cx, cy);
        }
        let sx = if dx == 0.0 { f32::INFINITY } else { (self.width / 2.0) / dx.abs() };
        let sy = if dy == 0.0 { f32::INFINITY } else { (self.height / 2.0) / dy.abs() };
        let s = sx.min(sy);
        (cx + dx * s, cy + dy * s)
    }
}

/// A positioned shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedShape {
    /// Full path of the shape.
    pub path: Vec<String>,
    /// Text to draw.
    pub label: String,
    /// Bounds.
    pub bounds: Rect,
    /// Whether the shape is drawn as a container.
    pub container: bool,
    /// Nesting depth, 0 for top level shapes.
    pub depth: usize,
    /// Class attributes overlaid with the shape's own attributes.
    pub attributes: Attributes,
}

/// A positioned connection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedConnection {
    /// Start point on the source shape's border.
    pub from: (f32, f32),
    /// End point on the destination shape's border.
    pub to: (f32, f32),
    /// Class attributes overlaid with the connection's own attributes.
    pub attributes: Attributes,
}

/// A laid out diagram ready for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    /// Total width.
    pub width: f32,
    /// Total height.
    pub height: f32,
    /// Shapes, containers before their children.
    pub shapes: Vec<PlacedShape>,
    /// Connections.
    pub connections: Vec<PlacedConnection>,
}

fn resolve(source: &DiagramSource, own: &Attributes) -> Attributes {
    let mut resolved = own
        .get("class")
        .and_then(|class| source.classes().get(class))
        .cloned()
        .unwrap_or_default();
    resolved.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
    resolved
}

fn label_of(shape: &Shape) -> String {
    shape
        .attributes
        .get("label")
        .cloned()
        .unwrap_or_else(|| shape.key.clone())
}

struct Layouter<'a> {
    options: &'a CompileOptions,
    source: &'a DiagramSource,
}

/// Measured size of a shape subtree.
struct Measured {
    width: f32,
    height: f32,
    columns: usize,
    cell: (f32, f32),
    children: Vec<Measured>,
}

impl Layouter<'_> {
    fn measure(&self, shape: &Shape) -> Measured {
        let o = self.options;
        let label_width = label_of(shape).chars().count() as f32 * o.char_width;
        if !shape.is_container() {
            return Measured {
                width: o.node_width.max(label_width + o.container_padding),
                height: o.node_height,
                columns: 0,
                cell: (0.0, 0.0),
                children: Vec::new(),
            };
        }
        let children: Vec<Measured> = shape.children.iter().map(|c| self.measure(c)).collect();
        let n = children.len();
        let columns = ((n as f32).sqrt().ceil() as usize).clamp(1, o.max_columns.max(1));
        let rows = n.div_ceil(columns);
        let cell_w = children.iter().map(|c| c.width).fold(0.0, f32::max);
        let cell_h = children.iter().map(|c| c.height).fold(0.0, f32::max);
        let inner_w = columns as f32 * cell_w + (columns - 1) as f32 * o.spacing;
        let inner_h = rows as f32 * cell_h + rows.saturating_sub(1) as f32 * o.spacing;
        Measured {
            width: (inner_w + 2.0 * o.container_padding).max(label_width + 2.0 * o.container_padding),
            height: inner_h + 2.0 * o.container_padding + o.label_height,
            columns,
            cell: (cell_w, cell_h),
            children,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        shape: &Shape,
        measured: &Measured,
        path: &mut Vec<String>,
        x: f32,
        y: f32,
        depth: usize,
        out: &mut Vec<PlacedShape>,
    ) {
        let o = self.options;
        path.push(shape.key.clone());
        out.push(PlacedShape {
            path: path.clone(),
            label: label_of(shape),
            bounds: Rect {
                x,
                y,
                width: measured.width,
                height: measured.height,
            },
            container: shape.is_container(),
            depth,
            attributes: resolve(self.source, &shape.attributes),
        });
        for (i, (child, m)) in shape.children.iter().zip(&measured.children).enumerate() {
            let col = i % measured.columns;
            let row = i / measured.columns;
            let cx = x + o.container_padding + col as f32 * (measured.cell.0 + o.spacing);
            let cy = y
                + o.label_height
                + o.container_padding
                + row as f32 * (measured.cell.1 + o.spacing);
            self.place(child, m, path, cx, cy, depth + 1, out);
        }
        path.pop();
    }
}

/// Lay out a diagram source.
#[must_use]
pub fn layout(source: &DiagramSource, options: &CompileOptions) -> Diagram {
    let layouter = Layouter { options, source };
    let mut shapes = Vec::new();
    let (mut x, mut y, mut row_height, mut width) = (0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32);

    for shape in source.shapes() {
        let measured = layouter.measure(shape);
        if x > 0.0 && x + measured.width > options.max_row_width {
            x = 0.0;
            y += row_height + options.spacing;
            row_height = 0.0;
        }
        layouter.place(shape, &measured, &mut Vec::new(), x, y, 0, &mut shapes);
        x += measured.width + options.spacing;
        width = width.max(x - options.spacing);
        row_height = row_height.max(measured.height);
    }

    let bounds: HashMap<&[String], Rect> = shapes
        .iter()
        .map(|s| (s.path.as_slice(), s.bounds))
        .collect();
    let connections = source
        .connections()
        .iter()
        .filter_map(|c| {
            let src = bounds.get(c.src.as_slice())?;
            let dst = bounds.get(c.dst.as_slice())?;
            let (dcx, dcy) = dst.center();
            let (scx, scy) = src.center();
            Some(PlacedConnection {
                from: src.boundary_towards(dcx, dcy),
                to: dst.boundary_towards(scx, scy),
                attributes: resolve(source, &c.attributes),
            })
        })
        .collect();

    Diagram {
        width,
        height: y + row_height,
        shapes,
        connections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> DiagramSource {
        DiagramSource::parse(text).unwrap()
    }

    #[test]
    fn test_empty_source() {
        let diagram = layout(&DiagramSource::new(), &CompileOptions::default());
        assert!(diagram.shapes.is_empty());
        assert_eq!(diagram.width, 0.0);
    }

    #[test]
    fn test_children_are_inside_container() {
        let diagram = layout(
            &source("ns: {\n a\n b\n c\n d\n e\n}\n"),
            &CompileOptions::default(),
        );

        let ns = &diagram.shapes[0];
        assert!(ns.container);
        assert_eq!(diagram.shapes.len(), 6);
        for child in &diagram.shapes[1..] {
            assert_eq!(child.depth, 1);
            let b = child.bounds;
            assert!(b.x >= ns.bounds.x && b.x + b.width <= ns.bounds.x + ns.bounds.width);
            assert!(b.y >= ns.bounds.y && b.y + b.height <= ns.bounds.y + ns.bounds.height);
        }
    }

    #[test]
    fn test_rows_wrap() {
        let options = CompileOptions::default().with_max_row_width(400.0);
        let diagram = layout(&source("a\nb\nc\n"), &options);

        assert_eq!(diagram.shapes[0].bounds.y, 0.0);
        assert!(diagram.shapes[2].bounds.y > 0.0);
        assert!(diagram.width <= 400.0);
    }

    #[test]
    fn test_class_attributes_are_overridden_by_own() {
        let diagram = layout(
            &source("classes: {\n k: {\n style.fill: \"red\"\n style.stroke: \"blue\"\n }\n}\nx: {\n class: k\n style.fill: \"green\"\n}\n"),
            &CompileOptions::default(),
        );

        let attrs = &diagram.shapes[0].attributes;
        assert_eq!(attrs["style.fill"], "green");
        assert_eq!(attrs["style.stroke"], "blue");
    }

    #[test]
    fn test_connection_endpoints_on_borders() {
        let diagram = layout(&source("a\nb\na -> b\n"), &CompileOptions::default());

        let conn = &diagram.connections[0];
        let a = diagram.shapes[0].bounds;
        let b = diagram.shapes[1].bounds;
        assert!((conn.from.0 - (a.x + a.width)).abs() < 0.01);
        assert!((conn.to.0 - b.x).abs() < 0.01);
    }
}
