//! Network visualization drawn on a ratatui canvas.
//!
//! The engine renders into a [`NetworkFrame`], which resolves colors and
//! flips the y axis. The canvas paint closure then replays the strokes.

use ratatui::{
    Frame,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine},
};

use hwdiag_engine::{
    CanvasSize,
    visualization::{EdgeSample, LAYER_COUNT, NodeSample, RenderSurface, SurfaceLost},
};

use crate::theme::{Palette, mix};

/// Canvas units per terminal cell. Cells are about twice as tall as wide.
const UNITS_PER_COL: f64 = 8.0;
const UNITS_PER_ROW: f64 = 16.0;
/// Canvas strokes are one dot wide.
const EDGE_ALPHA_GAIN: f64 = 2.0;
const FILL_RATIO: f64 = 0.5;

#[must_use]
pub fn canvas_size(area: Rect) -> CanvasSize {
    CanvasSize::new(
        f64::from(area.width) * UNITS_PER_COL,
        f64::from(area.height) * UNITS_PER_ROW,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stroke {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: Color,
    },
}

/// One frame of resolved strokes.
#[derive(Debug)]
pub struct NetworkFrame {
    size: CanvasSize,
    palette: Palette,
    marker: Marker,
    strokes: Vec<Stroke>,
}

impl NetworkFrame {
    #[must_use]
    pub fn new(size: CanvasSize, palette: Palette) -> Self {
        Self {
            size,
            palette,
            marker: Marker::Braille,
            strokes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    fn flip(&self, y: f64) -> f64 {
        self.size.height - y
    }

    fn edge_color(&self, base: Color, alpha: f64) -> Color {
        if self.palette.blend {
            mix(self.palette.bg_dark, base, alpha * EDGE_ALPHA_GAIN)
        } else if alpha >= 0.15 {
            base
        } else {
            self.palette.bg_border
        }
    }

    fn paint(&self, ctx: &mut Context<'_>) {
        for stroke in &self.strokes {
            match *stroke {
                Stroke::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                } => ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color)),
                Stroke::Circle {
                    x,
                    y,
                    radius,
                    color,
                } => ctx.draw(&Circle {
                    x,
                    y,
                    radius,
                    color,
                }),
            }
        }
    }

    /// Draw the strokes into `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let size = self.size;
        let canvas = Canvas::default()
            .background_color(self.palette.bg_dark)
            .marker(self.marker)
            .x_bounds([0.0, size.width])
            .y_bounds([0.0, size.height])
            .paint(|ctx| self.paint(ctx));
        frame.render_widget(canvas, area);
    }
}

impl RenderSurface for NetworkFrame {
    fn draw_edge(&mut self, edge: &EdgeSample) -> Result<(), SurfaceLost> {
        // Blue half from the source, purple half into the target.
        let (x1, y1) = (edge.from.0, self.flip(edge.from.1));
        let (x2, y2) = (edge.to.0, self.flip(edge.to.1));
        let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
        let start = self.edge_color(self.palette.edge_start, edge.alpha);
        let end = self.edge_color(self.palette.edge_end, edge.alpha);
        self.strokes.push(Stroke::Line {
            x1,
            y1,
            x2: mx,
            y2: my,
            color: start,
        });
        self.strokes.push(Stroke::Line {
            x1: mx,
            y1: my,
            x2,
            y2,
            color: end,
        });
        Ok(())
    }

    fn draw_node(&mut self, node: &NodeSample) -> Result<(), SurfaceLost> {
        let (x, y) = (node.x, self.flip(node.y));
        if let Some(glow) = node.glow {
            self.strokes.push(Stroke::Circle {
                x,
                y,
                radius: glow.radius,
                color: mix(self.palette.bg_dark, self.palette.node_active, glow.alpha),
            });
        }
        let (fill, border) = if node.active {
            (self.palette.node_active, self.palette.node_active_border)
        } else {
            (self.palette.node_inactive, self.palette.node_inactive_border)
        };
        self.strokes.push(Stroke::Circle {
            x,
            y,
            radius: node.radius,
            color: border,
        });
        self.strokes.push(Stroke::Circle {
            x,
            y,
            radius: node.radius * FILL_RATIO,
            color: fill,
        });
        Ok(())
    }
}

/// Place each label centred under its layer column, clipped to the column spacing.
#[must_use]
pub fn label_row(labels: &[&str; LAYER_COUNT], width: u16) -> String {
    let width = usize::from(width);
    let mut row = vec![' '; width];
    let spacing = width / (LAYER_COUNT + 1);
    for (layer, label) in labels.iter().enumerate() {
        let center = spacing * (layer + 1);
        let max_len = spacing.saturating_sub(1).max(1);
        let text: Vec<char> = label.chars().take(max_len).collect();
        let start = center.saturating_sub(text.len() / 2);
        for (offset, c) in text.into_iter().enumerate() {
            if let Some(cell) = row.get_mut(start + offset) {
                *cell = c;
            }
        }
    }
    row.into_iter().collect::<String>().trim_end().to_string()
}
