//! Drawing seam between the visualization and whatever displays it.

use thiserror::Error;

/// The surface can no longer be drawn on (terminal gone, window closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("render surface lost")]
pub struct SurfaceLost;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    pub from: (f64, f64),
    pub to: (f64, f64),
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSample {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub active: bool,
    /// Halo drawn behind active nodes.
    pub glow: Option<Glow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub radius: f64,
    pub alpha: f64,
}

/// Receives one frame of primitives, edges first.
pub trait RenderSurface {
    fn draw_edge(&mut self, edge: &EdgeSample) -> Result<(), SurfaceLost>;
    fn draw_node(&mut self, node: &NodeSample) -> Result<(), SurfaceLost>;
}

/// Collects primitives in memory. Used by tests and headless frames.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub edges: Vec<EdgeSample>,
    pub nodes: Vec<NodeSample>,
    /// Fail once this many primitives have been drawn.
    pub fail_after: Option<usize>,
}

impl RecordingSurface {
    fn check(&self) -> Result<(), SurfaceLost> {
        match self.fail_after {
            Some(limit) if self.edges.len() + self.nodes.len() >= limit => Err(SurfaceLost),
            _ => Ok(()),
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn draw_edge(&mut self, edge: &EdgeSample) -> Result<(), SurfaceLost> {
        self.check()?;
        self.edges.push(*edge);
        Ok(())
    }

    fn draw_node(&mut self, node: &NodeSample) -> Result<(), SurfaceLost> {
        self.check()?;
        self.nodes.push(*node);
        Ok(())
    }
}
