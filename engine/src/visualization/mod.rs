//! Animated neural-symbolic network shown beside the diagnosis form.
//!
//! The engine owns a fixed 19-node graph and a frame clock. Each frame the
//! presentation layer calls [`VisualizationEngine::tick`] and then
//! [`VisualizationEngine::render`] with a [`RenderSurface`]. The engine only
//! reads the session through a [`PhaseSignal`]; it never writes session state.
//!
//! Animation state lives only between `mount` and `unmount`. Unmounting drops
//! the phase subscription and the graph; a later `mount` starts from time zero.

mod surface;
mod topology;

pub use surface::{EdgeSample, Glow, NodeSample, RecordingSurface, RenderSurface, SurfaceLost};
pub use topology::{
    CanvasSize, EDGE_COUNT, LAYER_COUNT, LAYER_LABELS, LAYER_OFFSETS, LAYER_SIZES, NODE_COUNT,
    VisualizationNode, edges,
};

use hwdiag_types::Phase;

use crate::session::PhaseSignal;

/// Simulation time added per tick.
pub const TIME_STEP: f64 = 0.02;

const IDLE_EDGE_ALPHA: f64 = 0.05;
const PROCESSING_EDGE_ALPHA: f64 = 0.3;
const ACTIVE_THRESHOLD: f64 = 0.3;
const BASE_RADIUS: f64 = 4.0;
const ACTIVE_RADIUS: f64 = 6.0;
const PULSE_RADIUS: f64 = 2.0;
const GLOW_SCALE: f64 = 3.0;
const GLOW_ALPHA: f64 = 0.3;

/// Monotonic animation clock, reset on every mount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    time: f64,
    ticks: u64,
}

impl FrameClock {
    fn advance(&mut self) {
        self.ticks += 1;
        self.time = self.ticks as f64 * TIME_STEP;
    }

    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[derive(Debug)]
struct MountedGraph {
    signal: PhaseSignal,
    clock: FrameClock,
    size: CanvasSize,
    phase: Phase,
    nodes: [VisualizationNode; NODE_COUNT],
}

#[derive(Debug, Default)]
enum MountState {
    #[default]
    Unmounted,
    Mounted(Box<MountedGraph>),
}

#[derive(Debug, Default)]
pub struct VisualizationEngine {
    state: MountState,
}

impl VisualizationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a session and lay out the graph for `size`.
    ///
    /// Mounting an already mounted engine tears the old mount down first.
    pub fn mount(&mut self, signal: PhaseSignal, size: CanvasSize) {
        if self.unmount() {
            tracing::debug!("Visualization remounted");
        }
        let phase = signal.current();
        self.state = MountState::Mounted(Box::new(MountedGraph {
            signal,
            clock: FrameClock::default(),
            size,
            phase,
            nodes: topology::build_nodes(size),
        }));
    }

    /// Release the phase subscription and drop all animation state.
    /// Returns `false` if nothing was mounted.
    pub fn unmount(&mut self) -> bool {
        matches!(std::mem::take(&mut self.state), MountState::Mounted(_))
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        matches!(self.state, MountState::Mounted(_))
    }

    /// Re-layout for a new surface size. No-op when the size is unchanged.
    pub fn resize(&mut self, size: CanvasSize) {
        if let MountState::Mounted(graph) = &mut self.state
            && graph.size != size
        {
            graph.size = size;
            topology::layout(&mut graph.nodes, size);
        }
    }

    /// Advance one frame: snapshot the phase, step the clock and update node
    /// activity. No-op when unmounted.
    pub fn tick(&mut self) {
        let MountState::Mounted(graph) = &mut self.state else {
            return;
        };
        graph.phase = graph.signal.current();
        graph.clock.advance();
        let (phase, t) = (graph.phase, graph.clock.time());
        for (i, node) in graph.nodes.iter_mut().enumerate() {
            let (active, pulse) = node_activity(phase, t, i);
            node.active = active;
            node.pulse = pulse;
        }
    }

    /// Draw the current frame: every edge, then every node.
    ///
    /// Draws nothing when unmounted. If the surface is lost mid-frame the
    /// engine unmounts itself and stops drawing.
    pub fn render<S: RenderSurface>(&mut self, surface: &mut S) {
        let MountState::Mounted(graph) = &self.state else {
            return;
        };
        if let Err(lost) = draw_frame(graph, surface) {
            tracing::debug!(%lost, "Visualization surface lost; unmounting");
            self.unmount();
        }
    }

    /// Phase seen by the last tick. `false` when unmounted.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.mounted().is_some_and(|g| g.phase.is_processing())
    }

    #[must_use]
    pub fn has_result(&self) -> bool {
        self.mounted().is_some_and(|g| g.phase.has_result())
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.mounted().map_or(0.0, |g| g.clock.time())
    }

    #[must_use]
    pub fn clock(&self) -> Option<FrameClock> {
        self.mounted().map(|g| g.clock)
    }

    #[must_use]
    pub fn nodes(&self) -> &[VisualizationNode] {
        self.mounted().map(|g| &g.nodes[..]).unwrap_or(&[])
    }

    fn mounted(&self) -> Option<&MountedGraph> {
        match &self.state {
            MountState::Mounted(graph) => Some(graph.as_ref()),
            MountState::Unmounted => None,
        }
    }
}

fn draw_frame<S: RenderSurface>(graph: &MountedGraph, surface: &mut S) -> Result<(), SurfaceLost> {
    let processing = graph.phase.is_processing();
    let t = graph.clock.time();

    for (from, to) in edges() {
        let a = &graph.nodes[from];
        let b = &graph.nodes[to];
        surface.draw_edge(&EdgeSample {
            from: (a.x, a.y),
            to: (b.x, b.y),
            alpha: edge_alpha(processing, t, a),
        })?;
    }

    for node in &graph.nodes {
        let radius = node_radius(node);
        surface.draw_node(&NodeSample {
            x: node.x,
            y: node.y,
            radius,
            active: node.active,
            glow: node.active.then_some(Glow {
                radius: radius * GLOW_SCALE,
                alpha: GLOW_ALPHA,
            }),
        })?;
    }
    Ok(())
}

/// Edge opacity, phased by the source node's position while processing.
#[must_use]
pub fn edge_alpha(processing: bool, t: f64, from: &VisualizationNode) -> f64 {
    if processing {
        PROCESSING_EDGE_ALPHA * ((2.0 * t + from.x * 0.1 + from.y * 0.1).sin() + 1.0) / 2.0
    } else {
        IDLE_EDGE_ALPHA
    }
}

/// `(active, pulse)` for node `index` at time `t`.
///
/// Processing: a travelling wave. Succeeded: every third node lit, steady.
/// Idle and Failed: dark.
#[must_use]
pub fn node_activity(phase: Phase, t: f64, index: usize) -> (bool, f64) {
    let i = index as f64;
    match phase {
        Phase::Processing => {
            let active = (t * 3.0 + i * 0.5).sin() > ACTIVE_THRESHOLD;
            let pulse = ((t * 4.0 + i * 0.3).sin() + 1.0) / 2.0;
            (active, pulse)
        }
        Phase::Succeeded => (index % 3 == 0, 0.0),
        Phase::Idle | Phase::Failed => (false, 0.0),
    }
}

#[must_use]
pub fn node_radius(node: &VisualizationNode) -> f64 {
    if node.active {
        ACTIVE_RADIUS + node.pulse * PULSE_RADIUS
    } else {
        BASE_RADIUS
    }
}
