//! Fixed network topology and node layout.

/// Nodes per layer, input to output.
pub const LAYER_SIZES: [usize; 4] = [4, 6, 6, 3];
pub const LAYER_COUNT: usize = LAYER_SIZES.len();
pub const NODE_COUNT: usize = 4 + 6 + 6 + 3;
/// Dense connections between each pair of adjacent layers.
pub const EDGE_COUNT: usize = 4 * 6 + 6 * 6 + 6 * 3;

pub const LAYER_LABELS: [&str; LAYER_COUNT] = [
    "Input Layer",
    "Neural Processing",
    "Symbolic Layer",
    "Output",
];

/// Drawable area in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationNode {
    pub x: f64,
    pub y: f64,
    pub layer: usize,
    pub active: bool,
    /// Intensity in `[0, 1]`.
    pub pulse: f64,
}

impl VisualizationNode {
    const UNPLACED: Self = Self {
        x: 0.0,
        y: 0.0,
        layer: 0,
        active: false,
        pulse: 0.0,
    };
}

/// Index of the first node of each layer inside the flat node array.
pub const LAYER_OFFSETS: [usize; LAYER_COUNT] = layer_offsets();

const fn layer_offsets() -> [usize; LAYER_COUNT] {
    let mut offsets = [0; LAYER_COUNT];
    let mut layer = 1;
    while layer < LAYER_COUNT {
        offsets[layer] = offsets[layer - 1] + LAYER_SIZES[layer - 1];
        layer += 1;
    }
    offsets
}

const fn layer_range(layer: usize) -> std::ops::Range<usize> {
    LAYER_OFFSETS[layer]..LAYER_OFFSETS[layer] + LAYER_SIZES[layer]
}

/// Index range of each layer inside the flat node array.
pub(crate) fn layer_ranges() -> impl Iterator<Item = (usize, std::ops::Range<usize>)> {
    (0..LAYER_COUNT).map(|layer| (layer, layer_range(layer)))
}

/// Build nodes laid out for `size`, all inactive.
pub(crate) fn build_nodes(size: CanvasSize) -> [VisualizationNode; NODE_COUNT] {
    let mut nodes = [VisualizationNode::UNPLACED; NODE_COUNT];
    layout(&mut nodes, size);
    nodes
}

/// Recompute positions in place. Activity and pulse are preserved.
///
/// Layer `l` of `L` sits at `x = w / (L + 1) * (l + 1)`; node `i` of a layer
/// with `n` nodes sits at `y = h / (n + 1) * (i + 1)`.
pub(crate) fn layout(nodes: &mut [VisualizationNode; NODE_COUNT], size: CanvasSize) {
    let layer_spacing = size.width / (LAYER_COUNT as f64 + 1.0);
    for (layer, range) in layer_ranges() {
        let count = range.len();
        let node_spacing = size.height / (count as f64 + 1.0);
        for (i, node) in nodes[range].iter_mut().enumerate() {
            node.x = layer_spacing * (layer as f64 + 1.0);
            node.y = node_spacing * (i as f64 + 1.0);
            node.layer = layer;
        }
    }
}

/// Every `(from, to)` index pair between adjacent layers. Runs once per frame
/// and does not touch the heap.
pub fn edges() -> impl Iterator<Item = (usize, usize)> {
    (0..LAYER_COUNT - 1).flat_map(|layer| {
        let to = layer_range(layer + 1);
        layer_range(layer).flat_map(move |a| to.clone().map(move |b| (a, b)))
    })
}

#[cfg(test)]
mod tests {
    use super::{
        CanvasSize, EDGE_COUNT, LAYER_OFFSETS, LAYER_SIZES, NODE_COUNT, build_nodes, edges, layout,
    };

    #[test]
    fn topology_counts() {
        assert_eq!(LAYER_SIZES.iter().sum::<usize>(), NODE_COUNT);
        assert_eq!(NODE_COUNT, 19);
        assert_eq!(edges().count(), EDGE_COUNT);
        assert_eq!(EDGE_COUNT, 78);
    }

    #[test]
    fn layer_offsets_are_prefix_sums() {
        assert_eq!(LAYER_OFFSETS, [0, 4, 10, 16]);
    }

    #[test]
    fn edges_enumerate_each_layer_pair_in_order() {
        let mut expected = Vec::new();
        for layer in 0..LAYER_SIZES.len() - 1 {
            for a in 0..LAYER_SIZES[layer] {
                for b in 0..LAYER_SIZES[layer + 1] {
                    expected.push((LAYER_OFFSETS[layer] + a, LAYER_OFFSETS[layer + 1] + b));
                }
            }
        }
        assert_eq!(edges().collect::<Vec<_>>(), expected);
        assert_eq!(edges().next(), Some((0, 4)));
        assert_eq!(edges().last(), Some((15, 18)));
    }

    #[test]
    fn edges_only_join_adjacent_layers() {
        let nodes = build_nodes(CanvasSize::new(800.0, 400.0));
        for (from, to) in edges() {
            assert_eq!(nodes[to].layer, nodes[from].layer + 1);
        }
    }

    #[test]
    fn layout_spaces_layers_evenly() {
        let nodes = build_nodes(CanvasSize::new(500.0, 300.0));

        // Layer 0 has 4 nodes: x = 100, y = 60, 120, 180, 240.
        let input: Vec<(f64, f64)> = nodes[..4].iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(
            input,
            vec![(100.0, 60.0), (100.0, 120.0), (100.0, 180.0), (100.0, 240.0)]
        );

        // Output layer has 3 nodes: x = 400, y = 75, 150, 225.
        let output: Vec<(f64, f64)> = nodes[16..].iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(output, vec![(400.0, 75.0), (400.0, 150.0), (400.0, 225.0)]);
        assert!(nodes[16..].iter().all(|n| n.layer == 3));
    }

    #[test]
    fn relayout_keeps_activity() {
        let mut nodes = build_nodes(CanvasSize::new(100.0, 100.0));
        nodes[5].active = true;
        nodes[5].pulse = 0.7;

        layout(&mut nodes, CanvasSize::new(1000.0, 500.0));
        assert!(nodes[5].active);
        assert_eq!(nodes[5].pulse, 0.7);
        assert_eq!(nodes[5].x, 400.0);
    }
}
