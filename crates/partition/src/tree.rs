use latticeflow_common::{Bounds, Vec2};

use crate::error::PartitionError;

/// Index of a node in the tree's arena.
pub type NodeId = usize;

/// Subdivision limits for a [`PartitionTree`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    /// A leaf no wider and no taller than this accepts points without splitting.
    pub leaf_size: f32,
    /// Children narrower or shorter than this are never created; a leaf that
    /// cannot split accumulates every point routed to it.
    pub min_node_size: f32,
}

impl TreeConfig {
    fn validate(&self) -> Result<(), PartitionError> {
        if !(self.leaf_size.is_finite() && self.leaf_size > 0.0) {
            return Err(PartitionError::InvalidConfig(format!(
                "leaf_size must be positive, got {}",
                self.leaf_size
            )));
        }
        if !(self.min_node_size.is_finite() && self.min_node_size > 0.0) {
            return Err(PartitionError::InvalidConfig(format!(
                "min_node_size must be positive, got {}",
                self.min_node_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    index: usize,
    position: Vec2,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(Vec<Entry>),
    /// Children occupy `first_child..first_child + N * N`, row-major in y.
    Internal { first_child: NodeId },
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Bounds,
    depth: u32,
    kind: NodeKind,
}

/// Bounding-box tree with `N × N` children per internal node.
///
/// Built once from a static list of positions; each position is tagged with
/// its index in that list. Leaves split lazily the first time a point reaches
/// one that is larger than `leaf_size`.
#[derive(Debug, Clone)]
pub struct PartitionTree<const N: usize> {
    config: TreeConfig,
    nodes: Vec<Node>,
    len: usize,
}

impl<const N: usize> PartitionTree<N> {
    pub const ROOT: NodeId = 0;

    /// Create an empty tree covering `bounds`.
    pub fn new(bounds: Bounds, config: TreeConfig) -> Result<Self, PartitionError> {
        if N < 2 {
            return Err(PartitionError::InvalidConfig(format!(
                "branching factor must be at least 2, got {N}"
            )));
        }
        if !bounds.is_valid() {
            return Err(PartitionError::InvalidBounds {
                min_x: bounds.min.x,
                min_y: bounds.min.y,
                max_x: bounds.max.x,
                max_y: bounds.max.y,
            });
        }
        config.validate()?;
        Ok(Self {
            config,
            nodes: vec![Node {
                bounds,
                depth: 0,
                kind: NodeKind::Leaf(Vec::new()),
            }],
            len: 0,
        })
    }

    /// Build a tree over `positions`. Fails on the first position outside `bounds`.
    pub fn build(
        bounds: Bounds,
        config: TreeConfig,
        positions: &[Vec2],
    ) -> Result<Self, PartitionError> {
        let mut tree = Self::new(bounds, config)?;
        for (index, &position) in positions.iter().enumerate() {
            tree.insert(index, position)?;
        }
        tracing::debug!(
            positions = tree.len,
            nodes = tree.nodes.len(),
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            "partition tree built"
        );
        Ok(tree)
    }

    fn insert(&mut self, index: usize, position: Vec2) -> Result<(), PartitionError> {
        if !self.bounds().contains(position) {
            return Err(PartitionError::OutOfBounds {
                index,
                x: position.x,
                y: position.y,
            });
        }
        let mut id = Self::ROOT;
        loop {
            let node = &self.nodes[id];
            if let NodeKind::Internal { first_child } = node.kind {
                id = first_child + child_slot::<N>(&node.bounds, position);
            } else if self.should_split(&node.bounds) {
                self.split(id);
            } else {
                break;
            }
        }
        if let NodeKind::Leaf(entries) = &mut self.nodes[id].kind {
            entries.push(Entry { index, position });
        }
        self.len += 1;
        Ok(())
    }

    fn should_split(&self, bounds: &Bounds) -> bool {
        let (w, h) = (bounds.width(), bounds.height());
        let oversized = w > self.config.leaf_size || h > self.config.leaf_size;
        let splittable = w / N as f32 >= self.config.min_node_size
            && h / N as f32 >= self.config.min_node_size;
        oversized && splittable
    }

    fn split(&mut self, id: NodeId) {
        let parent = &self.nodes[id];
        debug_assert!(matches!(&parent.kind, NodeKind::Leaf(e) if e.is_empty()));
        let (bounds, depth) = (parent.bounds, parent.depth);
        let first_child = self.nodes.len();
        for j in 0..N {
            for i in 0..N {
                let min = Vec2::new(
                    edge::<N>(bounds.min.x, bounds.max.x, i),
                    edge::<N>(bounds.min.y, bounds.max.y, j),
                );
                let max = Vec2::new(
                    edge::<N>(bounds.min.x, bounds.max.x, i + 1),
                    edge::<N>(bounds.min.y, bounds.max.y, j + 1),
                );
                self.nodes.push(Node {
                    bounds: Bounds::new(min, max),
                    depth: depth + 1,
                    kind: NodeKind::Leaf(Vec::new()),
                });
            }
        }
        self.nodes[id].kind = NodeKind::Internal { first_child };
    }

    /// Indices of every position inside the rectangle `[min, max]` (inclusive).
    ///
    /// Order is unspecified. Subtrees whose bounds miss the rectangle are
    /// skipped wholesale; traversal uses an explicit stack.
    pub fn query_range(&self, min: Vec2, max: Vec2) -> Vec<usize> {
        self.query(&Bounds::new(min, max))
    }

    pub fn query(&self, area: &Bounds) -> Vec<usize> {
        let mut result = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bounds.intersects(area) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(entries) => result.extend(
                    entries
                        .iter()
                        .filter(|e| area.contains(e.position))
                        .map(|e| e.index),
                ),
                NodeKind::Internal { first_child } => {
                    stack.extend(*first_child..*first_child + N * N);
                }
            }
        }
        result
    }

    /// World rectangle covered by the root.
    pub fn bounds(&self) -> Bounds {
        self.nodes[Self::ROOT].bounds
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of positions stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf(_)))
            .count()
    }

    /// Depth of the deepest node; a lone root has depth 0.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

/// Coordinate of the `k`-th of `N + 1` split lines between `lo` and `hi`.
/// The last line is `hi` exactly so children tile the parent without gaps.
fn edge<const N: usize>(lo: f32, hi: f32, k: usize) -> f32 {
    if k >= N {
        hi
    } else {
        lo + (hi - lo) * (k as f32 / N as f32)
    }
}

/// Column (or row) of the child whose edges enclose `v`.
fn child_axis<const N: usize>(lo: f32, hi: f32, v: f32) -> usize {
    let estimate = ((v - lo) / (hi - lo) * N as f32).floor();
    let mut k = if estimate > 0.0 {
        (estimate as usize).min(N - 1)
    } else {
        0
    };
    // rounding in `edge` can leave the estimate one slot off
    while k > 0 && v < edge::<N>(lo, hi, k) {
        k -= 1;
    }
    while k + 1 < N && v > edge::<N>(lo, hi, k + 1) {
        k += 1;
    }
    k
}

fn child_slot<const N: usize>(bounds: &Bounds, p: Vec2) -> usize {
    let i = child_axis::<N>(bounds.min.x, bounds.max.x, p.x);
    let j = child_axis::<N>(bounds.min.y, bounds.max.y, p.y);
    j * N + i
}
