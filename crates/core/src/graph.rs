//! Import dependency graph
//!
//! Uses `petgraph::StableGraph` so node indices remain stable when the
//! post-processing filters remove nodes, and so a cloned graph shares
//! indices with the original (the cycle finder relies on this).

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;

/// Highlight color applied to edges lying on a detected cycle.
pub const CYCLE_COLOR: &str = "#f8c85c";

/// A node: an application, or a module in module-granularity mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Dotted path identifier (e.g. `shop` or `shop.models`)
    pub id: String,
    /// Fill and font colors, set only when module coloring is enabled
    pub colors: Option<NodeColors>,
}

/// Color pair shared by every module of one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeColors {
    /// Background color, `#rrggbb`
    pub fill: String,
    /// Font and border color, `#rrggbb`
    pub font: String,
}

/// Line style of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    /// Import visible at module level
    #[default]
    Filled,
    /// Import only visible inside a nested (function) block
    Dotted,
}

/// A merged import relationship between two nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Number of import occurrences merged into this edge
    pub weight: u32,
    pub style: LineStyle,
    /// Id of the last detected cycle that claimed this edge
    pub cycle: Option<usize>,
}

impl Edge {
    fn new(style: LineStyle) -> Self {
        Self {
            weight: 1,
            style,
            cycle: None,
        }
    }

    /// `(<weight>)`, or `Cycle <id>` once the edge is cycle-annotated.
    pub fn label(&self) -> String {
        match self.cycle {
            Some(id) => format!("Cycle {}", id),
            None => format!("({})", self.weight),
        }
    }

    /// Highlight color for edges on a cycle.
    pub fn highlight(&self) -> Option<&'static str> {
        self.cycle.map(|_| CYCLE_COLOR)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The dependency graph
///
/// At most one edge per ordered node pair; repeated imports bump the weight.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: StableGraph<Node, Edge>,
    /// Node id to index, avoids linear scans on every import
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it does not exist yet and return its index
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(Node {
            id: id.to_string(),
            colors: None,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index(id)
            .and_then(|idx| self.inner.node_weight(idx))
    }

    pub fn set_node_colors(&mut self, id: &str, colors: NodeColors) {
        if let Some(node) = self
            .index
            .get(id)
            .and_then(|&idx| self.inner.node_weight_mut(idx))
        {
            node.colors = Some(colors);
        }
    }

    /// Record one import occurrence from `from` to `to`.
    ///
    /// Creates the edge with weight 1 or increments the existing one; the
    /// style is overwritten with `style` either way. Both nodes are created
    /// when missing. Returns the resulting weight.
    pub fn add_import(&mut self, from: &str, to: &str, style: LineStyle) -> u32 {
        let a = self.add_node(from);
        let b = self.add_node(to);
        match self.inner.find_edge(a, b) {
            Some(e) => {
                let edge = &mut self.inner[e];
                edge.weight += 1;
                edge.style = style;
                edge.weight
            }
            None => {
                self.inner.add_edge(a, b, Edge::new(style));
                1
            }
        }
    }

    /// Look up the edge between two node ids
    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        self.inner.find_edge(a, b).map(|e| &self.inner[e])
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    /// Iterate over all edges as `(source id, target id, edge)`
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> + '_ {
        self.inner.edge_references().map(move |e| {
            (
                self.inner[e.source()].id.as_str(),
                self.inner[e.target()].id.as_str(),
                e.weight(),
            )
        })
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.inner.edges_directed(idx, Direction::Outgoing).count()
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.inner.edges_directed(idx, Direction::Incoming).count()
    }

    /// True when any edge touching `idx` carries a cycle annotation
    pub fn touches_cycle(&self, idx: NodeIndex) -> bool {
        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.inner.edges_directed(idx, Direction::Incoming))
            .any(|e| e.weight().cycle.is_some())
    }

    /// Remove a node together with its incident edges
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<Node> {
        let node = self.inner.remove_node(idx)?;
        self.index.remove(&node.id);
        Some(node)
    }

    pub(crate) fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.inner.node_weight(idx).map(|n| n.id.as_str())
    }

    pub(crate) fn find_edge_index(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.inner.find_edge(a, b)
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeIndex) {
        self.inner.remove_edge(e);
    }

    pub(crate) fn edge_weight_mut(&mut self, e: EdgeIndex) -> Option<&mut Edge> {
        self.inner.edge_weight_mut(e)
    }

    /// Successors of `idx`, sorted by index for a deterministic walk
    pub(crate) fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .inner
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        next.sort();
        next.dedup();
        next
    }

    pub(crate) fn inner(&self) -> &StableGraph<Node, Edge> {
        &self.inner
    }
}
