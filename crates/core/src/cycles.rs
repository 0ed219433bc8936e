//! Repeated elementary-cycle extraction.
//!
//! Cycles are searched on a scratch copy of the graph. Every edge of a found
//! cycle is labeled on the original graph and deleted from the copy, so the
//! loop ends once the copy is acyclic. The original keeps all of its edges.

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

use crate::graph::DependencyGraph;
use crate::report::Reporter;

/// One discovered cycle, nodes in walk order (last links back to first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub id: usize,
    pub nodes: Vec<String>,
}

/// Every cycle found in one run, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycles: Vec<Cycle>,
}

impl CycleReport {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Find cycles until none is left and annotate their edges on `graph`.
///
/// Ids start at 1. Each edge is claimed by at most one cycle because it is
/// removed from the scratch copy as soon as it is labeled.
pub fn find_all_cycles(graph: &mut DependencyGraph, reporter: &dyn Reporter) -> CycleReport {
    let mut scratch = graph.clone();
    let mut report = CycleReport::default();

    while let Some(cycle) = find_cycle(&scratch) {
        let id = report.cycles.len() + 1;

        for (i, &from) in cycle.iter().enumerate() {
            let to = cycle[(i + 1) % cycle.len()];
            if let Some(edge) = graph
                .find_edge_index(from, to)
                .and_then(|e| graph.edge_weight_mut(e))
            {
                edge.cycle = Some(id);
            }
            if let Some(e) = scratch.find_edge_index(from, to) {
                scratch.remove_edge(e);
            }
        }

        let nodes: Vec<String> = cycle
            .iter()
            .filter_map(|&idx| graph.node_id(idx))
            .map(str::to_string)
            .collect();
        reporter.info(&format!("Cycle {}: {}", id, nodes.join(" -> ")));
        report.cycles.push(Cycle { id, nodes });
    }

    report
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

/// Depth-first search for one elementary cycle.
///
/// The frame stack doubles as the current path; revisiting a node on it
/// closes a cycle.
fn find_cycle(graph: &DependencyGraph) -> Option<Vec<NodeIndex>> {
    let mut finished: HashSet<NodeIndex> = HashSet::new();

    for start in graph.node_indices() {
        if finished.contains(&start) {
            continue;
        }

        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        let mut frames = vec![Frame {
            node: start,
            successors: graph.successors(start),
            next: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let node = frame.node;
            let Some(&next) = frame.successors.get(frame.next) else {
                frames.pop();
                on_path.remove(&node);
                finished.insert(node);
                continue;
            };
            frame.next += 1;

            if on_path.contains(&next) {
                let pos = frames.iter().position(|f| f.node == next)?;
                return Some(frames[pos..].iter().map(|f| f.node).collect());
            }
            if finished.contains(&next) {
                continue;
            }
            on_path.insert(next);
            frames.push(Frame {
                node: next,
                successors: graph.successors(next),
                next: 0,
            });
        }
    }

    None
}
