//! Node-removal filters applied after cycle marking.
//!
//! Each enabled filter runs once, in the order isolated, sinks, sources,
//! non-cyclic. A filter collects its matches from the graph as it stands
//! when the filter starts, then removes them with their incident edges.
//! Removals are not iterated to a fixpoint.

use petgraph::stable_graph::NodeIndex;

use crate::graph::DependencyGraph;
use crate::report::Reporter;

/// Which filters to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    /// No incoming and no outgoing edges
    pub isolated: bool,
    /// No outgoing edges
    pub sinks: bool,
    /// No incoming edges
    pub sources: bool,
    /// Not touching any cycle-labeled edge
    pub non_cyclic: bool,
}

/// Ids of the nodes each filter removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub isolated: Vec<String>,
    pub sinks: Vec<String>,
    pub sources: Vec<String>,
    pub non_cyclic: Vec<String>,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.isolated.len() + self.sinks.len() + self.sources.len() + self.non_cyclic.len()
    }
}

pub fn apply_filters(
    graph: &mut DependencyGraph,
    filters: Filters,
    reporter: &dyn Reporter,
) -> FilterReport {
    let mut report = FilterReport::default();

    if filters.isolated {
        report.isolated = remove_matching(graph, |g, n| g.in_degree(n) == 0 && g.out_degree(n) == 0);
        log_removed(reporter, "isolated", &report.isolated);
    }
    if filters.sinks {
        report.sinks = remove_matching(graph, |g, n| g.out_degree(n) == 0);
        log_removed(reporter, "sink", &report.sinks);
    }
    if filters.sources {
        report.sources = remove_matching(graph, |g, n| g.in_degree(n) == 0);
        log_removed(reporter, "source", &report.sources);
    }
    if filters.non_cyclic {
        report.non_cyclic = remove_matching(graph, |g, n| !g.touches_cycle(n));
        log_removed(reporter, "non-cyclic", &report.non_cyclic);
    }

    report
}

fn remove_matching<F>(graph: &mut DependencyGraph, matches: F) -> Vec<String>
where
    F: Fn(&DependencyGraph, NodeIndex) -> bool,
{
    let current: &DependencyGraph = graph;
    let doomed: Vec<NodeIndex> = current
        .node_indices()
        .filter(|&idx| matches(current, idx))
        .collect();

    doomed
        .into_iter()
        .filter_map(|idx| graph.remove_node(idx))
        .map(|node| node.id)
        .collect()
}

fn log_removed(reporter: &dyn Reporter, kind: &str, removed: &[String]) {
    reporter.info(&format!("Removed {} {} node(s)", removed.len(), kind));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::find_all_cycles;
    use crate::cycles::tests::europe;
    use crate::graph::LineStyle;
    use crate::report::SilentReporter;
    use std::collections::BTreeSet;

    fn node_set(graph: &DependencyGraph) -> BTreeSet<String> {
        graph.nodes().map(|n| n.id.clone()).collect()
    }

    /// a -> b -> c, d isolated
    fn chain() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_import("a", "b", LineStyle::Filled);
        graph.add_import("b", "c", LineStyle::Filled);
        graph.add_node("d");
        graph
    }

    #[test]
    fn test_no_filters_is_identity() {
        let mut graph = chain();
        let report = apply_filters(&mut graph, Filters::default(), &SilentReporter);
        assert_eq!(report.removed(), 0);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_remove_isolated() {
        let mut graph = chain();
        let filters = Filters {
            isolated: true,
            ..Filters::default()
        };
        let report = apply_filters(&mut graph, filters, &SilentReporter);

        assert_eq!(report.isolated, vec!["d"]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_remove_sinks_single_pass() {
        let mut graph = chain();
        let filters = Filters {
            sinks: true,
            ..Filters::default()
        };
        let report = apply_filters(&mut graph, filters, &SilentReporter);

        // b becomes a sink once c is gone but is not re-evaluated
        assert_eq!(report.sinks, vec!["c", "d"]);
        assert_eq!(node_set(&graph), BTreeSet::from(["a", "b"].map(String::from)));
    }

    #[test]
    fn test_remove_sources_single_pass() {
        let mut graph = chain();
        let filters = Filters {
            sources: true,
            ..Filters::default()
        };
        let report = apply_filters(&mut graph, filters, &SilentReporter);

        assert_eq!(report.sources, vec!["a", "d"]);
        assert_eq!(node_set(&graph), BTreeSet::from(["b", "c"].map(String::from)));
    }

    #[test]
    fn test_sink_removal_matches_prior_out_degree() {
        let mut graph = europe();
        find_all_cycles(&mut graph, &SilentReporter);
        let expected: Vec<String> = graph
            .node_indices()
            .filter(|&n| graph.out_degree(n) == 0)
            .filter_map(|n| graph.node_id(n).map(str::to_string))
            .collect();

        let filters = Filters {
            sinks: true,
            ..Filters::default()
        };
        let report = apply_filters(&mut graph, filters, &SilentReporter);
        assert_eq!(report.sinks, expected);
        assert_eq!(report.sinks, vec!["Netherlands"]);
    }

    #[test]
    fn test_only_cyclic_subset_of_isolated_removal() {
        let mut base = europe();
        base.add_node("Iceland");
        base.add_import("Denmark", "Sweden", LineStyle::Filled);
        find_all_cycles(&mut base, &SilentReporter);

        let mut isolated_only = base.clone();
        apply_filters(
            &mut isolated_only,
            Filters {
                isolated: true,
                ..Filters::default()
            },
            &SilentReporter,
        );

        let mut cyclic = base.clone();
        apply_filters(
            &mut cyclic,
            Filters {
                isolated: true,
                non_cyclic: true,
                ..Filters::default()
            },
            &SilentReporter,
        );

        assert!(node_set(&cyclic).is_subset(&node_set(&isolated_only)));
        assert!(!node_set(&isolated_only).contains("Iceland"));
        for id in ["Netherlands", "Denmark", "Sweden", "Iceland"] {
            assert!(!cyclic.has_node(id), "{} should be removed", id);
        }
        for idx in cyclic.node_indices() {
            assert!(cyclic.touches_cycle(idx));
        }
    }
}
