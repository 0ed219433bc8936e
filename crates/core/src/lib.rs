//! Detect Cyclic Core Library
//!
//! Builds a dependency graph from the imports of a set of Python
//! applications, labels every circular dependency it contains and renders
//! the result as a Graphviz diagram.
//!
//! The pipeline is: configuration check, graph building
//! ([`builder`]), cycle marking ([`cycles`]), node filtering ([`filters`])
//! and rendering ([`render`]). [`run`] drives all of it.

use anyhow::Context;
use std::time::Instant;

pub mod builder;
pub mod colors;
pub mod config;
pub mod cycles;
pub mod discovery;
pub mod error;
pub mod filters;
pub mod graph;
pub mod render;
pub mod report;
pub mod resolver;

// Re-export commonly used types
pub use config::RunConfig;
pub use cycles::{Cycle, CycleReport};
pub use error::{ConfigError, ResolveError};
pub use graph::{DependencyGraph, Edge, LineStyle, Node};
pub use render::{GraphvizRenderer, Renderer};
pub use report::{Reporter, SilentReporter, TracingReporter, Verbosity};
pub use resolver::{ImportResolver, PythonResolver, Scope};

use builder::{BuildOptions, GraphBuilder};
use filters::FilterReport;
use resolver::ImportableKind;

/// Result of analyzing a codebase, before rendering
#[derive(Debug)]
pub struct Analysis {
    /// Applications that were walked, in registration order
    pub applications: Vec<String>,
    /// The annotated and filtered graph
    pub graph: DependencyGraph,
    pub cycles: CycleReport,
    pub removed: FilterReport,
}

/// Registered applications narrowed by the include/exclude lists.
///
/// Without an explicit `applications` list every top-level package the
/// resolver reports is registered.
pub fn select_applications(
    config: &RunConfig,
    resolver: &dyn ImportResolver,
) -> anyhow::Result<Vec<String>> {
    let registered = if config.applications.is_empty() {
        resolver
            .importables("")
            .context("Failed to discover top-level packages")?
            .into_iter()
            .filter(|child| child.kind == ImportableKind::Package)
            .map(|child| child.name)
            .collect()
    } else {
        config.applications.clone()
    };

    let selected = config.select_applications(&registered);
    if selected.is_empty() {
        return Err(ConfigError::NoApplications.into());
    }
    Ok(selected)
}

/// Build, cycle-mark and filter the graph described by `config`.
///
/// Fails before any graph work when the configuration is invalid.
pub fn analyze(
    config: &RunConfig,
    resolver: &dyn ImportResolver,
    reporter: &dyn Reporter,
) -> anyhow::Result<Analysis> {
    config.validate()?;
    let options = BuildOptions::from_config(config)?;
    let applications = select_applications(config, resolver)?;

    let mut graph = GraphBuilder::new(resolver, reporter, &applications, options).build();
    let cycles = cycles::find_all_cycles(&mut graph, reporter);
    let removed = filters::apply_filters(&mut graph, config.filters(), reporter);

    Ok(Analysis {
        applications,
        graph,
        cycles,
        removed,
    })
}

/// Analyze and write the diagram to `config.output`.
pub fn run(
    config: &RunConfig,
    resolver: &dyn ImportResolver,
    renderer: &dyn Renderer,
    reporter: &dyn Reporter,
) -> anyhow::Result<Analysis> {
    let start = Instant::now();

    let analysis = analyze(config, resolver, reporter)?;
    renderer
        .render(&analysis.graph, &config.output)
        .with_context(|| format!("Failed to render {}", config.output.display()))?;

    reporter.info(&format!("Finished in {:.2?}", start.elapsed()));
    Ok(analysis)
}
