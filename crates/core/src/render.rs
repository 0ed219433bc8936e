//! Diagram output.
//!
//! The graph is serialized to Graphviz DOT; any format other than DOT itself
//! is produced by piping that text through the `dot` executable.

use anyhow::{anyhow, bail, Context};
use petgraph::dot::Dot;
use petgraph::stable_graph::StableGraph;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::graph::{DependencyGraph, Edge, LineStyle, Node};

/// Writes a finished graph to a file
pub trait Renderer {
    fn render(&self, graph: &DependencyGraph, output: &Path) -> anyhow::Result<()>;
}

/// Serialize the graph as DOT text
pub fn to_dot(graph: &DependencyGraph) -> String {
    let inner: &StableGraph<Node, Edge> = graph.inner();
    format!(
        "{}",
        Dot::with_attr_getters(
            inner,
            &[],
            &|_, edge| edge_attributes(edge.weight()),
            &|_, (_, node)| node_attributes(node),
        )
    )
}

fn edge_attributes(edge: &Edge) -> String {
    let style = match edge.style {
        LineStyle::Filled => "solid",
        LineStyle::Dotted => "dotted",
    };
    match edge.highlight() {
        Some(color) => format!("style = \"{}\" color = \"{}\"", style, color),
        None => format!("style = \"{}\"", style),
    }
}

fn node_attributes(node: &Node) -> String {
    match &node.colors {
        Some(colors) => format!(
            "style = \"filled\" fillcolor = \"{}\" color = \"{}\" fontcolor = \"{}\"",
            colors.fill, colors.font, colors.font
        ),
        None => String::new(),
    }
}

/// Renders through Graphviz; `.dot`/`.gv` targets are written directly
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    program: PathBuf,
}

impl GraphvizRenderer {
    pub fn new() -> Self {
        Self::with_program("dot")
    }

    /// Use a specific layout executable instead of `dot` from `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn rasterize(&self, dot: &str, format: &str, output: &Path) -> anyhow::Result<()> {
        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format))
            .arg("-o")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to run {} (is Graphviz installed?)",
                    self.program.display()
                )
            })?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("Graphviz stdin unavailable"))?;
            stdin
                .write_all(dot.as_bytes())
                .context("Failed to send the graph to Graphviz")?;
        }

        let result = child.wait_with_output().context("Graphviz did not finish")?;
        if !result.status.success() {
            bail!(
                "Graphviz failed to render {} output: {}",
                format,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }
        Ok(())
    }
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, graph: &DependencyGraph, output: &Path) -> anyhow::Result<()> {
        let format = output
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| {
                anyhow!(
                    "Output file {} has no extension to select a format",
                    output.display()
                )
            })?;

        let dot = to_dot(graph);
        match format.as_str() {
            "dot" | "gv" => std::fs::write(output, dot)
                .with_context(|| format!("Failed to write {}", output.display())),
            _ => self.rasterize(&dot, &format, output),
        }
    }
}
