//! Graph construction from resolved imports.
//!
//! Each application's package tree is walked with an explicit work stack.
//! Every module's imports become edges, either between applications or
//! between modules depending on [`BuildOptions::show_modules`].

use std::collections::HashSet;

use crate::colors::app_colors;
use crate::config::RunConfig;
use crate::discovery::PackageFilter;
use crate::error::ConfigError;
use crate::graph::{DependencyGraph, LineStyle};
use crate::report::Reporter;
use crate::resolver::{is_dotted_prefix, ImportMap, ImportResolver, ImportableKind, Scope};

/// Suffix distinguishing an application's own package node from its modules
pub const INITIALIZER: &str = "__init__";

/// Options that shape the built graph
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub show_modules: bool,
    pub scope: Scope,
    pub dotted_scope_local: bool,
    pub use_colors: bool,
    pub exclude_packages: PackageFilter,
}

impl BuildOptions {
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            show_modules: config.show_modules,
            scope: config.scope,
            dotted_scope_local: config.dotted_scope_local,
            use_colors: config.use_colors(),
            exclude_packages: PackageFilter::new(&config.exclude_packages)?,
        })
    }
}

/// Walks applications and merges their imports into a [`DependencyGraph`]
pub struct GraphBuilder<'a> {
    resolver: &'a dyn ImportResolver,
    reporter: &'a dyn Reporter,
    applications: &'a [String],
    options: BuildOptions,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        resolver: &'a dyn ImportResolver,
        reporter: &'a dyn Reporter,
        applications: &'a [String],
        options: BuildOptions,
    ) -> Self {
        Self {
            resolver,
            reporter,
            applications,
            options,
        }
    }

    /// Build the graph for every application.
    ///
    /// Resolver failures are reported and skipped; building never fails.
    pub fn build(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        if !self.options.show_modules {
            for app in self.applications {
                graph.add_node(app);
            }
        }

        for app in self.applications {
            self.reporter.info(&format!("Analyzing {}", app));
            self.walk_application(&mut graph, app);
        }
        graph
    }

    fn walk_application(&self, graph: &mut DependencyGraph, app: &str) {
        let mut pending = vec![app.to_string()];

        while let Some(package) = pending.pop() {
            let children = match self.resolver.importables(&package) {
                Ok(children) => children,
                Err(e) => {
                    self.reporter.error(&format!("Package {}: {}", package, e));
                    continue;
                }
            };

            let mut subpackages = Vec::new();
            for child in children {
                let path = format!("{}.{}", package, child.name);
                match child.kind {
                    ImportableKind::Package => {
                        if self.options.exclude_packages.is_excluded(&child.name) {
                            self.reporter.info(&format!("Ignore {}", path));
                            continue;
                        }
                        // Registered sub-applications are walked as their own root
                        if !self.applications.contains(&path) {
                            subpackages.push(path);
                        }
                    }
                    ImportableKind::Module => self.add_module(graph, app, &path),
                }
            }
            pending.extend(subpackages.into_iter().rev());
        }
    }

    fn add_module(&self, graph: &mut DependencyGraph, app: &str, module: &str) {
        let node = self.initializer_node(module);
        if self.options.show_modules {
            self.ensure_module_node(graph, &node, Some(app));
        }

        let source = match self.resolver.source(module) {
            Ok(source) => source,
            Err(e) => {
                self.reporter.error(&format!("File {}: {}", module, e));
                return;
            }
        };
        let imports = match self.resolver.imports(&source, module, self.options.scope) {
            Ok(imports) => imports,
            Err(e) => {
                self.reporter.error(&format!("File {}: {}", module, e));
                return;
            }
        };

        if self.options.show_modules {
            self.add_module_edges(graph, &node, module, &source, &imports);
        } else {
            self.add_application_edges(graph, app, &imports);
        }
    }

    fn add_application_edges(&self, graph: &mut DependencyGraph, app: &str, imports: &ImportMap) {
        for target in imports.values() {
            if is_dotted_prefix(app, target) {
                continue;
            }
            if let Some(dest) = self.owning_application(target) {
                self.add_edge(graph, app, dest, LineStyle::Filled);
            }
        }
    }

    fn add_module_edges(
        &self,
        graph: &mut DependencyGraph,
        node: &str,
        module: &str,
        source: &str,
        imports: &ImportMap,
    ) {
        let mut global_targets: Option<HashSet<String>> = None;

        for target in imports.values() {
            let Some(dest) = self.resolve_module_node(graph, target) else {
                continue;
            };
            let dest = self.initializer_node(&dest);
            if dest == node || !self.ensure_module_node(graph, &dest, None) {
                continue;
            }

            let already_filled = graph
                .edge(node, &dest)
                .is_some_and(|e| e.style == LineStyle::Filled);
            let style = if self.options.dotted_scope_local && !already_filled {
                let globals = global_targets
                    .get_or_insert_with(|| self.global_targets(module, source));
                if globals.contains(target) {
                    LineStyle::Filled
                } else {
                    LineStyle::Dotted
                }
            } else {
                LineStyle::Filled
            };
            self.add_edge(graph, node, &dest, style);
        }
    }

    /// Import targets visible at module level
    fn global_targets(&self, module: &str, source: &str) -> HashSet<String> {
        match self.resolver.imports(source, module, Scope::Global) {
            Ok(imports) => imports.into_values().collect(),
            Err(e) => {
                self.reporter.error(&format!("File {}: {}", module, e));
                HashSet::new()
            }
        }
    }

    /// Shorten `target` segment by segment until it names a graph node or an
    /// importable package/module.
    fn resolve_module_node(&self, graph: &DependencyGraph, target: &str) -> Option<String> {
        let mut path = target.to_string();
        loop {
            if path.is_empty() {
                return None;
            }
            if graph.has_node(&path) {
                return Some(path);
            }
            match self.resolver.is_importable(&path) {
                Ok(true) => return Some(path),
                Ok(false) => {}
                Err(e) => {
                    self.reporter.error(&format!("File {}: {}", path, e));
                    return None;
                }
            }
            match path.rfind('.') {
                Some(i) => path.truncate(i),
                None => return None,
            }
        }
    }

    /// Add a module node owned by `app` (or by the application it falls
    /// under). Returns false when no registered application owns it.
    fn ensure_module_node(&self, graph: &mut DependencyGraph, node: &str, app: Option<&str>) -> bool {
        if graph.has_node(node) {
            return true;
        }
        let Some(owner) = app.or_else(|| self.owning_application(node)) else {
            return false;
        };
        graph.add_node(node);
        if self.options.use_colors {
            graph.set_node_colors(node, app_colors(owner));
        }
        true
    }

    /// First registered application the dotted path falls under
    fn owning_application(&self, path: &str) -> Option<&'a str> {
        self.applications
            .iter()
            .find(|app| is_dotted_prefix(app, path))
            .map(|app| app.as_str())
    }

    /// `shop` becomes `shop.__init__` when `shop` is an application root
    fn initializer_node(&self, node: &str) -> String {
        if self.applications.iter().any(|app| app == node) {
            format!("{}.{}", node, INITIALIZER)
        } else {
            node.to_string()
        }
    }

    fn add_edge(&self, graph: &mut DependencyGraph, from: &str, to: &str, style: LineStyle) {
        let weight = graph.add_import(from, to, style);
        self.reporter
            .detail(&format!("{} --> {} ({})", from, to, weight));
    }
}
