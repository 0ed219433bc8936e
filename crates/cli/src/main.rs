use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use detect_cyclic::config::CONFIG_FILENAME;
use detect_cyclic::{
    ConfigError, GraphvizRenderer, PythonResolver, RunConfig, Scope, TracingReporter, Verbosity,
};

/// detect-cyclic - Find circular imports between Python applications
#[derive(Parser)]
#[command(name = "detect-cyclic")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(about = "Draw the import graph of Python applications and highlight its cycles", long_about = None)]
struct Cli {
    /// Only use these applications in the graph (separated by commas)
    #[arg(short = 'i', long, value_delimiter = ',')]
    include_apps: Vec<String>,

    /// Exclude these applications from the graph (separated by commas)
    #[arg(short = 'e', long, value_delimiter = ',')]
    exclude_apps: Vec<String>,

    /// Output file; the extension selects the format
    #[arg(short = 'f', long)]
    file_name: Option<PathBuf>,

    /// Skip these sub-packages, e.g. migrations,templatetags (globs, separated by commas)
    #[arg(short = 'p', long, value_delimiter = ',')]
    exclude_packages: Vec<String>,

    /// Remove the isolated nodes
    #[arg(short = 'r', long)]
    remove_isolate_nodes: bool,

    /// Remove the sink nodes
    #[arg(short = 'k', long)]
    remove_sink_nodes: bool,

    /// Remove the source nodes
    #[arg(short = 'a', long)]
    remove_source_nodes: bool,

    /// Remove the nodes without a cycle
    #[arg(short = 'o', long)]
    only_cyclic: bool,

    /// One node per module instead of one per application
    #[arg(short = 's', long)]
    show_modules: bool,

    /// Ignore imports inside functions
    #[arg(short = 'g', long)]
    scope_global: bool,

    /// Color the nodes even when the format is not svg
    #[arg(short = 'c', long)]
    force_colors: bool,

    /// Draw imports made inside functions with a dotted line
    #[arg(short = 'd', long)]
    dotted_scope_local: bool,

    /// 0 silent, 1 errors, 2 progress, 3 every edge
    #[arg(short = 'v', long)]
    verbosity: Option<u8>,

    /// Configuration file (defaults to ./detect-cyclic.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory searched for applications; may be repeated
    #[arg(long = "source-root")]
    source_roots: Vec<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<RunConfig> {
        let config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::discover(&std::env::current_dir()?)?.unwrap_or_default(),
        };
        Ok(self.apply(config))
    }

    /// Flags given on the command line win over the file
    fn apply(&self, mut config: RunConfig) -> RunConfig {
        if !self.include_apps.is_empty() {
            config.include_apps = self.include_apps.clone();
        }
        if !self.exclude_apps.is_empty() {
            config.exclude_apps = self.exclude_apps.clone();
        }
        if !self.exclude_packages.is_empty() {
            config.exclude_packages = self.exclude_packages.clone();
        }
        if !self.source_roots.is_empty() {
            config.source_roots = self.source_roots.clone();
        }
        if let Some(file_name) = &self.file_name {
            config.output = file_name.clone();
        }
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity;
        }
        if self.scope_global {
            config.scope = Scope::Global;
        }
        config.remove_isolate_nodes |= self.remove_isolate_nodes;
        config.remove_sink_nodes |= self.remove_sink_nodes;
        config.remove_source_nodes |= self.remove_source_nodes;
        config.only_cyclic |= self.only_cyclic;
        config.show_modules |= self.show_modules;
        config.force_colors |= self.force_colors;
        config.dotted_scope_local |= self.dotted_scope_local;
        config
    }
}

fn init_logging(verbosity: Verbosity) {
    let level = match verbosity.0 {
        0 | 1 => tracing::Level::ERROR,
        2 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    init_logging(config.verbosity());

    let resolver = PythonResolver::new(config.source_roots.clone());
    let reporter = TracingReporter::new(config.verbosity());
    let renderer = GraphvizRenderer::new();

    let analysis = detect_cyclic::run(&config, &resolver, &renderer, &reporter)?;

    println!(
        "{} application(s), {} node(s), {} cycle(s) -> {}",
        analysis.applications.len(),
        analysis.graph.node_count(),
        analysis.cycles.len(),
        config.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(ConfigError::NoApplications) = e.downcast_ref::<ConfigError>() {
                eprintln!(
                    "Hint: list them under `applications` in {} or pass --source-root",
                    CONFIG_FILENAME
                );
            }
            if e.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "detect-cyclic",
            "-i",
            "blog,shop",
            "-p",
            "migrations,tests",
            "-f",
            "out.dot",
            "-s",
            "-o",
            "-g",
        ]);
        let config = cli.apply(RunConfig::default());

        assert_eq!(config.include_apps, vec!["blog", "shop"]);
        assert_eq!(config.exclude_packages, vec!["migrations", "tests"]);
        assert_eq!(config.output, PathBuf::from("out.dot"));
        assert!(config.show_modules);
        assert!(config.only_cyclic);
        assert_eq!(config.scope, Scope::Global);
        assert!(!config.dotted_scope_local);
    }

    #[test]
    fn test_flags_override_file_values() {
        let file = RunConfig {
            exclude_apps: vec!["legacy".to_string()],
            output: PathBuf::from("from-file.svg"),
            verbosity: 3,
            ..RunConfig::default()
        };

        let cli = Cli::parse_from(["detect-cyclic", "-v", "0"]);
        let config = cli.apply(file.clone());
        assert_eq!(config.exclude_apps, vec!["legacy"]);
        assert_eq!(config.output, PathBuf::from("from-file.svg"));
        assert_eq!(config.verbosity, 0);

        let cli = Cli::parse_from(["detect-cyclic", "-e", "blog", "-f", "cli.png"]);
        let config = cli.apply(file);
        assert_eq!(config.exclude_apps, vec!["blog"]);
        assert_eq!(config.output, PathBuf::from("cli.png"));
    }

    #[test]
    fn test_incompatible_flags_parse_but_fail_validation() {
        let cli = Cli::parse_from(["detect-cyclic", "-g", "-d"]);
        let config = cli.apply(RunConfig::default());
        assert!(matches!(config.validate(), Err(ConfigError::IncompatibleScope)));
    }
}
