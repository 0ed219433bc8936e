//! Run configuration.
//!
//! Loaded from a `detect-cyclic.toml` file when present; the CLI layers its
//! flags on top. Validation runs before any graph work.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::filters::Filters;
use crate::report::Verbosity;
use crate::resolver::Scope;

pub const CONFIG_FILENAME: &str = "detect-cyclic.toml";
pub const DEFAULT_OUTPUT: &str = "detect.svg";

/// Output formats that carry node colors natively
const COLOR_FORMATS: &[&str] = &["svg"];

/// Every option of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directories searched for packages, in order
    pub source_roots: Vec<PathBuf>,
    /// Registered applications; discovered from the source roots when empty
    pub applications: Vec<String>,
    pub include_apps: Vec<String>,
    pub exclude_apps: Vec<String>,
    /// Glob patterns of sub-package names skipped during traversal
    pub exclude_packages: Vec<String>,
    /// Module-granularity graph instead of one node per application
    pub show_modules: bool,
    pub remove_isolate_nodes: bool,
    pub remove_sink_nodes: bool,
    pub remove_source_nodes: bool,
    pub only_cyclic: bool,
    pub scope: Scope,
    /// Draw imports only reachable in local scope with a dotted line
    pub dotted_scope_local: bool,
    pub force_colors: bool,
    /// Diagram file; the extension selects the format
    pub output: PathBuf,
    pub verbosity: u8,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source_roots: vec![PathBuf::from(".")],
            applications: Vec::new(),
            include_apps: Vec::new(),
            exclude_apps: Vec::new(),
            exclude_packages: Vec::new(),
            show_modules: false,
            remove_isolate_nodes: false,
            remove_sink_nodes: false,
            remove_source_nodes: false,
            only_cyclic: false,
            scope: Scope::Local,
            dotted_scope_local: false,
            force_colors: false,
            output: PathBuf::from(DEFAULT_OUTPUT),
            verbosity: Verbosity::default().0,
        }
    }
}

impl RunConfig {
    /// Load a config file from an explicit path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    /// Load `detect-cyclic.toml` from `dir` if it exists
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Reject option combinations that cannot be honored
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dotted_scope_local && self.scope == Scope::Global {
            return Err(ConfigError::IncompatibleScope);
        }
        Ok(())
    }

    /// Effective post-processing filters; `only_cyclic` implies isolated removal
    pub fn filters(&self) -> Filters {
        Filters {
            isolated: self.remove_isolate_nodes || self.only_cyclic,
            sinks: self.remove_sink_nodes,
            sources: self.remove_source_nodes,
            non_cyclic: self.only_cyclic,
        }
    }

    /// Node coloring applies when forced or when the format supports it
    pub fn use_colors(&self) -> bool {
        self.force_colors
            || self
                .output
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| COLOR_FORMATS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity(self.verbosity)
    }

    /// Narrow the registered applications with the include and exclude lists.
    ///
    /// Registration order is kept; it decides which application claims an
    /// import in application-granularity mode.
    pub fn select_applications(&self, registered: &[String]) -> Vec<String> {
        registered
            .iter()
            .filter(|app| self.include_apps.is_empty() || self.include_apps.contains(app))
            .filter(|app| !self.exclude_apps.contains(app))
            .cloned()
            .collect()
    }
}
