//! Importable resolution: what a package contains and what a module imports.
//!
//! The graph builder only talks to the [`ImportResolver`] trait. The bundled
//! [`PythonResolver`] answers from Python source trees on disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ResolveError;

pub mod python;

pub use python::{extract_imports, PythonResolver};

/// Which imports are visible to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every import, including those inside function bodies
    #[default]
    Local,
    /// Only imports executed when the module is loaded
    Global,
}

/// Whether a child of a package is itself a package or a leaf module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportableKind {
    Package,
    Module,
}

/// A direct child of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Importable {
    pub name: String,
    pub kind: ImportableKind,
}

impl Importable {
    pub fn package(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ImportableKind::Package,
        }
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ImportableKind::Module,
        }
    }
}

/// Bound name to the dotted path it refers to.
///
/// `from shop.models import Product` yields `Product -> shop.models.Product`.
pub type ImportMap = BTreeMap<String, String>;

/// Source introspection used by the graph builder.
///
/// All methods are blocking. Errors are reported by the caller and never
/// abort a run.
pub trait ImportResolver {
    /// List the direct children of a dotted package path.
    ///
    /// The empty path lists the top level of the source tree.
    fn importables(&self, package: &str) -> Result<Vec<Importable>, ResolveError>;

    /// True when the dotted path names an existing package or module
    fn is_importable(&self, dotted: &str) -> Result<bool, ResolveError>;

    /// Raw source text of a module
    fn source(&self, module: &str) -> Result<String, ResolveError>;

    /// Imports found in `source`, which is the text of `module`.
    ///
    /// `module` anchors relative imports. Syntax errors are reported as
    /// [`ResolveError::Parse`].
    fn imports(&self, source: &str, module: &str, scope: Scope)
        -> Result<ImportMap, ResolveError>;
}

/// True when `path` is `prefix` or lies below it (`shop` covers `shop.models`,
/// not `shopping`).
pub fn is_dotted_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
