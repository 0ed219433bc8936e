//! Package tree discovery with gitignore-aware filtering
//!
//! Lists the direct children of a Python package directory and matches
//! sub-package names against the excluded-package patterns.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::Path;

use crate::error::ResolveError;
use crate::resolver::Importable;

const INIT_FILE: &str = "__init__.py";

/// True when `dir` is a regular Python package (has an `__init__.py`)
pub fn is_package_dir(dir: &Path) -> bool {
    dir.join(INIT_FILE).is_file()
}

/// List the packages and modules directly inside `dir`
///
/// # Returns
/// Children sorted by name. Sub-directories without `__init__.py`, hidden
/// entries, gitignored entries and files that are not importable module
/// names are left out. `__init__.py` itself is not listed.
///
/// # Example
/// ```no_run
/// use detect_cyclic::discovery;
///
/// let children = discovery::list_children(std::path::Path::new("src/shop")).unwrap();
/// for child in &children {
///     println!("{} ({:?})", child.name, child.kind);
/// }
/// ```
pub fn list_children(dir: &Path) -> Result<Vec<Importable>, ResolveError> {
    let mut children = Vec::new();

    for result in build_walker(dir) {
        let entry = result.map_err(|source| ResolveError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        // Depth 0 is `dir` itself
        if entry.depth() == 0 {
            continue;
        }
        let Some(ft) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if ft.is_dir() {
            if let Some(name) = importable_name(path.file_name().and_then(|n| n.to_str())) {
                if is_package_dir(path) {
                    children.push(Importable::package(name));
                }
            }
        } else if ft.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some("py")
            && path.file_name().and_then(|n| n.to_str()) != Some(INIT_FILE)
        {
            if let Some(name) = importable_name(path.file_stem().and_then(|n| n.to_str())) {
                children.push(Importable::module(name));
            }
        }
    }

    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}

/// Names containing dots or dashes cannot be imported
fn importable_name(name: Option<&str>) -> Option<&str> {
    name.filter(|n| {
        !n.is_empty()
            && !n.starts_with(|c: char| c.is_ascii_digit())
            && n.chars().all(|c| c == '_' || c.is_alphanumeric())
    })
}

/// Build a one-level WalkBuilder with proper ignore configuration
fn build_walker(root: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);
    builder
        .max_depth(Some(1))
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .hidden(true)
        .parents(true) // Also check parent directories for .gitignore
        .sort_by_file_name(|a, b| a.cmp(b));

    builder.build()
}

/// Glob patterns naming sub-packages to skip during traversal
///
/// Patterns match the immediate package name only (`migrations`, `test*`).
#[derive(Debug, Clone)]
pub struct PackageFilter {
    matcher: GlobSet,
}

impl PackageFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        Ok(Self {
            matcher: build_glob_matcher(patterns)?,
        })
    }

    pub fn is_excluded(&self, package_name: &str) -> bool {
        self.matcher.is_match(package_name)
    }
}

impl Default for PackageFilter {
    fn default() -> Self {
        Self {
            matcher: GlobSet::empty(),
        }
    }
}

/// Build a glob matcher from the provided patterns
fn build_glob_matcher<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    builder.build()
}
