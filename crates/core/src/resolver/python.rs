//! Python import resolution using tree-sitter
//!
//! Packages and modules are located under an ordered list of source roots
//! (the first root containing a path wins). Import statements are extracted
//! from the syntax tree and resolved to absolute dotted paths.

use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser as TsParser};
use tree_sitter_python::LANGUAGE;

use super::{ImportMap, ImportResolver, Importable, Scope};
use crate::discovery;
use crate::error::ResolveError;

/// Resolves importables against Python source trees on disk
#[derive(Debug, Clone)]
pub struct PythonResolver {
    roots: Vec<PathBuf>,
}

enum Location {
    Package(PathBuf),
    Module(PathBuf),
}

impl PythonResolver {
    /// Create a resolver searching `roots` in order
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn locate(&self, dotted: &str) -> Option<Location> {
        if dotted.is_empty() {
            return None;
        }
        let segments: Vec<&str> = dotted.split('.').collect();
        let (last, parents) = segments.split_last()?;

        for root in &self.roots {
            let dir: PathBuf = segments.iter().fold(root.clone(), |p, s| p.join(s));
            if discovery::is_package_dir(&dir) {
                return Some(Location::Package(dir));
            }
            let file = parents
                .iter()
                .fold(root.clone(), |p, s| p.join(s))
                .join(format!("{}.py", last));
            if file.is_file() {
                return Some(Location::Module(file));
            }
        }
        None
    }
}

impl ImportResolver for PythonResolver {
    fn importables(&self, package: &str) -> Result<Vec<Importable>, ResolveError> {
        if package.is_empty() {
            let mut all: Vec<Importable> = Vec::new();
            for root in &self.roots {
                for child in discovery::list_children(root)? {
                    if !all.iter().any(|c| c.name == child.name) {
                        all.push(child);
                    }
                }
            }
            all.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(all);
        }

        match self.locate(package) {
            Some(Location::Package(dir)) => discovery::list_children(&dir),
            // Modules have no importable children at this granularity
            Some(Location::Module(_)) | None => Ok(Vec::new()),
        }
    }

    fn is_importable(&self, dotted: &str) -> Result<bool, ResolveError> {
        Ok(self.locate(dotted).is_some())
    }

    fn source(&self, module: &str) -> Result<String, ResolveError> {
        match self.locate(module) {
            Some(Location::Module(path)) => read_source(&path),
            // Packages contribute through their modules only
            Some(Location::Package(_)) | None => Err(ResolveError::NotFound {
                module: module.to_string(),
            }),
        }
    }

    fn imports(
        &self,
        source: &str,
        module: &str,
        scope: Scope,
    ) -> Result<ImportMap, ResolveError> {
        extract_imports(source, module, scope)
    }
}

fn read_source(path: &Path) -> Result<String, ResolveError> {
    std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract the imports of a Python module into an [`ImportMap`]
///
/// # Arguments
/// * `source` - Python source text
/// * `module` - Dotted name of the module the text belongs to, used to
///   resolve relative imports and to name the module in errors
/// * `scope` - [`Scope::Global`] skips imports inside function bodies
///
/// # Example
/// ```
/// use detect_cyclic::resolver::{extract_imports, Scope};
///
/// let imports = extract_imports("from shop.models import Product\n", "blog.views", Scope::Local).unwrap();
/// assert_eq!(imports["Product"], "shop.models.Product");
/// ```
pub fn extract_imports(source: &str, module: &str, scope: Scope) -> Result<ImportMap, ResolveError> {
    let mut parser = TsParser::new();
    parser.set_language(&LANGUAGE.into())?;

    let tree = parser.parse(source, None).ok_or_else(|| ResolveError::Parse {
        module: module.to_string(),
        details: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(ResolveError::Parse {
            module: module.to_string(),
            details: format!("invalid syntax near line {}", first_error_line(root)),
        });
    }

    let package: Vec<&str> = match module.rsplit_once('.') {
        Some((package, _)) => package.split('.').collect(),
        None => Vec::new(),
    };
    let bytes = source.as_bytes();
    let mut imports = ImportMap::new();

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => collect_import(node, bytes, &mut imports),
            "import_from_statement" => collect_import_from(node, bytes, &package, &mut imports),
            "future_import_statement" => {}
            "function_definition" if scope == Scope::Global => {}
            _ => {
                let mut cursor = node.walk();
                let mut children: Vec<Node> = node.named_children(&mut cursor).collect();
                // Pop in source order so later bindings win
                children.reverse();
                stack.extend(children);
            }
        }
    }

    Ok(imports)
}

/// `import a.b.c` and `import a.b as x`
fn collect_import(node: Node, source: &[u8], imports: &mut ImportMap) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "dotted_name" => {
                if let Some(path) = text(name, source) {
                    imports.insert(path.clone(), path);
                }
            }
            "aliased_import" => {
                let path = name.child_by_field_name("name").and_then(|n| text(n, source));
                let alias = name.child_by_field_name("alias").and_then(|n| text(n, source));
                if let (Some(path), Some(alias)) = (path, alias) {
                    imports.insert(alias, path);
                }
            }
            _ => {}
        }
    }
}

/// `from m import n [as a]`, `from m import *` and relative forms
fn collect_import_from(node: Node, source: &[u8], package: &[&str], imports: &mut ImportMap) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let base = match module_node.kind() {
        "dotted_name" => text(module_node, source),
        "relative_import" => resolve_relative(module_node, source, package),
        _ => None,
    };
    let Some(base) = base else {
        return;
    };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            imports.insert(format!("{}.*", base), base.clone());
        }
    }

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (symbol, bound) = match name.kind() {
            "dotted_name" => {
                let symbol = text(name, source);
                (symbol.clone(), symbol)
            }
            "aliased_import" => (
                name.child_by_field_name("name").and_then(|n| text(n, source)),
                name.child_by_field_name("alias").and_then(|n| text(n, source)),
            ),
            _ => (None, None),
        };
        if let (Some(symbol), Some(bound)) = (symbol, bound) {
            imports.insert(bound, join_dotted(&base, &symbol));
        }
    }
}

/// Resolve `.`/`..mod` against the importing module's package.
///
/// Returns `None` when the dots climb above the top-level package.
fn resolve_relative(node: Node, source: &[u8], package: &[&str]) -> Option<String> {
    let mut level = 0usize;
    let mut tail: Option<String> = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_prefix" => {
                level = text(child, source)
                    .map(|t| t.chars().filter(|&c| c == '.').count())
                    .unwrap_or(0);
            }
            "dotted_name" => tail = text(child, source),
            _ => {}
        }
    }

    let climb = level.checked_sub(1)?;
    if climb > package.len() {
        return None;
    }
    let mut segments: Vec<&str> = package[..package.len() - climb].to_vec();
    if let Some(tail) = tail.as_deref() {
        segments.push(tail);
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}

fn join_dotted(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn text(node: Node, source: &[u8]) -> Option<String> {
    node.utf8_text(source).ok().map(|s| s.to_string())
}

/// 1-based line of the first error or missing node
fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let mut children: Vec<Node> = node.children(&mut cursor).collect();
            children.reverse();
            stack.extend(children);
        }
    }
    root.start_position().row + 1
}
