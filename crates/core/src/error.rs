//! Typed errors for configuration and import resolution.
//!
//! Everything else flows through `anyhow::Result`; these variants exist where
//! callers need to tell failures apart (the CLI exit code, the builder's
//! skip-and-continue handling of unparsable modules).

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration. Raised before any graph work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the dotted-scope-local and scope-global options are incompatible")]
    IncompatibleScope,

    #[error("no applications to analyze (check include/exclude lists and source roots)")]
    NoApplications,

    #[error("invalid exclude-packages pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {details}")]
    Parse { path: PathBuf, details: String },
}

/// Failure reported by an [`ImportResolver`](crate::resolver::ImportResolver).
///
/// The builder treats every variant as non-fatal: it logs and skips the
/// module (or import) that triggered it.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("syntax error in {module}: {details}")]
    Parse { module: String, details: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("no module named {module}")]
    NotFound { module: String },

    #[error("failed to load the Python grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::IncompatibleScope;
        assert!(err.to_string().contains("incompatible"));

        let err = ConfigError::Parse {
            path: PathBuf::from("detect-cyclic.toml"),
            details: "expected `=`".to_string(),
        };
        assert!(err.to_string().contains("detect-cyclic.toml"));
    }

    #[test]
    fn test_parse_error_names_module() {
        let err = ResolveError::Parse {
            module: "blog.views".to_string(),
            details: "line 3".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error in blog.views: line 3");
    }
}
