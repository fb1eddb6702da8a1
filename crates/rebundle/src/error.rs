//! Fatal errors and non-fatal diagnostics produced while bundling.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Result alias used by every bundling phase
pub type BundleResult<T> = Result<T, BundleError>;

/// A failure that aborts the whole bundle run
#[derive(Debug, Error)]
pub enum BundleError {
    /// Source text could not be parsed as an ES module
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A relative specifier did not resolve to an existing file
    #[error("Could not resolve module {specifier} from {}", importer.display())]
    ModuleNotFound { importer: PathBuf, specifier: String },

    /// The module graph contains a cycle; `chain` starts at the entry module
    /// and ends with the repeated module
    #[error("Circular dependency detected: {}", format_chain(chain))]
    CircularDependency { chain: Vec<PathBuf> },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to generate bundle output: {source}")]
    Codegen {
        #[source]
        source: std::io::Error,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A non-fatal diagnostic returned next to the bundle text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Several external `export *` sources could supply the same name;
    /// the first declared source was used
    AmbiguousStarExport {
        module: PathBuf,
        name: String,
        sources: Vec<String>,
        chosen: String,
    },
    /// An import asked a module for a name it does not export
    MissingExport {
        importer: PathBuf,
        specifier: String,
        name: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousStarExport {
                module,
                name,
                sources,
                chosen,
            } => write!(
                f,
                "Ambiguous external star export: \"{name}\" in {} could come from {}; using \"{chosen}\"",
                module.display(),
                sources
                    .iter()
                    .map(|source| format!("\"{source}\""))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::MissingExport {
                importer,
                specifier,
                name,
            } => write!(
                f,
                "\"{name}\" is not exported by {specifier}, imported by {}",
                importer.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_chain() {
        let error = BundleError::CircularDependency {
            chain: vec![
                PathBuf::from("/p/a.js"),
                PathBuf::from("/p/b.js"),
                PathBuf::from("/p/a.js"),
            ],
        };
        assert_eq!(
            error.to_string(),
            "Circular dependency detected: /p/a.js -> /p/b.js -> /p/a.js"
        );
    }

    #[test]
    fn test_ambiguous_star_export_names_every_source() {
        let warning = Warning::AmbiguousStarExport {
            module: PathBuf::from("/p/reexports.js"),
            name: "shared".into(),
            sources: vec!["pkgA".into(), "pkgB".into()],
            chosen: "pkgA".into(),
        };
        let text = warning.to_string();
        assert!(text.contains("\"pkgA\", \"pkgB\""), "got: {text}");
        assert!(text.contains("using \"pkgA\""), "got: {text}");
    }
}
