//! Specifier classification and relative path resolution.
//!
//! Only the file system question lives here; turning a resolved path into a
//! [`Module`](crate::module_graph::Module) is the graph builder's job.

use std::path::{Path, PathBuf};

use log::{trace, warn};

use crate::error::{BundleError, BundleResult};

/// How a specifier is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Starts with `.` or `/`; resolved against the importer's directory
    Relative,
    /// Anything else; becomes an external module
    Bare,
}

pub fn classify_specifier(specifier: &str) -> SpecifierKind {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        SpecifierKind::Relative
    } else {
        SpecifierKind::Bare
    }
}

/// Resolves relative specifiers to canonical file paths
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Extensions tried, in order, after the literal path
    extensions: Vec<String>,
}

impl ModuleResolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Resolve `specifier` as written in `importer`.
    ///
    /// The literal path wins; otherwise each configured extension is appended
    /// in turn. A specifier that matches no file is a `ModuleNotFound` error.
    pub fn resolve_relative(&self, importer: &Path, specifier: &str) -> BundleResult<PathBuf> {
        let base_dir = importer.parent().unwrap_or_else(|| Path::new(""));
        let joined = base_dir.join(specifier);

        if joined.is_file() {
            trace!("Resolved {specifier} to {}", joined.display());
            return Ok(canonicalize_path(joined));
        }

        for extension in &self.extensions {
            let mut candidate = joined.clone().into_os_string();
            candidate.push(extension);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                trace!(
                    "Resolved {specifier} to {} by appending {extension}",
                    candidate.display()
                );
                return Ok(canonicalize_path(candidate));
            }
        }

        Err(BundleError::ModuleNotFound {
            importer: importer.to_path_buf(),
            specifier: specifier.to_owned(),
        })
    }
}

/// Canonicalize a path, falling back to the path itself when that fails
pub fn canonicalize_path(path: PathBuf) -> PathBuf {
    match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) => {
            warn!("Failed to canonicalize path {}: {}", path.display(), e);
            path
        }
    }
}
