//! Module graph construction
//!
//! Depth-first descent from the entry module. A module's dependencies are
//! loaded, analyzed and stored before the module itself is analyzed, so the
//! analyzer can always resolve re-exports against finished export tables.
//! Relative specifiers become internal modules deduplicated by canonical
//! path; bare specifiers become external modules keyed by their text.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use swc_core::ecma::ast::{Module as SwcModule, ModuleDecl, ModuleItem};

use crate::{
    analyzer::ModuleAnalyzer,
    error::{BundleError, BundleResult},
    module_graph::{FxIndexMap, FxIndexSet, Module, ModuleId, ModuleRef},
    resolver::{ModuleResolver, SpecifierKind, canonicalize_path, classify_specifier},
    session::BundleSession,
    syntax::parse_module,
};

/// Builds the module graph of one bundle run into a session
pub struct GraphBuilder<'a> {
    session: &'a mut BundleSession,
    resolver: ModuleResolver,
    /// Modules whose construction has started but not finished, entry first
    in_progress: FxIndexSet<PathBuf>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(session: &'a mut BundleSession) -> Self {
        let resolver = ModuleResolver::new(session.options().extensions.clone());
        Self {
            session,
            resolver,
            in_progress: FxIndexSet::default(),
        }
    }

    /// Load the entry module and, transitively, everything it depends on
    pub fn build(mut self, entry: &Path) -> BundleResult<ModuleId> {
        let entry = canonicalize_path(entry.to_path_buf());
        debug!("Building module graph from {}", entry.display());
        let id = self.load(entry, true)?;
        debug!(
            "Module graph complete: {} modules, {} externals",
            self.session.module_count(),
            self.session.externals().count()
        );
        Ok(id)
    }

    fn load(&mut self, path: PathBuf, is_entry: bool) -> BundleResult<ModuleId> {
        if let Some(id) = self.session.module_by_path(&path) {
            trace!("Reusing {}", path.display());
            return Ok(id);
        }
        if self.in_progress.contains(&path) {
            let mut chain: Vec<PathBuf> = self.in_progress.iter().cloned().collect();
            chain.push(path);
            return Err(BundleError::CircularDependency { chain });
        }

        trace!("Loading {}", path.display());
        self.in_progress.insert(path.clone());

        let source = fs::read_to_string(&path).map_err(|source| BundleError::Io {
            path: path.clone(),
            source,
        })?;
        let source_len = source.len();
        let parsed = parse_module(self.session, &path, source)?;

        let mut dependencies = FxIndexMap::default();
        for specifier in module_specifiers(&parsed.ast) {
            if dependencies.contains_key(&specifier) {
                continue;
            }
            let target = match classify_specifier(&specifier) {
                SpecifierKind::Relative => {
                    let resolved = self.resolver.resolve_relative(&path, &specifier)?;
                    ModuleRef::Internal(self.load(resolved, false)?)
                }
                SpecifierKind::Bare => {
                    ModuleRef::External(self.session.intern_external(&specifier))
                }
            };
            dependencies.insert(specifier, target);
        }

        let id = self.session.next_module_id();
        for target in dependencies.values() {
            match *target {
                ModuleRef::Internal(dependency) => {
                    self.session.module_mut(dependency).dependents.insert(id);
                }
                ModuleRef::External(external) => {
                    self.session.external_mut(external).dependents.insert(id);
                }
            }
        }

        let mut module = Module::new(
            id,
            path.clone(),
            is_entry,
            source_len,
            parsed.ast,
            parsed.top_level_ctxt,
            parsed.unresolved_ctxt,
        );
        module.dependencies = dependencies;
        ModuleAnalyzer::analyze(self.session, &mut module);

        self.in_progress.shift_remove(&path);
        Ok(self.session.insert_module(module))
    }
}

/// Source specifiers of `import`, `export ... from` and `export * from`
/// statements, in source order
fn module_specifiers(module: &SwcModule) -> Vec<String> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(&import.src),
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => named.src.as_ref(),
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export_all)) => Some(&export_all.src),
            _ => None,
        })
        .map(|src| src.value.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::config::BundleOptions;

    fn write(dir: &Path, name: &str, source: &str) {
        fs::write(dir.join(name), source).expect("failed to write");
    }

    #[test]
    fn test_shared_dependency_is_loaded_once() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path();
        write(root, "index.js", "import './b.js';\nimport './c';\n");
        write(root, "b.js", "import { s } from './shared.js';\nexport * from 'pkg';\n");
        write(root, "c.js", "import { s } from './shared';\nimport 'pkg';\n");
        write(root, "shared.js", "export const s = 1;\n");

        let mut session = BundleSession::new(BundleOptions::default());
        let entry = GraphBuilder::new(&mut session)
            .build(&root.join("index.js"))
            .expect("graph should build");

        assert_eq!(session.module_count(), 4);
        assert_eq!(session.entry(), Some(entry));
        assert!(session.module(entry).is_entry);

        let shared = session
            .module_by_path(&root.canonicalize().expect("canonical root").join("shared.js"))
            .expect("shared.js is in the graph");
        assert_eq!(session.module(shared).dependents.len(), 2);

        let pkg = session.external_by_specifier("pkg").expect("pkg is external");
        assert_eq!(session.external(pkg).dependents.len(), 2);
    }

    #[test]
    fn test_cycle_reports_chain_from_entry() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path();
        write(root, "a.js", "import './b.js';\n");
        write(root, "b.js", "import './c.js';\n");
        write(root, "c.js", "import './a.js';\n");

        let mut session = BundleSession::new(BundleOptions::default());
        let error = GraphBuilder::new(&mut session)
            .build(&root.join("a.js"))
            .expect_err("cycle must fail");

        let root = root.canonicalize().expect("canonical root");
        match error {
            BundleError::CircularDependency { chain } => assert_eq!(
                chain,
                vec![
                    root.join("a.js"),
                    root.join("b.js"),
                    root.join("c.js"),
                    root.join("a.js"),
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_entry_is_io_error() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut session = BundleSession::new(BundleOptions::default());
        let error = GraphBuilder::new(&mut session)
            .build(&dir.path().join("missing.js"))
            .expect_err("missing entry must fail");
        assert!(matches!(error, BundleError::Io { .. }), "got: {error}");
    }
}
