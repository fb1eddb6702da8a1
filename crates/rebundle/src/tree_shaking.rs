//! Reachability-based removal of unused declarations and exports
//!
//! Usage is decided per export record, so every module that re-exports a
//! record shares one verdict. A record is used when:
//! - a live import binding (one with local references) resolves to it,
//! - the entry module exposes it, since the entry's exports are the
//!   program's visible surface,
//! - a module exposes it under a non-default name and that module's
//!   namespace record is used,
//! - it is an external namespace that a used module namespace merges in
//!   through `export * from '<external>'`.
//!
//! All verdicts are computed against the untouched graph before anything is
//! removed.

use log::{debug, info, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::ecma::{
    ast::{Decl, DefaultDecl, Id, ModuleDecl, ModuleItem, Stmt},
    utils::find_pat_ids,
};

use crate::{
    module_graph::{
        BindingId, DEFAULT_EXPORT, ExportId, ExternalId, ModuleId, ModuleRef, NAMESPACE_EXPORT,
    },
    session::BundleSession,
};

/// Tree shaker that decides which bindings and export entries to remove
#[derive(Debug)]
pub struct TreeShaker<'a> {
    session: &'a BundleSession,
    /// Record → every `(module, name)` that exposes it
    exposures: FxHashMap<ExportId, Vec<(ModuleId, String)>>,
    /// Records resolved by an import binding with local references
    imported: FxHashSet<ExportId>,
    /// External → modules with a pending `export *` of it
    star_reexporters: FxHashMap<ExternalId, Vec<ModuleId>>,
    /// Memoized verdicts
    used: FxHashMap<ExportId, bool>,
    /// Bindings whose declarations should go
    unused_bindings: FxHashSet<BindingId>,
}

/// What a shake removed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShakeStats {
    pub removed_bindings: usize,
    pub removed_exports: usize,
}

impl<'a> TreeShaker<'a> {
    /// Create a tree shaker over a completed graph
    pub fn from_session(session: &'a BundleSession) -> Self {
        let mut exposures: FxHashMap<ExportId, Vec<(ModuleId, String)>> = FxHashMap::default();
        let mut imported = FxHashSet::default();
        let mut star_reexporters: FxHashMap<ExternalId, Vec<ModuleId>> = FxHashMap::default();

        for module in session.modules() {
            for (name, record) in &module.exports {
                exposures
                    .entry(*record)
                    .or_default()
                    .push((module.id, name.clone()));
            }
            for import in &module.import_bindings {
                if import.references > 0
                    && let Some(record) = import.resolved
                {
                    imported.insert(record);
                }
            }
            for star in &module.pending_star_reexports {
                star_reexporters
                    .entry(star.external)
                    .or_default()
                    .push(module.id);
            }
        }

        Self {
            session,
            exposures,
            imported,
            star_reexporters,
            used: FxHashMap::default(),
            unused_bindings: FxHashSet::default(),
        }
    }

    /// Whether anything in the program can observe `record`
    pub fn is_export_used(&mut self, record: ExportId) -> bool {
        if let Some(&used) = self.used.get(&record) {
            return used;
        }
        // Provisional verdict; the graph is acyclic, so it is never read
        self.used.insert(record, false);
        let used = self.compute_usage(record);
        self.used.insert(record, used);
        used
    }

    fn compute_usage(&mut self, record: ExportId) -> bool {
        let session = self.session;
        if self.imported.contains(&record) {
            return true;
        }

        let exposures = self.exposures.get(&record).cloned().unwrap_or_default();
        for (module, name) in exposures {
            let module = session.module(module);
            if module.is_entry {
                return true;
            }
            if name != DEFAULT_EXPORT
                && name != NAMESPACE_EXPORT
                && let Some(&namespace) = module.exports.get(NAMESPACE_EXPORT)
                && self.is_export_used(namespace)
            {
                return true;
            }
        }

        let export = session.export(record);
        if export.local_name == NAMESPACE_EXPORT
            && let ModuleRef::External(external) = export.source
        {
            let reexporters = self
                .star_reexporters
                .get(&external)
                .cloned()
                .unwrap_or_default();
            for module in reexporters {
                if let Some(&namespace) = session.module(module).exports.get(NAMESPACE_EXPORT)
                    && self.is_export_used(namespace)
                {
                    return true;
                }
            }
        }

        false
    }

    /// Decide the fate of every binding in the graph
    pub fn analyze(&mut self) {
        let session = self.session;
        for module in session.modules() {
            for &binding_id in &module.bindings {
                let binding = session.binding(binding_id);
                if binding.references == 0 {
                    trace!(
                        "{} {} in {} is never referenced",
                        binding.kind,
                        binding.name,
                        module.path.display()
                    );
                    self.unused_bindings.insert(binding_id);
                    continue;
                }
                if module.is_entry || binding.local_references() > 0 {
                    continue;
                }

                let owned: Vec<ExportId> = module
                    .exports
                    .values()
                    .copied()
                    .filter(|record| session.export(*record).owner_binding == Some(binding_id))
                    .collect();
                if !owned.is_empty() && owned.into_iter().all(|record| !self.is_export_used(record))
                {
                    trace!(
                        "{} {} in {} is only referenced by unused exports",
                        binding.kind,
                        binding.name,
                        module.path.display()
                    );
                    self.unused_bindings.insert(binding_id);
                }
            }
        }
    }

    /// Every record the program can no longer observe
    fn unused_exports(&mut self) -> FxHashSet<ExportId> {
        let session = self.session;
        let mut unused = FxHashSet::default();
        let module_records = session
            .modules()
            .filter(|module| !module.is_entry)
            .flat_map(|module| module.exports.values().copied());
        let external_records = session
            .externals()
            .flat_map(|external| external.exports.values().copied());

        for record in module_records.chain(external_records) {
            if !self.is_export_used(record) {
                unused.insert(record);
            }
        }
        unused
    }
}

/// Run tree shaking over the whole graph and apply the result
pub fn shake(session: &mut BundleSession) -> ShakeStats {
    let (unused_bindings, unused_exports) = {
        let mut shaker = TreeShaker::from_session(session);
        shaker.analyze();
        let unused_exports = shaker.unused_exports();
        (shaker.unused_bindings, unused_exports)
    };

    let removed_exports = remove_exports(session, &unused_exports);
    let mut removed_bindings = 0;

    let module_ids: Vec<ModuleId> = session.modules().map(|module| module.id).collect();
    for module_id in module_ids {
        let unused_ids: FxHashSet<Id> = session
            .module(module_id)
            .bindings
            .iter()
            .filter(|binding| unused_bindings.contains(binding))
            .map(|binding| session.binding(*binding).id.clone())
            .collect();
        if unused_ids.is_empty() {
            continue;
        }

        let body = &mut session.module_mut(module_id).ast.body;
        let removed_ids = remove_declarations(body, &unused_ids);
        for binding_id in session.module(module_id).bindings.clone() {
            let binding = session.binding_mut(binding_id);
            if removed_ids.contains(&binding.id) {
                binding.removed = true;
                removed_bindings += 1;
                debug!("Removed unused {} {}", binding.kind, binding.name);
            }
        }
    }

    info!("Tree shaking removed {removed_bindings} declarations and {removed_exports} export entries");
    ShakeStats {
        removed_bindings,
        removed_exports,
    }
}

/// Drop unused records from every export table. A dropped external
/// namespace also drops the pending `export *` entries that would have
/// merged it, except in the entry module, which re-exports them as is.
fn remove_exports(session: &mut BundleSession, unused: &FxHashSet<ExportId>) -> usize {
    let mut removed = 0;

    let module_ids: Vec<ModuleId> = session.modules().map(|module| module.id).collect();
    for module_id in &module_ids {
        let module = session.module_mut(*module_id);
        if module.is_entry {
            continue;
        }
        let before = module.exports.len();
        module.exports.retain(|_, record| !unused.contains(record));
        removed += before - module.exports.len();
    }

    let external_ids: Vec<ExternalId> = session.externals().map(|external| external.id).collect();
    for external_id in &external_ids {
        let external = session.external_mut(*external_id);
        let before = external.exports.len();
        external.exports.retain(|_, record| !unused.contains(record));
        removed += before - external.exports.len();
    }

    let namespaced: FxHashSet<ExternalId> = session
        .externals()
        .filter(|external| external.exports.contains_key(NAMESPACE_EXPORT))
        .map(|external| external.id)
        .collect();
    for module_id in module_ids {
        let module = session.module_mut(module_id);
        if !module.is_entry {
            module
                .pending_star_reexports
                .retain(|star| namespaced.contains(&star.external));
        }
    }

    removed
}

/// Remove top-level declarations whose every declared name is in `unused`,
/// returning the names actually removed. A destructuring declarator that
/// still binds a used name is kept whole.
fn remove_declarations(body: &mut Vec<ModuleItem>, unused: &FxHashSet<Id>) -> FxHashSet<Id> {
    let mut removed = FxHashSet::default();
    body.retain_mut(|item| match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => retain_decl(decl, unused, &mut removed),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
            retain_decl(&mut export.decl, unused, &mut removed)
        }
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
            let ident = match &export.decl {
                DefaultDecl::Fn(function) => function.ident.as_ref(),
                DefaultDecl::Class(class) => class.ident.as_ref(),
                DefaultDecl::TsInterfaceDecl(_) => None,
            };
            retain_ident(ident.map(|ident| ident.to_id()), unused, &mut removed)
        }
        _ => true,
    });
    removed
}

fn retain_decl(decl: &mut Decl, unused: &FxHashSet<Id>, removed: &mut FxHashSet<Id>) -> bool {
    match decl {
        Decl::Var(var) => {
            var.decls.retain(|declarator| {
                let ids: Vec<Id> = find_pat_ids(&declarator.name);
                if !ids.is_empty() && ids.iter().all(|id| unused.contains(id)) {
                    removed.extend(ids);
                    false
                } else {
                    true
                }
            });
            !var.decls.is_empty()
        }
        Decl::Fn(function) => retain_ident(Some(function.ident.to_id()), unused, removed),
        Decl::Class(class) => retain_ident(Some(class.ident.to_id()), unused, removed),
        _ => true,
    }
}

fn retain_ident(id: Option<Id>, unused: &FxHashSet<Id>, removed: &mut FxHashSet<Id>) -> bool {
    match id {
        Some(id) if unused.contains(&id) => {
            removed.insert(id);
            false
        }
        _ => true,
    }
}
