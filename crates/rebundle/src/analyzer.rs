//! Export/import binding analysis
//!
//! Runs once per module, right after its dependencies were stored in the
//! session, and fills in the module's bindings, import table, export table
//! and pending external star re-exports. Re-export chains are followed
//! eagerly: every entry of a module's export table points at the record of
//! the innermost binding or external origin, never at another entry.
//!
//! Statements are processed in three passes so that source order does not
//! matter: `export *` first (a dependency's merged entries are overridden by
//! local exports of the same name), then imports, then every other export.

use log::{debug, trace};
use rustc_hash::FxHashMap;
use swc_core::ecma::{
    ast::{
        Decl, DefaultDecl, ExportAll, ExportDecl, ExportDefaultDecl, ExportDefaultExpr,
        ExportSpecifier, Expr, Id, ImportDecl, ImportSpecifier, ModuleDecl, ModuleExportName,
        ModuleItem, NamedExport,
    },
    utils::find_pat_ids,
};

use crate::{
    error::Warning,
    module_graph::{
        Binding, BindingId, DEFAULT_EXPORT, ExportId, ExportRecord, ExternalId, ImportBinding,
        Module, ModuleId, ModuleRef, NAMESPACE_EXPORT, StarReexport,
    },
    session::BundleSession,
    util::{make_legal, module_identifier_name},
    visitors::{DeclarationCollector, UsageCollector},
};

/// Analyzes one module against the already completed graph
pub struct ModuleAnalyzer<'a> {
    session: &'a mut BundleSession,
    module: &'a mut Module,
    /// Module-scope declaration → binding
    locals: FxHashMap<Id, BindingId>,
}

impl<'a> ModuleAnalyzer<'a> {
    /// Populate `module`'s tables. The module must not be stored in the
    /// session yet; all of its internal dependencies must be.
    pub fn analyze(session: &'a mut BundleSession, module: &'a mut Module) {
        let mut analyzer = Self {
            session,
            module,
            locals: FxHashMap::default(),
        };
        analyzer.collect_bindings();

        let body = std::mem::take(&mut analyzer.module.ast.body);
        let declarations = body.iter().filter_map(|item| match item {
            ModuleItem::ModuleDecl(decl) => Some(decl),
            ModuleItem::Stmt(_) => None,
        });

        for decl in declarations.clone() {
            if let ModuleDecl::ExportAll(export_all) = decl {
                analyzer.analyze_export_all(export_all);
            }
        }
        for decl in declarations.clone() {
            if let ModuleDecl::Import(import) = decl {
                analyzer.analyze_import(import);
            }
        }
        for decl in declarations {
            match decl {
                ModuleDecl::ExportDecl(export) => analyzer.analyze_export_decl(export),
                ModuleDecl::ExportNamed(named) if named.src.is_some() => {
                    analyzer.analyze_reexport(named);
                }
                ModuleDecl::ExportNamed(named) => analyzer.analyze_local_export(named),
                ModuleDecl::ExportDefaultDecl(default) => analyzer.analyze_default_decl(default),
                ModuleDecl::ExportDefaultExpr(default) => analyzer.analyze_default_expr(default),
                _ => {}
            }
        }

        analyzer.module.ast.body = body;
        debug!(
            "Analyzed {}: {} bindings, {} imports, {} exports, {} pending star re-exports",
            analyzer.module.path.display(),
            analyzer.module.bindings.len(),
            analyzer.module.import_bindings.len(),
            analyzer.module.exports.len(),
            analyzer.module.pending_star_reexports.len()
        );
    }

    fn collect_bindings(&mut self) {
        let top_level_ctxt = self.module.top_level_ctxt;
        let usage = UsageCollector::analyze(&self.module.ast, top_level_ctxt);

        for declared in DeclarationCollector::analyze(&self.module.ast, top_level_ctxt) {
            let counts = usage.get(&declared.id).copied().unwrap_or_default();
            let binding = self.session.add_binding(Binding {
                name: declared.id.0.to_string(),
                id: declared.id.clone(),
                module: self.module.id,
                kind: declared.kind,
                references: counts.references,
                export_references: counts.export_references,
                reassignments: counts.reassignments,
                removed: false,
            });
            self.module.bindings.push(binding);
            self.locals.insert(declared.id, binding);
        }

        self.module.usage = usage;
    }

    fn target(&self, specifier: &str) -> Option<ModuleRef> {
        self.module.dependencies.get(specifier).copied()
    }

    fn analyze_export_all(&mut self, export_all: &ExportAll) {
        let specifier = export_all.src.value.to_string();
        let Some(target) = self.target(&specifier) else {
            return;
        };

        match target {
            ModuleRef::Internal(dependency) => {
                let dependency = self.session.module(dependency);
                for (name, record) in &dependency.exports {
                    if name != DEFAULT_EXPORT && name != NAMESPACE_EXPORT {
                        self.module.exports.insert(name.clone(), *record);
                    }
                }
                for star in &dependency.pending_star_reexports {
                    if !self.module.pending_star_reexports.contains(star) {
                        self.module.pending_star_reexports.push(star.clone());
                    }
                }
            }
            ModuleRef::External(external) => {
                let star = StarReexport {
                    specifier,
                    external,
                };
                if !self.module.pending_star_reexports.contains(&star) {
                    self.module.pending_star_reexports.push(star);
                }
            }
        }
    }

    fn analyze_import(&mut self, import: &ImportDecl) {
        let specifier = import.src.value.to_string();
        let Some(target) = self.target(&specifier) else {
            return;
        };

        for import_specifier in &import.specifiers {
            let (imported_name, local) = match import_specifier {
                ImportSpecifier::Named(named) => (
                    named
                        .imported
                        .as_ref()
                        .map_or_else(|| named.local.sym.to_string(), export_name),
                    &named.local,
                ),
                ImportSpecifier::Default(default) => (DEFAULT_EXPORT.to_owned(), &default.local),
                ImportSpecifier::Namespace(namespace) => {
                    (NAMESPACE_EXPORT.to_owned(), &namespace.local)
                }
            };

            let local = local.to_id();
            let resolved = self.resolve(target, &specifier, &imported_name, &local.0);
            let references = self
                .module
                .usage
                .get(&local)
                .map_or(0, |usage| usage.local_references());
            trace!(
                "{}: import {imported_name} from {specifier} as {} ({references} references)",
                self.module.path.display(),
                local.0
            );
            self.module.import_bindings.push(ImportBinding {
                imported_name,
                source_specifier: specifier.clone(),
                local,
                target,
                resolved,
                references,
            });
        }
    }

    /// Resolve `name` in `target`; a name the target cannot provide is
    /// reported and resolves to nothing
    fn resolve(
        &mut self,
        target: ModuleRef,
        specifier: &str,
        name: &str,
        preferred_identifier: &str,
    ) -> Option<ExportId> {
        let resolved = match target {
            ModuleRef::Internal(dependency) if name == NAMESPACE_EXPORT => Some(namespace_record(
                self.session,
                dependency,
                preferred_identifier,
            )),
            ModuleRef::Internal(dependency) => {
                resolve_internal_export(self.session, dependency, name, preferred_identifier)
            }
            ModuleRef::External(external) => Some(external_record(
                self.session,
                external,
                name,
                preferred_identifier,
                None,
            )),
        };

        if resolved.is_none() {
            self.session.report(Warning::MissingExport {
                importer: self.module.path.clone(),
                specifier: specifier.to_owned(),
                name: name.to_owned(),
            });
        }
        resolved
    }

    fn export_binding(&mut self, exported: String, binding: BindingId) {
        let owner = self.session.binding(binding);
        let record = ExportRecord {
            local_name: owner.original_name().to_owned(),
            identifier_name: owner.name.clone(),
            source: ModuleRef::Internal(self.module.id),
            owner_binding: Some(binding),
            exported_from: None,
        };
        let id = self.session.add_export(record);
        self.module.exports.insert(exported, id);
    }

    fn export_anonymous_default(&mut self) {
        let id = self.session.add_export(ExportRecord {
            local_name: DEFAULT_EXPORT.to_owned(),
            identifier_name: module_identifier_name(&self.module.path),
            source: ModuleRef::Internal(self.module.id),
            owner_binding: None,
            exported_from: None,
        });
        self.module.exports.insert(DEFAULT_EXPORT.to_owned(), id);
        self.module.anonymous_default = Some(id);
    }

    fn analyze_export_decl(&mut self, export: &ExportDecl) {
        let ids: Vec<Id> = match &export.decl {
            Decl::Var(var) => var
                .decls
                .iter()
                .flat_map(|declarator| find_pat_ids::<_, Id>(&declarator.name))
                .collect(),
            Decl::Fn(function) => vec![function.ident.to_id()],
            Decl::Class(class) => vec![class.ident.to_id()],
            _ => Vec::new(),
        };

        for id in ids {
            if let Some(binding) = self.locals.get(&id).copied() {
                self.export_binding(id.0.to_string(), binding);
            }
        }
    }

    /// `export { a, b as c }`
    fn analyze_local_export(&mut self, named: &NamedExport) {
        for specifier in &named.specifiers {
            let ExportSpecifier::Named(specifier) = specifier else {
                continue;
            };
            let ModuleExportName::Ident(orig) = &specifier.orig else {
                continue;
            };
            let exported = specifier
                .exported
                .as_ref()
                .map_or_else(|| orig.sym.to_string(), export_name);
            self.export_local(exported, &orig.to_id());
        }
    }

    /// Export a module-scope name: a binding gets its own record, an import
    /// binding re-publishes the record it resolved to
    fn export_local(&mut self, exported: String, local: &Id) {
        if let Some(binding) = self.locals.get(local).copied() {
            self.export_binding(exported, binding);
        } else if let Some(import) = self.module.import_binding(local) {
            if let Some(record) = import.resolved {
                self.module.exports.insert(exported, record);
            }
        } else {
            debug!(
                "{}: ignoring export of undeclared name {}",
                self.module.path.display(),
                local.0
            );
        }
    }

    /// `export { a, b as c, default } from './m'`, `export * as ns from './m'`
    fn analyze_reexport(&mut self, named: &NamedExport) {
        let Some(src) = &named.src else {
            return;
        };
        let specifier = src.value.to_string();
        let Some(target) = self.target(&specifier) else {
            return;
        };

        for export_specifier in &named.specifiers {
            let (imported, exported) = match export_specifier {
                ExportSpecifier::Named(named) => {
                    let imported = export_name(&named.orig);
                    let exported = named
                        .exported
                        .as_ref()
                        .map_or_else(|| imported.clone(), export_name);
                    (imported, exported)
                }
                ExportSpecifier::Namespace(namespace) => {
                    (NAMESPACE_EXPORT.to_owned(), export_name(&namespace.name))
                }
                ExportSpecifier::Default(default) => {
                    (DEFAULT_EXPORT.to_owned(), default.exported.sym.to_string())
                }
            };

            let preferred = make_legal(&exported);
            if let Some(record) = self.resolve(target, &specifier, &imported, &preferred) {
                self.module.exports.insert(exported, record);
            }
        }
    }

    fn analyze_default_decl(&mut self, default: &ExportDefaultDecl) {
        let ident = match &default.decl {
            DefaultDecl::Fn(function) => function.ident.as_ref(),
            DefaultDecl::Class(class) => class.ident.as_ref(),
            DefaultDecl::TsInterfaceDecl(_) => return,
        };

        match ident.and_then(|ident| self.locals.get(&ident.to_id()).copied()) {
            Some(binding) => self.export_binding(DEFAULT_EXPORT.to_owned(), binding),
            None => self.export_anonymous_default(),
        }
    }

    /// `export default <expr>` aliases a binding only when the expression is
    /// a bare identifier that is never reassigned
    fn analyze_default_expr(&mut self, default: &ExportDefaultExpr) {
        let Expr::Ident(ident) = &*default.expr else {
            self.export_anonymous_default();
            return;
        };
        let local = ident.to_id();

        if let Some(binding) = self.locals.get(&local).copied() {
            if self.session.binding(binding).reassignments == 0 {
                self.export_binding(DEFAULT_EXPORT.to_owned(), binding);
            } else {
                self.export_anonymous_default();
            }
        } else if let Some(record) = self
            .module
            .import_binding(&local)
            .and_then(|import| import.resolved)
        {
            self.module.exports.insert(DEFAULT_EXPORT.to_owned(), record);
        } else {
            self.export_anonymous_default();
        }
    }
}

/// Text of an export name, identifier or string literal
pub fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(string) => string.value.to_string(),
    }
}

/// Get or create the record for `name` on an external module.
///
/// The first caller decides the record's identifier.
pub fn external_record(
    session: &mut BundleSession,
    external: ExternalId,
    name: &str,
    preferred_identifier: &str,
    exported_from: Option<&str>,
) -> ExportId {
    if let Some(id) = session.external(external).exports.get(name) {
        return *id;
    }
    let id = session.add_export(ExportRecord {
        local_name: name.to_owned(),
        identifier_name: make_legal(preferred_identifier),
        source: ModuleRef::External(external),
        owner_binding: None,
        exported_from: exported_from.map(str::to_owned),
    });
    session
        .external_mut(external)
        .exports
        .insert(name.to_owned(), id);
    id
}

/// Get or create the `'*'` record of an internal module.
///
/// The namespace object merges in every pending external star re-export of
/// the module, so those externals get a `'*'` record too.
pub fn namespace_record(
    session: &mut BundleSession,
    module: ModuleId,
    preferred_identifier: &str,
) -> ExportId {
    if let Some(id) = session.module(module).exports.get(NAMESPACE_EXPORT) {
        return *id;
    }
    let id = session.add_export(ExportRecord {
        local_name: NAMESPACE_EXPORT.to_owned(),
        identifier_name: make_legal(preferred_identifier),
        source: ModuleRef::Internal(module),
        owner_binding: None,
        exported_from: None,
    });
    session
        .module_mut(module)
        .exports
        .insert(NAMESPACE_EXPORT.to_owned(), id);

    for star in session.module(module).pending_star_reexports.clone() {
        external_record(
            session,
            star.external,
            NAMESPACE_EXPORT,
            &star.specifier,
            None,
        );
    }
    id
}

/// Look `name` up in an internal module's export table, falling back to its
/// pending external star re-exports
pub fn resolve_internal_export(
    session: &mut BundleSession,
    module: ModuleId,
    name: &str,
    preferred_identifier: &str,
) -> Option<ExportId> {
    if let Some(id) = session.module(module).exports.get(name) {
        return Some(*id);
    }
    if name == DEFAULT_EXPORT {
        return None;
    }
    resolve_star_export(session, module, name, preferred_identifier)
}

/// Pick the external that supplies `name` through `export *`.
///
/// An external already known to export the name wins. Otherwise the first
/// declared source is used, and a choice between several candidates is
/// reported as ambiguous. The resolved entry is added to the module's export
/// table so later importers agree on it.
fn resolve_star_export(
    session: &mut BundleSession,
    module: ModuleId,
    name: &str,
    preferred_identifier: &str,
) -> Option<ExportId> {
    let stars = session.module(module).pending_star_reexports.clone();
    let providers: Vec<&StarReexport> = stars
        .iter()
        .filter(|star| session.external(star.external).exports.contains_key(name))
        .collect();

    let candidates = if providers.is_empty() {
        stars.iter().collect()
    } else {
        providers
    };
    let chosen = *candidates.first()?;

    if candidates.len() > 1 {
        session.report(Warning::AmbiguousStarExport {
            module: session.module(module).path.clone(),
            name: name.to_owned(),
            sources: candidates
                .iter()
                .map(|star| star.specifier.clone())
                .collect(),
            chosen: chosen.specifier.clone(),
        });
    }

    let id = external_record(
        session,
        chosen.external,
        name,
        preferred_identifier,
        Some(&chosen.specifier),
    );
    session
        .module_mut(module)
        .exports
        .insert(name.to_owned(), id);
    trace!(
        "Resolved {name} of {} through export * from {}",
        session.module(module).path.display(),
        chosen.specifier
    );
    Some(id)
}
