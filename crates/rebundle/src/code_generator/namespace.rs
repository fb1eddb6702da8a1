//! Namespace object synthesis
//!
//! A module whose `'*'` record survived gets a frozen object of its named
//! exports. When the module also re-exports externals through `export *`,
//! the external namespaces are merged in at runtime by a small helper,
//! because their key sets are unknown at bundle time.

use std::path::Path;

use swc_core::ecma::ast::{Expr, ModuleItem, Stmt};

use crate::{
    ast_builder::{array_lit, call, const_decl, ident, member, object_lit},
    error::BundleResult,
    module_graph::{DEFAULT_EXPORT, ExportId, ModuleId, NAMESPACE_EXPORT},
    session::BundleSession,
    syntax::parse_es_module,
};

/// Name of the runtime helper merging external namespaces
pub const MERGE_NAMESPACES_HELPER: &str = "_mergeNamespaces";

/// Copies every key of each source namespace that `n` lacks, skipping
/// `default`, then freezes `n`. The first source claiming a key wins.
const MERGE_NAMESPACES_SOURCE: &str = r"function _mergeNamespaces(n, m) {
    m.forEach(function (e) {
        e && typeof e !== 'string' && !Array.isArray(e) && Object.keys(e).forEach(function (k) {
            if (k !== 'default' && !(k in n)) {
                var d = Object.getOwnPropertyDescriptor(e, k);
                Object.defineProperty(n, k, d.get ? d : {
                    enumerable: true,
                    get: function () { return e[k]; }
                });
            }
        });
    });
    return Object.freeze(n);
}
";

/// External `'*'` records the namespace of `module` merges in, in
/// declaration order
fn merged_namespaces(session: &BundleSession, module: ModuleId) -> Vec<ExportId> {
    session
        .module(module)
        .pending_star_reexports
        .iter()
        .filter_map(|star| {
            session
                .external(star.external)
                .exports
                .get(NAMESPACE_EXPORT)
                .copied()
        })
        .collect()
}

/// `const <ns> = Object.freeze({ ... })`, or a merge helper call when the
/// module re-exports external namespaces. `None` when nothing asked for the
/// module's namespace.
pub fn namespace_declaration(session: &BundleSession, module: ModuleId) -> Option<Stmt> {
    let exports = &session.module(module).exports;
    let namespace = *exports.get(NAMESPACE_EXPORT)?;

    let members: Vec<(String, Expr)> = exports
        .iter()
        .filter(|(name, _)| *name != DEFAULT_EXPORT && *name != NAMESPACE_EXPORT)
        .map(|(name, record)| {
            let identifier = &session.export(*record).identifier_name;
            (name.clone(), Expr::Ident(ident(identifier)))
        })
        .collect();

    let merged: Vec<Expr> = merged_namespaces(session, module)
        .into_iter()
        .map(|record| Expr::Ident(ident(&session.export(record).identifier_name)))
        .collect();

    let init = if merged.is_empty() {
        call(
            member(Expr::Ident(ident("Object")), "freeze"),
            vec![object_lit(members)],
        )
    } else {
        call(
            Expr::Ident(ident(MERGE_NAMESPACES_HELPER)),
            vec![object_lit(members), array_lit(merged)],
        )
    };

    Some(const_decl(&session.export(namespace).identifier_name, init))
}

/// Whether any emitted namespace object merges an external namespace
pub fn needs_merge_helper(session: &BundleSession, order: &[ModuleId]) -> bool {
    order.iter().any(|&module| {
        session
            .module(module)
            .exports
            .contains_key(NAMESPACE_EXPORT)
            && !merged_namespaces(session, module).is_empty()
    })
}

/// The merge helper as module items
pub fn merge_helper(session: &BundleSession) -> BundleResult<Vec<ModuleItem>> {
    let helper = parse_es_module(
        &session.source_map,
        &session.comments,
        Path::new("rebundle:runtime/merge-namespaces.js"),
        MERGE_NAMESPACES_SOURCE.to_owned(),
    )?;
    Ok(helper.body)
}
