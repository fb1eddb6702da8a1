//! Final program assembly
//!
//! Output order: hoisted external imports, the namespace merge helper when
//! some namespace needs it, then every module body in execution order.

use log::debug;
use swc_core::{
    common::DUMMY_SP,
    ecma::ast::{ImportSpecifier, Module as SwcModule, ModuleItem},
};

use super::namespace::{merge_helper, needs_merge_helper};
use crate::{
    ast_builder::{
        import_decl, import_default_specifier, import_named_specifier, import_namespace_specifier,
    },
    error::BundleResult,
    module_graph::{DEFAULT_EXPORT, ExternalModule, ModuleId, NAMESPACE_EXPORT},
    session::BundleSession,
    syntax::print_module,
};

/// Import statements for one external.
///
/// Default, namespace and named imports share one statement where the
/// syntax allows it; a namespace next to named imports needs its own. An
/// external whose every record was shaken away keeps a bare import for its
/// side effects.
fn external_imports(session: &BundleSession, external: &ExternalModule) -> Vec<ModuleItem> {
    if external.exports.is_empty() {
        return if external.dependents.is_empty() {
            Vec::new()
        } else {
            vec![import_decl(&external.specifier, Vec::new())]
        };
    }

    let mut default = None;
    let mut namespace = None;
    let mut named = Vec::new();
    for (name, record) in &external.exports {
        let identifier = &session.export(*record).identifier_name;
        match name.as_str() {
            DEFAULT_EXPORT => default = Some(import_default_specifier(identifier)),
            NAMESPACE_EXPORT => namespace = Some(import_namespace_specifier(identifier)),
            _ => named.push(import_named_specifier(name, identifier)),
        }
    }

    let mut specifiers: Vec<ImportSpecifier> = default.into_iter().collect();
    match namespace {
        Some(namespace) if named.is_empty() => {
            specifiers.push(namespace);
            vec![import_decl(&external.specifier, specifiers)]
        }
        Some(namespace) => {
            specifiers.extend(named);
            vec![
                import_decl(&external.specifier, specifiers),
                import_decl(&external.specifier, vec![namespace]),
            ]
        }
        None => {
            specifiers.extend(named);
            vec![import_decl(&external.specifier, specifiers)]
        }
    }
}

/// Concatenate the hoisted modules into one program and print it.
///
/// Moves every module body out of the session; run it once, last.
pub fn assemble(session: &mut BundleSession, order: &[ModuleId]) -> BundleResult<String> {
    let shared = &*session;
    let mut body: Vec<ModuleItem> = shared
        .externals()
        .flat_map(|external| external_imports(shared, external))
        .collect();
    debug!("Hoisted {} external import statements", body.len());

    if needs_merge_helper(shared, order) {
        debug!("Emitting namespace merge helper");
        body.extend(merge_helper(shared)?);
    }

    let mut shebang = None;
    for &module_id in order {
        let module = session.module_mut(module_id);
        if module.is_entry {
            shebang = module.ast.shebang.clone();
        }
        body.append(&mut module.ast.body);
    }

    let program = SwcModule {
        span: DUMMY_SP,
        body,
        shebang,
    };
    print_module(
        &session.source_map,
        &session.comments,
        &program,
        session.options().minify,
    )
}
