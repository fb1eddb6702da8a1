//! Per-module rewrite into the shared program scope
//!
//! Once names are final every module is renamed in place and stripped of its
//! module syntax: imports disappear because their locals now spell the
//! imported identifier directly, export statements collapse into the plain
//! declarations they wrap, and anonymous default exports become `const`
//! declarations under the name the deconflictor picked.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::{
    atoms::Atom,
    ecma::{
        ast::{
            ClassDecl, ClassExpr, Decl, DefaultDecl, Expr, FnDecl, FnExpr, Id, ModuleDecl,
            ModuleItem, Stmt,
        },
        visit::VisitMutWith,
    },
};

use super::namespace::namespace_declaration;
use crate::{
    ast_builder::{const_decl, export_all, export_named},
    module_graph::{ModuleId, NAMESPACE_EXPORT},
    session::BundleSession,
    visitors::{GlobalCollector, NestedBindingCollector, Renamer},
};

/// Final spelling of every module-scope identifier of `module`. Imports
/// map to the identifier of the record they resolved to, or `undefined`
/// when the dependency does not provide the name.
fn rename_map(session: &BundleSession, module: ModuleId) -> FxHashMap<Id, Atom> {
    let module = session.module(module);
    let mut renames = FxHashMap::default();

    for binding in &module.bindings {
        let binding = session.binding(*binding);
        if !binding.removed {
            renames.insert(binding.id.clone(), Atom::from(binding.name.as_str()));
        }
    }
    for import in &module.import_bindings {
        let name = import
            .resolved
            .map_or("undefined", |record| {
                session.export(record).identifier_name.as_str()
            });
        renames.insert(import.local.clone(), Atom::from(name));
    }
    renames
}

/// Rename nested bindings that would capture a rewritten reference.
///
/// A module-scope identifier whose spelling changes, such as an import
/// local now spelled as the imported identifier, can meet a parameter or
/// inner declaration of that spelling inside a nested scope. Such nested
/// bindings move to the lowest `name$n` that the module does not read.
fn unshadow(session: &BundleSession, module: ModuleId, renames: &mut FxHashMap<Id, Atom>) {
    let module = session.module(module);
    let introduced: FxHashSet<Atom> = renames
        .iter()
        .filter(|(id, name)| id.0 != **name)
        .map(|(_, name)| name.clone())
        .collect();
    let nested =
        NestedBindingCollector::analyze(&module.ast, module.top_level_ctxt, module.unresolved_ctxt);
    let mut shadowing: Vec<&Id> = nested
        .iter()
        .filter(|id| introduced.contains(&id.0))
        .collect();
    if shadowing.is_empty() {
        return;
    }
    shadowing.sort_by_key(|id| (id.0.to_string(), id.1.as_u32()));

    let mut taken: FxHashSet<String> =
        GlobalCollector::analyze(&module.ast, module.unresolved_ctxt);
    taken.extend(renames.values().map(ToString::to_string));
    taken.extend(nested.iter().map(|id| id.0.to_string()));

    let mut unshadowed = Vec::with_capacity(shadowing.len());
    for id in shadowing {
        let mut suffix = 1;
        let name = loop {
            let candidate = format!("{}${suffix}", id.0);
            if taken.insert(candidate.clone()) {
                break candidate;
            }
            suffix += 1;
        };
        debug!(
            "Renamed nested {} in {} to {name}",
            id.0,
            module.path.display()
        );
        unshadowed.push((id.clone(), Atom::from(name)));
    }
    renames.extend(unshadowed);
}

/// Rewrite one module's body. Must run after deconfliction.
pub fn hoist_module(session: &mut BundleSession, module_id: ModuleId) {
    let mut renames = rename_map(session, module_id);
    unshadow(session, module_id, &mut renames);

    let mut body = std::mem::take(&mut session.module_mut(module_id).ast.body);
    let session_ref = &*session;
    let module = session_ref.module(module_id);

    body.visit_mut_with(&mut Renamer::new(&renames));

    let anonymous_default = module
        .anonymous_default
        .map(|record| session_ref.export(record).identifier_name.as_str());

    let before = body.len();
    let mut hoisted: Vec<ModuleItem> = body
        .into_iter()
        .filter_map(|item| hoist_item(item, anonymous_default))
        .collect();
    debug!(
        "Hoisted {}: {} of {before} top-level items kept",
        module.path.display(),
        hoisted.len()
    );

    if let Some(namespace) = namespace_declaration(session_ref, module_id) {
        hoisted.push(ModuleItem::Stmt(namespace));
    }
    if module.is_entry {
        hoisted.extend(entry_exports(session_ref, module_id));
    }

    session.module_mut(module_id).ast.body = hoisted;
}

fn hoist_item(item: ModuleItem, anonymous_default: Option<&str>) -> Option<ModuleItem> {
    let decl = match item {
        ModuleItem::Stmt(stmt) => return Some(ModuleItem::Stmt(stmt)),
        ModuleItem::ModuleDecl(decl) => decl,
    };

    let stmt = match decl {
        ModuleDecl::ExportDecl(export) => Stmt::Decl(export.decl),
        ModuleDecl::ExportDefaultDecl(export) => match export.decl {
            DefaultDecl::Fn(FnExpr {
                ident: Some(ident),
                function,
            }) => Stmt::Decl(Decl::Fn(FnDecl {
                ident,
                declare: false,
                function,
            })),
            DefaultDecl::Class(ClassExpr {
                ident: Some(ident),
                class,
            }) => Stmt::Decl(Decl::Class(ClassDecl {
                ident,
                declare: false,
                class,
            })),
            DefaultDecl::Fn(function) => const_decl(anonymous_default?, Expr::Fn(function)),
            DefaultDecl::Class(class) => const_decl(anonymous_default?, Expr::Class(class)),
            DefaultDecl::TsInterfaceDecl(_) => return None,
        },
        // A default expression aliasing a binding or an import needs no
        // statement of its own
        ModuleDecl::ExportDefaultExpr(export) => const_decl(anonymous_default?, *export.expr),
        _ => return None,
    };
    Some(ModuleItem::Stmt(stmt))
}

/// `export { ... }` listing every surviving export of the entry under its
/// final identifier, then one `export *` per external star re-export
fn entry_exports(session: &BundleSession, entry: ModuleId) -> Vec<ModuleItem> {
    let module = session.module(entry);
    let specifiers: Vec<(String, String)> = module
        .exports
        .iter()
        .filter(|(name, _)| *name != NAMESPACE_EXPORT)
        .map(|(name, record)| (session.export(*record).identifier_name.clone(), name.clone()))
        .collect();

    let mut items = Vec::new();
    if !specifiers.is_empty() {
        items.push(export_named(specifiers));
    }
    items.extend(
        module
            .pending_star_reexports
            .iter()
            .map(|star| export_all(&star.specifier)),
    );
    items
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swc_core::{common::DUMMY_SP, ecma::ast::Module};

    use super::*;
    use crate::{
        code_generator::tests::build,
        syntax::{print_module, squash},
    };

    fn hoisted(fixture: &mut crate::code_generator::tests::Fixture, file: &str) -> String {
        let id = fixture.module(file);
        hoist_module(&mut fixture.session, id);
        let module = Module {
            span: DUMMY_SP,
            body: fixture.session.module(id).ast.body.clone(),
            shebang: None,
        };
        let code = print_module(
            &fixture.session.source_map,
            &fixture.session.comments,
            &module,
            false,
        )
        .expect("module should print");
        squash(&code).replace('\'', "\"")
    }

    #[test]
    fn test_nested_bindings_do_not_capture_renamed_imports() {
        let mut fixture = build(&[
            (
                "index.js",
                "import { value as v } from './a.js';\n\
                 function g(value) { return v + value; }\n\
                 console.log(g(10));\n",
            ),
            ("a.js", "export const value = 1;\n"),
        ]);
        assert_eq!(
            hoisted(&mut fixture, "index.js"),
            "functiong(value$1){returnvalue+value$1;}console.log(g(10));"
        );
    }

    #[test]
    fn test_untouched_shadowing_is_left_alone() {
        let mut fixture = build(&[
            ("index.js", "import { a } from './a.js';\nfunction f(a) { return a; }\nf(a);\n"),
            ("a.js", "export const a = 1;\n"),
        ]);
        assert_eq!(hoisted(&mut fixture, "index.js"), "functionf(a){returna;}f(a);");
    }

    #[test]
    fn test_imports_are_replaced_by_final_names() {
        let mut fixture = build(&[
            (
                "index.js",
                "import { foo as other } from './a.js';\nconst foo = 2;\nconsole.log(other, foo);\n",
            ),
            ("a.js", "export const foo = 1;\n"),
        ]);
        assert_eq!(hoisted(&mut fixture, "a.js"), "constfoo=1;");
        assert_eq!(
            hoisted(&mut fixture, "index.js"),
            "constfoo$1=2;console.log(foo,foo$1);"
        );
    }

    #[test]
    fn test_default_exports_become_declarations() {
        let mut fixture = build(&[
            (
                "index.js",
                "import one from './a.js';\n\
                 import Widget from './b.js';\n\
                 import answer from './c.js';\n\
                 console.log(one(), new Widget(), answer);\n",
            ),
            ("a.js", "export default function () { return 1; }\n"),
            ("b.js", "export default class Widget {}\n"),
            ("c.js", "export default 40 + 2;\n"),
        ]);
        assert_eq!(hoisted(&mut fixture, "a.js"), "consta=function(){return1;};");
        assert_eq!(hoisted(&mut fixture, "b.js"), "classWidget{}");
        assert_eq!(hoisted(&mut fixture, "c.js"), "constc=40+2;");
        assert_eq!(
            hoisted(&mut fixture, "index.js"),
            "console.log(a(),newWidget(),c);"
        );
    }

    #[test]
    fn test_default_alias_of_binding_is_dropped() {
        let mut fixture = build(&[
            ("index.js", "import value from './a.js';\nconsole.log(value);\n"),
            ("a.js", "const value = 1;\nexport default value;\n"),
        ]);
        assert_eq!(hoisted(&mut fixture, "a.js"), "constvalue=1;");
        assert_eq!(hoisted(&mut fixture, "index.js"), "console.log(value);");
    }

    #[test]
    fn test_missing_import_reads_undefined() {
        let mut fixture = build(&[
            ("index.js", "import { nope } from './a.js';\nconsole.log(nope);\n"),
            ("a.js", "export const x = 1;\n"),
        ]);
        assert_eq!(hoisted(&mut fixture, "index.js"), "console.log(undefined);");
    }

    #[test]
    fn test_namespace_is_declared_after_module_body() {
        let mut fixture = build(&[
            ("index.js", "import * as ns from './a.js';\nconsole.log(ns.x);\n"),
            ("a.js", "export const x = 1;\nexport default 2;\n"),
        ]);
        assert_eq!(
            hoisted(&mut fixture, "a.js"),
            "constx=1;consta=2;constns=Object.freeze({\"x\":x});"
        );
        assert_eq!(hoisted(&mut fixture, "index.js"), "console.log(ns.x);");
    }

    #[test]
    fn test_entry_keeps_its_export_surface() {
        let mut fixture = build(&[(
            "index.js",
            "export const a = 1;\n\
             const b = 2;\n\
             export { b as renamed };\n\
             export default function main() {}\n\
             export * from 'ext';\n",
        )]);
        assert_eq!(
            hoisted(&mut fixture, "index.js"),
            "consta=1;constb=2;functionmain(){}\
             export{a,basrenamed,mainasdefault};export*from\"ext\";"
        );
    }
}
