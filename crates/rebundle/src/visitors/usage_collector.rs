//! Reference and reassignment counting for module-scope identifiers
//!
//! A reference is any occurrence of a module-scope identifier other than its
//! declaration: reads, writes, shorthand properties, `export { x }`
//! specifiers and `export default x`. An `export` keyword in front of a
//! declaration counts as one reference per declared name. Reassignments are
//! assignment, update and `for-in/of` targets; they are counted as references
//! too, so a binding that is only ever written is never deleted from under
//! its writes.

use rustc_hash::FxHashMap;
use swc_core::{
    common::SyntaxContext,
    ecma::{
        ast::{
            AssignExpr, AssignTarget, ClassDecl, ClassExpr, Decl, DefaultDecl, ExportDecl,
            ExportDefaultDecl, ExportDefaultExpr, ExportSpecifier, Expr, FnDecl, FnExpr, ForHead, ForInStmt, ForOfStmt, Id, Ident,
            ImportDecl, Module, ModuleExportName, NamedExport, ObjectPatProp, Pat,
            SimpleAssignTarget, UpdateExpr, VarDeclarator,
        },
        utils::find_pat_ids,
        visit::{Visit, VisitWith, noop_visit_type},
    },
};

use crate::module_graph::IdentUsage;

pub struct UsageCollector {
    top_level_ctxt: SyntaxContext,
    usage: FxHashMap<Id, IdentUsage>,
}

impl UsageCollector {
    pub fn new(top_level_ctxt: SyntaxContext) -> Self {
        Self {
            top_level_ctxt,
            usage: FxHashMap::default(),
        }
    }

    /// Count occurrences of every module-scope identifier in `module`
    pub fn analyze(module: &Module, top_level_ctxt: SyntaxContext) -> FxHashMap<Id, IdentUsage> {
        let mut collector = Self::new(top_level_ctxt);
        module.visit_with(&mut collector);
        collector.usage
    }

    fn entry(&mut self, id: Id) -> Option<&mut IdentUsage> {
        if id.1 == self.top_level_ctxt {
            Some(self.usage.entry(id).or_default())
        } else {
            None
        }
    }

    fn export_reference(&mut self, id: Id) {
        if let Some(usage) = self.entry(id) {
            usage.references += 1;
            usage.export_references += 1;
        }
    }

    fn reassignment(&mut self, id: Id) {
        if let Some(usage) = self.entry(id) {
            usage.reassignments += 1;
        }
    }

    /// Visit a declaring pattern: bound names are skipped, default values
    /// and computed keys are ordinary expressions
    fn visit_declaring_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(_) | Pat::Invalid(_) => {}
            Pat::Array(array) => {
                for element in array.elems.iter().flatten() {
                    self.visit_declaring_pat(element);
                }
            }
            Pat::Rest(rest) => self.visit_declaring_pat(&rest.arg),
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(key_value) => {
                            key_value.key.visit_with(self);
                            self.visit_declaring_pat(&key_value.value);
                        }
                        ObjectPatProp::Assign(assign) => assign.value.visit_with(self),
                        ObjectPatProp::Rest(rest) => self.visit_declaring_pat(&rest.arg),
                    }
                }
            }
            Pat::Assign(assign) => {
                self.visit_declaring_pat(&assign.left);
                assign.right.visit_with(self);
            }
            Pat::Expr(expr) => expr.visit_with(self),
        }
    }
}

impl Visit for UsageCollector {
    noop_visit_type!();

    fn visit_ident(&mut self, n: &Ident) {
        if let Some(usage) = self.entry(n.to_id()) {
            usage.references += 1;
        }
    }

    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        self.visit_declaring_pat(&n.name);
        n.init.visit_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        n.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        n.class.visit_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        n.function.visit_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        n.class.visit_with(self);
    }

    fn visit_export_decl(&mut self, n: &ExportDecl) {
        match &n.decl {
            Decl::Var(var) => {
                for declarator in &var.decls {
                    for id in find_pat_ids::<_, Id>(&declarator.name) {
                        self.export_reference(id);
                    }
                }
            }
            Decl::Fn(function) => self.export_reference(function.ident.to_id()),
            Decl::Class(class) => self.export_reference(class.ident.to_id()),
            _ => {}
        }
        n.decl.visit_with(self);
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        // Names re-exported `from` another module are not ours
        if n.src.is_some() {
            return;
        }
        for specifier in &n.specifiers {
            if let ExportSpecifier::Named(named) = specifier
                && let ModuleExportName::Ident(orig) = &named.orig
            {
                self.export_reference(orig.to_id());
            }
        }
    }

    fn visit_export_default_decl(&mut self, n: &ExportDefaultDecl) {
        match &n.decl {
            DefaultDecl::Fn(FnExpr {
                ident: Some(ident), ..
            })
            | DefaultDecl::Class(ClassExpr {
                ident: Some(ident), ..
            }) => self.export_reference(ident.to_id()),
            _ => {}
        }
        n.decl.visit_with(self);
    }

    fn visit_export_default_expr(&mut self, n: &ExportDefaultExpr) {
        match &*n.expr {
            Expr::Ident(ident) => self.export_reference(ident.to_id()),
            expr => expr.visit_with(self),
        }
    }

    fn visit_assign_expr(&mut self, n: &AssignExpr) {
        match &n.left {
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                self.reassignment(binding.id.to_id());
            }
            AssignTarget::Pat(pat) => {
                for id in find_pat_ids::<_, Id>(pat) {
                    self.reassignment(id);
                }
            }
            AssignTarget::Simple(_) => {}
        }
        n.visit_children_with(self);
    }

    fn visit_update_expr(&mut self, n: &UpdateExpr) {
        if let Expr::Ident(ident) = &*n.arg {
            self.reassignment(ident.to_id());
        }
        n.visit_children_with(self);
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        if let ForHead::Pat(pat) = &n.left {
            for id in find_pat_ids::<_, Id>(&**pat) {
                self.reassignment(id);
            }
        }
        n.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        if let ForHead::Pat(pat) = &n.left {
            for id in find_pat_ids::<_, Id>(&**pat) {
                self.reassignment(id);
            }
        }
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syntax::parse_for_test;

    fn usage_of(code: &str, name: &str) -> IdentUsage {
        let (_session, parsed) = parse_for_test(code);
        let usage = UsageCollector::analyze(&parsed.ast, parsed.top_level_ctxt);
        usage
            .into_iter()
            .find(|(id, _)| &*id.0 == name)
            .map(|(_, usage)| usage)
            .unwrap_or_default()
    }

    #[test]
    fn test_unreferenced_declaration_has_no_references() {
        assert_eq!(usage_of("const a = 1;", "a"), IdentUsage::default());
    }

    #[test]
    fn test_reads_and_shorthand_properties_are_references() {
        let usage = usage_of("const a = 1; console.log(a, { a }, a.b);", "a");
        assert_eq!(usage.references, 3);
        assert_eq!(usage.reassignments, 0);
    }

    #[test]
    fn test_writes_are_reassignments_and_references() {
        let usage = usage_of("let n = 0; n = 1; n += 2; n++; [n] = [3];", "n");
        assert_eq!(usage.reassignments, 4);
        assert_eq!(usage.references, 4);
    }

    #[test]
    fn test_export_sites_count_as_references() {
        let usage = usage_of("export const a = 1;", "a");
        assert_eq!(
            usage,
            IdentUsage {
                references: 1,
                export_references: 1,
                reassignments: 0,
            }
        );

        let usage = usage_of("const b = 1; export { b, b as c }; export default b;", "b");
        assert_eq!(usage.references, 3);
        assert_eq!(usage.export_references, 3);
    }

    #[test]
    fn test_named_default_declarations_are_export_references() {
        let usage = usage_of("export default function main() { return 1; }", "main");
        assert_eq!(usage.references, 1);
        assert_eq!(usage.export_references, 1);

        let usage = usage_of("export default class Widget {} new Widget();", "Widget");
        assert_eq!(usage.references, 2);
        assert_eq!(usage.export_references, 1);
    }

    #[test]
    fn test_shadowed_names_are_not_references() {
        let usage = usage_of(
            "const a = 1; function f(a) { return a; } { const a = 2; a; }",
            "a",
        );
        assert_eq!(usage.references, 0);
    }

    #[test]
    fn test_destructuring_defaults_are_references() {
        let usage = usage_of("const d = 1; const { x = d, [d]: y } = obj;", "d");
        assert_eq!(usage.references, 2);
    }

    #[test]
    fn test_import_locals_are_counted() {
        let usage = usage_of("import { foo } from './foo'; foo(); foo();", "foo");
        assert_eq!(usage.references, 2);
    }
}
