//! Module-scope declaration collection
//!
//! Collects every declaration the scope resolver placed in module scope:
//! `const`/`let`/`var` (including destructured names and `var`s hoisted out
//! of top-level blocks), functions and classes, and named default-exported
//! functions and classes. Import specifiers are not declarations here.

use rustc_hash::FxHashSet;
use swc_core::{
    common::SyntaxContext,
    ecma::{
        ast::{ClassDecl, ClassExpr, FnDecl, FnExpr, Id, ImportDecl, Module, VarDecl, VarDeclKind},
        utils::find_pat_ids,
        visit::{Visit, VisitWith, noop_visit_type},
    },
};

use crate::module_graph::BindingKind;

/// One module-scope declaration, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredBinding {
    pub id: Id,
    pub kind: BindingKind,
}

pub struct DeclarationCollector {
    top_level_ctxt: SyntaxContext,
    seen: FxHashSet<Id>,
    declared: Vec<DeclaredBinding>,
}

impl DeclarationCollector {
    pub fn new(top_level_ctxt: SyntaxContext) -> Self {
        Self {
            top_level_ctxt,
            seen: FxHashSet::default(),
            declared: Vec::new(),
        }
    }

    /// Collect the module-scope declarations of `module`
    pub fn analyze(module: &Module, top_level_ctxt: SyntaxContext) -> Vec<DeclaredBinding> {
        let mut collector = Self::new(top_level_ctxt);
        module.visit_with(&mut collector);
        collector.declared
    }

    fn declare(&mut self, id: Id, kind: BindingKind) {
        // `var a; var a;` declares a single binding
        if id.1 == self.top_level_ctxt && self.seen.insert(id.clone()) {
            self.declared.push(DeclaredBinding { id, kind });
        }
    }
}

impl Visit for DeclarationCollector {
    noop_visit_type!();

    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    fn visit_var_decl(&mut self, n: &VarDecl) {
        let kind = match n.kind {
            VarDeclKind::Const => BindingKind::Const,
            VarDeclKind::Let => BindingKind::Let,
            VarDeclKind::Var => BindingKind::Var,
        };
        for declarator in &n.decls {
            for id in find_pat_ids::<_, Id>(&declarator.name) {
                self.declare(id, kind);
            }
        }
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.declare(n.ident.to_id(), BindingKind::Function);
        n.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(n.ident.to_id(), BindingKind::Class);
        n.visit_children_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        if let Some(ident) = &n.ident {
            self.declare(ident.to_id(), BindingKind::Function);
        }
        n.visit_children_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        if let Some(ident) = &n.ident {
            self.declare(ident.to_id(), BindingKind::Class);
        }
        n.visit_children_with(self);
    }
}
