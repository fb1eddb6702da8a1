//! AST builder module for creating synthetic AST nodes
//!
//! This module provides factory functions for creating AST nodes that don't
//! originate from source files. All synthetic nodes use `DUMMY_SP` and an
//! empty syntax context to mark them as generated.

use swc_core::{
    common::{DUMMY_SP, SyntaxContext},
    ecma::ast::{
        ArrayLit, BindingIdent, CallExpr, Callee, Decl, ExportAll, ExportNamedSpecifier, ExportSpecifier,
        Expr, ExprOrSpread, Ident, IdentName, ImportDecl, ImportDefaultSpecifier,
        ImportNamedSpecifier, ImportSpecifier, ImportStarAsSpecifier, KeyValueProp, MemberExpr,
        MemberProp, ModuleDecl, ModuleExportName, ModuleItem, NamedExport, ObjectLit, Pat, Prop,
        PropName, PropOrSpread, Stmt, Str, VarDecl, VarDeclKind, VarDeclarator,
    },
};

use crate::util::is_valid_identifier;

/// Create an identifier with no scope information
pub fn ident(name: &str) -> Ident {
    Ident {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        sym: name.into(),
        optional: false,
    }
}

/// Create a string literal; the code generator picks the quotes
pub fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

/// Ident when `name` is a legal identifier, string literal otherwise
pub fn module_export_name(name: &str) -> ModuleExportName {
    if is_valid_identifier(name) || name == "default" {
        ModuleExportName::Ident(ident(name))
    } else {
        ModuleExportName::Str(str_lit(name))
    }
}

/// Creates `const <name> = <init>;`
pub fn const_decl(name: &str, init: Expr) -> Stmt {
    Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent {
                id: ident(name),
                type_ann: None,
            }),
            init: Some(Box::new(init)),
            definite: false,
        }],
    })))
}

/// Creates `<callee>(<args>)`
pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(callee)),
        args: args
            .into_iter()
            .map(|expr| ExprOrSpread {
                spread: None,
                expr: Box::new(expr),
            })
            .collect(),
        type_args: None,
    })
}

/// Creates `<object>.<property>`
pub fn member(object: Expr, property: &str) -> Expr {
    Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(object),
        prop: MemberProp::Ident(IdentName {
            span: DUMMY_SP,
            sym: property.into(),
        }),
    })
}

/// Creates `{ "key": value, ... }` with quoted keys
pub fn object_lit(entries: Vec<(String, Expr)>) -> Expr {
    Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props: entries
            .into_iter()
            .map(|(key, value)| {
                PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                    key: PropName::Str(str_lit(&key)),
                    value: Box::new(value),
                })))
            })
            .collect(),
    })
}

/// Creates `[a, b, ...]`
pub fn array_lit(elements: Vec<Expr>) -> Expr {
    Expr::Array(ArrayLit {
        span: DUMMY_SP,
        elems: elements
            .into_iter()
            .map(|expr| {
                Some(ExprOrSpread {
                    spread: None,
                    expr: Box::new(expr),
                })
            })
            .collect(),
    })
}

/// Creates `import <specifiers> from '<src>'`, or `import '<src>'` when
/// `specifiers` is empty
pub fn import_decl(src: &str, specifiers: Vec<ImportSpecifier>) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers,
        src: Box::new(str_lit(src)),
        type_only: false,
        with: None,
        phase: Default::default(),
    }))
}

/// `imported as local`, or just `local` when both match
pub fn import_named_specifier(imported: &str, local: &str) -> ImportSpecifier {
    ImportSpecifier::Named(ImportNamedSpecifier {
        span: DUMMY_SP,
        local: ident(local),
        imported: (imported != local).then(|| module_export_name(imported)),
        is_type_only: false,
    })
}

pub fn import_default_specifier(local: &str) -> ImportSpecifier {
    ImportSpecifier::Default(ImportDefaultSpecifier {
        span: DUMMY_SP,
        local: ident(local),
    })
}

pub fn import_namespace_specifier(local: &str) -> ImportSpecifier {
    ImportSpecifier::Namespace(ImportStarAsSpecifier {
        span: DUMMY_SP,
        local: ident(local),
    })
}

/// Creates `export { local as exported, ... }` from `(local, exported)` pairs
pub fn export_named(entries: Vec<(String, String)>) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
        span: DUMMY_SP,
        specifiers: entries
            .into_iter()
            .map(|(local, exported)| {
                ExportSpecifier::Named(ExportNamedSpecifier {
                    span: DUMMY_SP,
                    exported: (local != exported).then(|| module_export_name(&exported)),
                    orig: ModuleExportName::Ident(ident(&local)),
                    is_type_only: false,
                })
            })
            .collect(),
        src: None,
        type_only: false,
        with: None,
    }))
}

/// Creates `export * from '<src>'`
pub fn export_all(src: &str) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportAll(ExportAll {
        span: DUMMY_SP,
        src: Box::new(str_lit(src)),
        type_only: false,
        with: None,
    }))
}
