//! Apply final names to scope-resolved identifiers.

use rustc_hash::FxHashMap;
use swc_core::{
    atoms::Atom,
    ecma::{
        ast::{
            AssignPat, BindingIdent, Expr, Id, Ident, IdentName, ImportDecl, KeyValuePatProp,
            KeyValueProp, NamedExport, ObjectPatProp, Pat, Prop, PropName,
        },
        visit::{VisitMut, VisitMutWith, noop_visit_mut_type},
    },
};

/// Renames every occurrence of the identifiers in `rename_map`.
///
/// Identity is the `(symbol, context)` pair, so shadowing declarations in
/// nested scopes are left alone. Shorthand properties are expanded so the
/// property key keeps its original spelling.
#[derive(Debug)]
pub struct Renamer<'a> {
    pub rename_map: &'a FxHashMap<Id, Atom>,
}

impl<'a> Renamer<'a> {
    pub fn new(rename_map: &'a FxHashMap<Id, Atom>) -> Self {
        Self { rename_map }
    }

    fn renamed(&self, ident: &Ident) -> Option<Ident> {
        let name = self.rename_map.get(&ident.to_id())?;
        (*name != ident.sym).then(|| Ident {
            sym: name.clone(),
            ..ident.clone()
        })
    }
}

impl VisitMut for Renamer<'_> {
    noop_visit_mut_type!();

    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        if let Some(renamed) = self.renamed(ident) {
            *ident = renamed;
        }
    }

    // Import and export statements are regenerated from the export tables
    fn visit_mut_import_decl(&mut self, _: &mut ImportDecl) {}

    fn visit_mut_named_export(&mut self, _: &mut NamedExport) {}

    /// `{ foo }` → `{ foo: foo$1 }`
    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        if let Prop::Shorthand(ident) = prop
            && let Some(renamed) = self.renamed(ident)
        {
            *prop = Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(IdentName {
                    span: ident.span,
                    sym: ident.sym.clone(),
                }),
                value: Box::new(Expr::Ident(renamed)),
            });
            return;
        }
        prop.visit_mut_children_with(self);
    }

    /// `const { foo = 1 } = o` → `const { foo: foo$1 = 1 } = o`
    fn visit_mut_object_pat_prop(&mut self, prop: &mut ObjectPatProp) {
        if let ObjectPatProp::Assign(assign) = prop
            && let Some(renamed) = self.renamed(&assign.key.id)
        {
            let key = PropName::Ident(IdentName {
                span: assign.key.id.span,
                sym: assign.key.id.sym.clone(),
            });
            let binding = Pat::Ident(BindingIdent {
                id: renamed,
                type_ann: assign.key.type_ann.take(),
            });
            let value = match assign.value.take() {
                Some(mut default) => {
                    default.visit_mut_with(self);
                    Pat::Assign(AssignPat {
                        span: assign.span,
                        left: Box::new(binding),
                        right: default,
                    })
                }
                None => binding,
            };
            *prop = ObjectPatProp::KeyValue(KeyValuePatProp {
                key,
                value: Box::new(value),
            });
            return;
        }
        prop.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::visit::VisitMutWith;

    use super::*;
    use crate::syntax::{parse_for_test, print_module, squash};

    fn rename(code: &str, renames: &[(&str, &str)]) -> String {
        let (session, mut parsed) = parse_for_test(code);
        let rename_map: FxHashMap<Id, Atom> = renames
            .iter()
            .map(|(from, to)| ((Atom::from(*from), parsed.top_level_ctxt), Atom::from(*to)))
            .collect();
        parsed.ast.visit_mut_with(&mut Renamer::new(&rename_map));
        let code = print_module(&session.source_map, &session.comments, &parsed.ast, false)
            .expect("module should print");
        squash(&code)
    }

    #[test]
    fn test_renames_declaration_and_references() {
        let code = rename("const foo = 1; console.log(foo + foo);", &[("foo", "foo$1")]);
        assert!(code.contains("constfoo$1=1;"), "got: {code}");
        assert!(code.contains("console.log(foo$1+foo$1)"), "got: {code}");
    }

    #[test]
    fn test_shadowed_names_are_untouched() {
        let code = rename(
            "const foo = 1; function f(foo) { return foo; } f(foo);",
            &[("foo", "foo$1")],
        );
        assert!(code.contains("functionf(foo){returnfoo;}"), "got: {code}");
        assert!(code.contains("f(foo$1)"), "got: {code}");
    }

    #[test]
    fn test_shorthand_property_keeps_key() {
        let code = rename("const foo = 1; const o = { foo };", &[("foo", "foo$1")]);
        assert!(code.contains("{foo:foo$1}"), "got: {code}");
    }

    #[test]
    fn test_shorthand_pattern_keeps_key() {
        let code = rename("const { foo = 2, bar } = obj;", &[("foo", "foo$1")]);
        assert!(code.contains("{foo:foo$1=2,bar}"), "got: {code}");
    }
}
