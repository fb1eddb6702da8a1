//! Nested-scope binding collection

use rustc_hash::FxHashSet;
use swc_core::{
    common::SyntaxContext,
    ecma::{
        ast::{Id, Ident, Module},
        visit::{Visit, VisitWith, noop_visit_type},
    },
};

/// Collects identifiers bound inside functions, blocks and classes: every
/// resolved identifier that is neither module-scope nor free
pub struct NestedBindingCollector {
    top_level_ctxt: SyntaxContext,
    unresolved_ctxt: SyntaxContext,
    ids: FxHashSet<Id>,
}

impl NestedBindingCollector {
    pub fn new(top_level_ctxt: SyntaxContext, unresolved_ctxt: SyntaxContext) -> Self {
        Self {
            top_level_ctxt,
            unresolved_ctxt,
            ids: FxHashSet::default(),
        }
    }

    pub fn analyze(
        module: &Module,
        top_level_ctxt: SyntaxContext,
        unresolved_ctxt: SyntaxContext,
    ) -> FxHashSet<Id> {
        let mut collector = Self::new(top_level_ctxt, unresolved_ctxt);
        module.visit_with(&mut collector);
        collector.ids
    }
}

impl Visit for NestedBindingCollector {
    noop_visit_type!();

    fn visit_ident(&mut self, n: &Ident) {
        // Labels keep the empty context
        if n.ctxt != self.top_level_ctxt
            && n.ctxt != self.unresolved_ctxt
            && n.ctxt != SyntaxContext::empty()
        {
            self.ids.insert(n.to_id());
        }
    }
}
