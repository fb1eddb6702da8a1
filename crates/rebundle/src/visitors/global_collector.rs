//! Free identifier collection

use rustc_hash::FxHashSet;
use swc_core::{
    common::SyntaxContext,
    ecma::{
        ast::{Ident, Module},
        visit::{Visit, VisitWith, noop_visit_type},
    },
};

/// Collects the names of identifiers that resolve to no declaration, such as
/// `console`, `Object` or implicit globals
pub struct GlobalCollector {
    unresolved_ctxt: SyntaxContext,
    names: FxHashSet<String>,
}

impl GlobalCollector {
    pub fn new(unresolved_ctxt: SyntaxContext) -> Self {
        Self {
            unresolved_ctxt,
            names: FxHashSet::default(),
        }
    }

    pub fn analyze(module: &Module, unresolved_ctxt: SyntaxContext) -> FxHashSet<String> {
        let mut collector = Self::new(unresolved_ctxt);
        module.visit_with(&mut collector);
        collector.names
    }
}

impl Visit for GlobalCollector {
    noop_visit_type!();

    fn visit_ident(&mut self, n: &Ident) {
        if n.ctxt == self.unresolved_ctxt {
            self.names.insert(n.sym.to_string());
        }
    }
}
