//! Global identifier deconfliction
//!
//! Every surviving binding and every record without an owner binding gets a
//! name that is unique across the merged program. Names are always derived
//! from the original spelling, so running the pass again over an already
//! deconflicted graph assigns the same names.

use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::{
    code_generator::MERGE_NAMESPACES_HELPER,
    module_graph::{ExportId, ModuleId, ModuleRef},
    session::BundleSession,
    visitors::GlobalCollector,
};

/// The set of claimed identifiers for one bundle run
#[derive(Debug, Default)]
pub struct NameSet {
    claimed: FxHashSet<String>,
}

impl NameSet {
    pub fn new(reserved: impl IntoIterator<Item = String>) -> Self {
        Self {
            claimed: reserved.into_iter().collect(),
        }
    }

    /// Claim `base`, or the lowest free `base$n` when it is taken
    pub fn claim(&mut self, base: &str) -> String {
        if self.claimed.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}${suffix}");
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Strip a `$n` suffix added by an earlier run
fn unsuffixed(name: &str) -> &str {
    match name.rsplit_once('$') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

/// Assign final names to every binding and ownerless record.
///
/// `order` lists modules dependencies first. Free globals referenced
/// anywhere are reserved up front, together with the names generated code
/// reads (`undefined`, `Object` and the namespace merge helper). Returns
/// the number of names that differ from the source spelling.
pub fn deconflict(session: &mut BundleSession, order: &[ModuleId]) -> usize {
    let mut reserved: FxHashSet<String> = order
        .iter()
        .flat_map(|&id| {
            let module = session.module(id);
            GlobalCollector::analyze(&module.ast, module.unresolved_ctxt)
        })
        .collect();
    reserved.insert("undefined".to_owned());
    reserved.insert("Object".to_owned());
    reserved.insert(MERGE_NAMESPACES_HELPER.to_owned());

    let mut names = NameSet::new(reserved);
    let mut visited: FxHashSet<ExportId> = FxHashSet::default();
    let mut renamed = 0;

    for &module_id in order {
        for binding_id in session.module(module_id).bindings.clone() {
            let binding = session.binding(binding_id);
            if binding.removed {
                continue;
            }
            let name = names.claim(binding.original_name());
            if name != binding.original_name() {
                debug!(
                    "Renamed {} {} in {} to {name}",
                    binding.kind,
                    binding.original_name(),
                    session.module(module_id).path.display()
                );
                renamed += 1;
            }
            session.binding_mut(binding_id).name = name;
        }

        let module = session.module(module_id);
        let records: Vec<ExportId> = module
            .exports
            .values()
            .copied()
            .chain(module.anonymous_default)
            .collect();
        for record in records {
            let export = session.export(record);
            let identifier = match export.owner_binding {
                Some(owner) => session.binding(owner).name.clone(),
                None if export.source == ModuleRef::Internal(module_id)
                    && visited.insert(record) =>
                {
                    claim_record(&mut names, &export.identifier_name, &mut renamed)
                }
                None => continue,
            };
            session.export_mut(record).identifier_name = identifier;
        }
    }

    let external_records: Vec<ExportId> = session
        .externals()
        .flat_map(|external| external.exports.values().copied())
        .collect();
    for record in external_records {
        if visited.insert(record) {
            let identifier =
                claim_record(&mut names, &session.export(record).identifier_name, &mut renamed);
            session.export_mut(record).identifier_name = identifier;
        }
    }

    info!("Deconflicted identifiers; {renamed} renamed");
    renamed
}

fn claim_record(names: &mut NameSet, current: &str, renamed: &mut usize) -> String {
    let base = unsuffixed(current);
    let name = names.claim(base);
    if name != base {
        debug!("Renamed generated identifier {base} to {name}");
        *renamed += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::BundleOptions, dependency_graph::DependencyGraph, graph_builder::GraphBuilder,
    };

    fn build(files: &[(&str, &str)]) -> (TempDir, BundleSession, Vec<ModuleId>) {
        let dir = TempDir::new().expect("failed to create temp dir");
        for (name, source) in files {
            fs::write(dir.path().join(name), source).expect("failed to write");
        }
        let mut session = BundleSession::new(BundleOptions::default());
        GraphBuilder::new(&mut session)
            .build(&dir.path().join(files[0].0))
            .expect("graph should build");
        let order = DependencyGraph::from_session(&session).execution_order();
        (dir, session, order)
    }

    fn all_names(session: &BundleSession, order: &[ModuleId]) -> Vec<String> {
        let mut names = Vec::new();
        for &id in order {
            let module = session.module(id);
            names.extend(
                module
                    .bindings
                    .iter()
                    .map(|binding| session.binding(*binding).name.clone()),
            );
            names.extend(
                module
                    .exports
                    .values()
                    .map(|record| session.export(*record).identifier_name.clone()),
            );
        }
        for external in session.externals() {
            names.extend(
                external
                    .exports
                    .values()
                    .map(|record| session.export(*record).identifier_name.clone()),
            );
        }
        names
    }

    #[test]
    fn test_name_set_claims_lowest_free_suffix() {
        let mut names = NameSet::new(["foo$1".to_owned()]);
        assert_eq!(names.claim("foo"), "foo");
        assert_eq!(names.claim("foo"), "foo$2");
        assert_eq!(names.claim("foo"), "foo$3");
        assert_eq!(names.claim("foo$1"), "foo$1$1");
    }

    #[test]
    fn test_unsuffixed() {
        assert_eq!(unsuffixed("foo$12"), "foo");
        assert_eq!(unsuffixed("foo"), "foo");
        assert_eq!(unsuffixed("$"), "$");
        assert_eq!(unsuffixed("a$b"), "a$b");
    }

    #[test]
    fn test_colliding_bindings_get_suffixes_in_dependency_order() {
        let (_dir, mut session, order) = build(&[
            (
                "index.js",
                "import { foo as other } from './a.js';\nconst foo = 2;\nother + foo;\n",
            ),
            ("a.js", "export const foo = 1;\n"),
        ]);
        deconflict(&mut session, &order);

        let names: Vec<_> = order
            .iter()
            .flat_map(|id| session.module(*id).bindings.clone())
            .map(|binding| session.binding(binding).name.clone())
            .collect();
        assert_eq!(names, vec!["foo", "foo$1"]);
    }

    #[test]
    fn test_externals_are_named_after_internal_bindings() {
        let (_dir, mut session, order) = build(&[
            (
                "index.js",
                "import { map } from 'lodash';
                 import { map as localMap } from './a.js';
                 window.result = [map, localMap];
",
            ),
            ("a.js", "export const map = 1;
"),
        ]);
        deconflict(&mut session, &order);

        let a = session.module(order[0]);
        assert_eq!(session.binding(a.bindings[0]).name, "map");

        let lodash = session.external_by_specifier("lodash").expect("lodash");
        let map = session.external(lodash).exports["map"];
        assert_eq!(session.export(map).identifier_name, "map$1");
    }

    #[test]
    fn test_free_globals_are_reserved() {
        let (_dir, mut session, order) = build(&[
            ("index.js", "import { JSON as J } from './a.js';\nJSON.stringify(J);\n"),
            ("a.js", "const JSON = {};\nexport { JSON };\n"),
        ]);
        deconflict(&mut session, &order);

        let a = session.module(order[0]);
        assert_eq!(session.binding(a.bindings[0]).name, "JSON$1");
        assert_eq!(session.export(a.exports["JSON"]).identifier_name, "JSON$1");
    }

    #[test]
    fn test_deconflict_is_idempotent() {
        let (_dir, mut session, order) = build(&[
            (
                "index.js",
                "import * as ns from './a.js';\n\
                 import b from './b.js';\n\
                 import { helper } from 'helpers';\n\
                 const a = 1;\n\
                 const helper$1 = 2;\n\
                 console.log(ns, b, a, helper, helper$1);\n",
            ),
            ("a.js", "export const a = 1;\nexport default 2;\nexport * from 'helpers';\n"),
            ("b.js", "const a = 3;\nexport default a + 1;\n"),
        ]);
        deconflict(&mut session, &order);
        let first = all_names(&session, &order);
        deconflict(&mut session, &order);
        let second = all_names(&session, &order);
        assert_eq!(first, second);
    }
}
