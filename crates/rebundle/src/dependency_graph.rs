//! Module dependency graph
//!
//! A petgraph view over the session's internal modules, built once the
//! graph builder finished. Externals are leaves and are left out.
//! Edges point from an importer to the module it depends on.

use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::DfsPostOrder,
};
use rustc_hash::FxHashMap;

use crate::{
    module_graph::{ModuleId, ModuleRef},
    session::BundleSession,
};

#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<ModuleId, ()>,
    entry: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn from_session(session: &BundleSession) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = FxHashMap::default();

        for module in session.modules() {
            node_indices.insert(module.id, graph.add_node(module.id));
        }

        for module in session.modules() {
            let from = node_indices[&module.id];
            // Neighbors come back newest first and the post-order DFS visits
            // the last pushed neighbor first, so source order is preserved
            for target in module.dependencies.values() {
                if let ModuleRef::Internal(dependency) = target {
                    let to = node_indices[dependency];
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        let entry = session.entry().map(|id| node_indices[&id]);
        Self {
            graph,
            entry,
        }
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Modules reachable from the entry, every module after all of its
    /// dependencies and the entry last
    pub fn execution_order(&self) -> Vec<ModuleId> {
        let Some(entry) = self.entry else {
            return Vec::new();
        };
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut dfs = DfsPostOrder::new(&self.graph, entry);
        while let Some(node) = dfs.next(&self.graph) {
            order.push(self.graph[node]);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{config::BundleOptions, graph_builder::GraphBuilder};

    fn file_names(session: &BundleSession, ids: &[ModuleId]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                session
                    .module(*id)
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn test_diamond_execution_order() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path();
        fs::write(
            root.join("index.js"),
            "import './b.js';\nimport './c.js';\nimport 'lodash';\n",
        )
        .expect("failed to write");
        fs::write(root.join("b.js"), "import './shared.js';\n").expect("failed to write");
        fs::write(root.join("c.js"), "import './shared.js';\n").expect("failed to write");
        fs::write(root.join("shared.js"), "export let counter = 0;\n").expect("failed to write");

        let mut session = BundleSession::new(BundleOptions::default());
        GraphBuilder::new(&mut session)
            .build(&root.join("index.js"))
            .expect("graph should build");

        let graph = DependencyGraph::from_session(&session);
        assert_eq!(graph.module_count(), 4);

        let order = graph.execution_order();
        assert_eq!(
            file_names(&session, &order),
            vec!["shared.js", "b.js", "c.js", "index.js"]
        );
    }
}
