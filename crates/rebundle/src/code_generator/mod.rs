//! Code generation for the merged program
//!
//! Runs after deconfliction: every module is hoisted into the shared scope
//! under its final names, then the assembler concatenates the hoisted
//! bodies behind the external imports and prints the result.

mod assembler;
mod namespace;
mod scope_hoister;

pub use assembler::assemble;
pub use namespace::MERGE_NAMESPACES_HELPER;
pub use scope_hoister::hoist_module;

use log::info;

use crate::{error::BundleResult, module_graph::ModuleId, session::BundleSession};

/// Hoist every module in `order` and print the bundle
pub fn generate(session: &mut BundleSession, order: &[ModuleId]) -> BundleResult<String> {
    for &module in order {
        hoist_module(session, module);
    }
    let code = assemble(session, order)?;
    info!("Generated {} bytes of output", code.len());
    Ok(code)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::BundleOptions, deconflict::deconflict, dependency_graph::DependencyGraph,
        graph_builder::GraphBuilder, syntax::squash,
    };

    pub(crate) struct Fixture {
        _dir: TempDir,
        pub(crate) session: BundleSession,
        pub(crate) order: Vec<ModuleId>,
    }

    impl Fixture {
        pub(crate) fn module(&self, file: &str) -> ModuleId {
            self.session
                .modules()
                .find(|module| module.path.file_name().is_some_and(|name| name == file))
                .map(|module| module.id)
                .expect("fixture module exists")
        }
    }

    /// Build and deconflict a graph whose entry is the first file
    pub(crate) fn build(files: &[(&str, &str)]) -> Fixture {
        let dir = TempDir::new().expect("failed to create temp dir");
        for (name, source) in files {
            fs::write(dir.path().join(name), source).expect("failed to write");
        }
        let mut session = BundleSession::new(BundleOptions::default());
        GraphBuilder::new(&mut session)
            .build(&dir.path().join(files[0].0))
            .expect("graph should build");
        let order = DependencyGraph::from_session(&session).execution_order();
        deconflict(&mut session, &order);
        Fixture {
            _dir: dir,
            session,
            order,
        }
    }

    #[test]
    fn test_generate_orders_imports_helper_and_modules() {
        let mut fixture = build(&[
            (
                "index.js",
                "import * as ns from './lib.js';\nimport { helper } from 'helpers';\nhelper(ns);\n",
            ),
            ("lib.js", "export const x = 1;\nexport * from 'extra';\n"),
        ]);
        let order = fixture.order.clone();
        let code = generate(&mut fixture.session, &order).expect("bundle should generate");
        let code = squash(&code).replace('\'', "\"");

        let helper_import = code
            .find("import{helper}from\"helpers\";")
            .expect("named external import");
        let extra_import = code
            .find("import*asextrafrom\"extra\";")
            .expect("namespace import of the star source");
        let helper = code
            .find("function_mergeNamespaces(n,m)")
            .expect("merge helper");
        let lib = code.find("constx=1;").expect("lib body");
        let namespace = code
            .find("constns=_mergeNamespaces({\"x\":x},[extra]);")
            .expect("merged namespace");
        let entry = code.find("helper(ns);").expect("entry body");

        // Externals keep first-encounter order; lib.js is loaded first
        assert!(extra_import < helper_import);
        assert!(helper_import < helper);
        assert!(helper < lib);
        assert!(lib < namespace);
        assert!(namespace < entry);
    }

    #[test]
    fn test_entry_shebang_is_kept() {
        let mut fixture = build(&[("cli.js", "#!/usr/bin/env node\nconsole.log(1);\n")]);
        let order = fixture.order.clone();
        let code = generate(&mut fixture.session, &order).expect("bundle should generate");
        assert!(code.starts_with("#!/usr/bin/env node"), "got: {code}");
    }
}
