//! rebundle: scope-hoisting bundler for ES module graphs
//!
//! Starting from an entry file, every relatively imported module is merged
//! into one program scope. Unused declarations are removed, colliding
//! top-level names are renamed apart and external packages stay as hoisted
//! `import` statements.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rebundle::{BundleOptions, bundle};
//!
//! let output = bundle(Path::new("src/index.js"), None, &BundleOptions::default())?;
//! println!("{}", output.code);
//! # Ok::<(), rebundle::BundleError>(())
//! ```

pub mod analyzer;
pub mod ast_builder;
pub mod code_generator;
pub mod config;
pub mod deconflict;
pub mod dependency_graph;
pub mod error;
pub mod graph_builder;
pub mod module_graph;
pub mod orchestrator;
pub mod resolver;
pub mod session;
pub mod syntax;
pub mod tree_shaking;
pub mod util;
pub mod visitors;

pub use config::{BundleOptions, Config};
pub use error::{BundleError, BundleResult, Warning};
pub use orchestrator::{BundleOutput, BundleStats, bundle};
