//! Bundle orchestration
//!
//! One call to [`bundle`] runs every phase in sequence over a fresh
//! [`BundleSession`]: graph construction, ordering, tree shaking,
//! deconfliction, hoisting and assembly. A fatal error in any phase aborts
//! the run before anything is written.

use std::{
    fmt, fs,
    path::Path,
    time::{Duration, Instant},
};

use log::{debug, info};

use crate::{
    code_generator::generate,
    config::BundleOptions,
    deconflict::deconflict,
    dependency_graph::DependencyGraph,
    error::{BundleError, BundleResult, Warning},
    graph_builder::GraphBuilder,
    session::BundleSession,
    tree_shaking::shake,
};

/// Figures describing one bundle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStats {
    /// Bytes of source text read
    pub input_size: usize,
    /// Bytes of bundle text produced
    pub output_size: usize,
    pub duration: Duration,
    pub module_count: usize,
    pub external_count: usize,
    pub minify: bool,
    pub treeshake: bool,
}

impl fmt::Display for BundleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Modules:     {}", self.module_count)?;
        writeln!(f, "Externals:   {}", self.external_count)?;
        writeln!(f, "Input size:  {} bytes", self.input_size)?;
        writeln!(f, "Output size: {} bytes", self.output_size)?;
        writeln!(f, "Minify:      {}", self.minify)?;
        writeln!(f, "Treeshake:   {}", self.treeshake)?;
        write!(f, "Duration:    {:.2?}", self.duration)
    }
}

/// A successful bundle run
#[derive(Debug)]
pub struct BundleOutput {
    pub code: String,
    pub stats: BundleStats,
    /// Non-fatal diagnostics in the order they were raised
    pub warnings: Vec<Warning>,
}

/// Bundle the module graph rooted at `entry` into one program.
///
/// When `output` is given the code is also written there, but only once
/// every phase has succeeded.
pub fn bundle(
    entry: &Path,
    output: Option<&Path>,
    options: &BundleOptions,
) -> BundleResult<BundleOutput> {
    let start = Instant::now();
    let mut session = BundleSession::new(options.clone());

    info!("Bundling {}", entry.display());
    let entry_id = GraphBuilder::new(&mut session).build(entry)?;
    let graph = DependencyGraph::from_session(&session);
    let order = graph.execution_order();
    info!(
        "Resolved {} modules and {} external modules",
        graph.module_count(),
        session.externals().count()
    );
    debug!(
        "Execution order: {}",
        order
            .iter()
            .map(|id| session.module(*id).path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    debug_assert_eq!(order.last(), Some(&entry_id));

    if options.treeshake {
        shake(&mut session);
    } else {
        debug!("Tree shaking disabled");
    }

    deconflict(&mut session, &order);

    let input_size = session.modules().map(|module| module.source_len).sum();
    let module_count = session.module_count();
    let external_count = session.externals().count();

    let code = generate(&mut session, &order)?;

    if let Some(output) = output {
        fs::write(output, &code).map_err(|source| BundleError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        info!("Wrote bundle to {}", output.display());
    }

    let stats = BundleStats {
        input_size,
        output_size: code.len(),
        duration: start.elapsed(),
        module_count,
        external_count,
        minify: options.minify,
        treeshake: options.treeshake,
    };
    let warnings = session.take_warnings();
    info!(
        "Bundled {module_count} modules into {} bytes in {:.2?} with {} warnings",
        stats.output_size,
        stats.duration,
        warnings.len()
    );

    Ok(BundleOutput {
        code,
        stats,
        warnings,
    })
}
