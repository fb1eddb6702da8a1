use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::debug;
use rebundle::{Config, bundle};

/// Bundle an ES module graph into a single scope-hoisted file
#[derive(Parser, Debug)]
#[command(name = "rebundle", version, about)]
struct Cli {
    /// Entry module; falls back to `entry` from the config file
    entry: Option<PathBuf>,

    /// Output file; the bundle goes to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print compact output without comments
    #[arg(long)]
    minify: bool,

    /// Keep unused declarations and exports
    #[arg(long)]
    no_treeshake: bool,

    /// Config file to use instead of ./rebundle.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print bundle statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("rebundle={level}")),
    )
    .format_timestamp(None)
    .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.minify {
        config.minify = true;
    }
    if cli.no_treeshake {
        config.treeshake = false;
    }
    debug!("Configuration: {config:?}");

    let entry = cli
        .entry
        .or_else(|| config.entry.clone())
        .context("No entry module given; pass one or set `entry` in rebundle.toml")?;
    let output = cli.output.or_else(|| config.output.clone());

    let result = bundle(&entry, output.as_deref(), &config.bundle_options())
        .with_context(|| format!("Failed to bundle {}", entry.display()))?;

    // Warnings were logged as they were raised
    debug!("{} warnings", result.warnings.len());

    if output.is_none() {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(result.code.as_bytes())
            .context("Failed to write bundle to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    }

    if cli.stats {
        writeln!(io::stderr(), "{}", result.stats).context("Failed to write statistics")?;
    }

    Ok(())
}
