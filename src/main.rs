mod config;
mod context;
mod diff;
mod idl;
mod input;
mod reconcile;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::context::Diagnostics;
use crate::idl::Grammar;
use crate::reconcile::{Engine, WorkingTree};

/// iid-check: reads a unified diff of interface-definition files on stdin
/// and reports every interface whose signature changed while its IID stayed
/// the same.
///
/// The working tree must be checked out at the diff's end revision.
#[derive(Parser, Debug)]
#[command(name = "iid-check", version, about)]
struct Cli {
    /// Root of the working tree the diff's paths are relative to
    tree: PathBuf,

    /// Config file to use instead of <TREE>/.iid-check.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Optional output file path for a markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _main_span = info_span!("iid_check", tree = %cli.tree.display()).entered();

    input::check_tree_root(&cli.tree)?;

    info!("loading configuration");
    let config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load(&cli.tree)?,
    };
    let extensions = config.normalized_extensions();
    debug!(extensions = ?extensions, descriptors = config.descriptors.len(), "configuration loaded");

    info!("reading diff from stdin");
    let diff_text = input::read_diff(std::io::stdin().lock())?;
    debug!(diff_bytes = diff_text.len(), "read diff");

    let grammar = Grammar::new(&config.descriptor_table())?;
    let resolver = WorkingTree::new(&cli.tree);
    let engine = Engine::new(&grammar, &resolver);

    info!("reconciling interfaces");
    let mut diagnostics = Diagnostics::new();
    let outcomes = engine.run(&diff_text, &extensions, &mut diagnostics);

    let built_report = report::build(outcomes, diagnostics.into_warnings());
    report::output(&built_report, cli.output.as_deref())?;
    info!(
        files = built_report.summary.files_checked,
        compared = built_report.summary.interfaces_compared,
        flagged = built_report.summary.flagged,
        warnings = built_report.summary.warnings,
        "done"
    );

    Ok(())
}
