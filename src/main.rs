use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use tex_batch::{BuildConfig, ConsoleLog, Scheduler};

/// Incremental LaTeX batch builder.
///
/// With a document argument, builds that one document if it is stale.
/// Without one, walks the current directory tree and rebuilds every stale
/// document it finds, in parallel.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Source document to build; omit to build the whole tree.
    document: Option<PathBuf>,

    /// Artifact path override (single-document mode only).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Delete the artifacts of all discovered documents instead of
    /// building.
    #[arg(long)]
    clean: bool,

    /// Maximum number of concurrent document builds.
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BuildConfig::default();
    if let Some(jobs) = cli.jobs {
        config = config.with_jobs(jobs);
    }

    if let Some(document) = &cli.document
        && document.extension() != Some(OsStr::new(&config.source_ext))
    {
        bail!(
            "{} is not a .{} document",
            document.display(),
            config.source_ext
        );
    }

    let log = ConsoleLog::new();
    let root = PathBuf::from(".");
    let scheduler = Scheduler::new(config, &log)?;

    if cli.clean {
        scheduler.clean(&root);
        return Ok(());
    }

    match &cli.document {
        Some(document) => scheduler.run_single(document, cli.output.as_deref())?,
        None => scheduler.run_tree(&root),
    }

    Ok(())
}
