//! Build scheduler.
//!
//! Discovers candidate documents, asks the staleness oracle about each
//! one, and fans stale documents out across a bounded worker pool. Every
//! spawned build is joined before a run returns; one document's failure is
//! reported through the log sink and never cancels its siblings.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::ThreadPool;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::logger::{artifact_label, BuildLog};
use crate::pipeline;
use crate::stale;

/// Runs document builds across a worker pool.
///
/// # Example
///
/// ```ignore
/// let log = ConsoleLog::new();
/// let scheduler = Scheduler::new(BuildConfig::default().with_jobs(4), &log)?;
/// scheduler.run_tree(Path::new("."));
/// ```
pub struct Scheduler<'log> {
    config: BuildConfig,
    log: &'log dyn BuildLog,
    pool: ThreadPool,
}

impl<'log> Scheduler<'log> {
    /// Create a scheduler whose pool size comes from the config's `jobs`.
    pub fn new(config: BuildConfig, log: &'log dyn BuildLog) -> Result<Self, BuildError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = config.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build()?;
        Ok(Self { config, log, pool })
    }

    /// Build every stale document under `root`.
    ///
    /// Decisions are made up front, one per document; each stale document
    /// becomes one build unit on the pool. Returns once every unit has
    /// finished.
    pub fn run_tree(&self, root: &Path) {
        self.pool.scope(|scope| {
            for document in discover(root, &self.config) {
                let artifact = self.config.artifact_path(&document);
                let label = artifact_label(&artifact);
                let decision =
                    match stale::decide(&document, &artifact, &self.config, self.log) {
                        Ok(decision) => decision,
                        Err(e) => {
                            self.log.warn(&label, &e.to_string());
                            continue;
                        }
                    };
                if decision.skip {
                    continue;
                }

                self.log.line(&label, "building");
                let config = &self.config;
                let log = self.log;
                scope.spawn(move |_| {
                    if let Err(e) = pipeline::run(&document, &decision, config, log) {
                        log.warn(&label, &e.to_string());
                    }
                });
            }
        });
    }

    /// Build a single document, honoring an optional artifact override.
    ///
    /// When the oracle says the artifact is current, reports it as up to
    /// date and runs nothing. Otherwise one build unit runs on the pool and
    /// is waited for.
    pub fn run_single(
        &self,
        document: &Path,
        artifact: Option<&Path>,
    ) -> Result<(), BuildError> {
        let artifact = match artifact {
            Some(path) => path.to_path_buf(),
            None => self.config.artifact_path(document),
        };
        let label = artifact_label(&artifact);

        let decision = stale::decide(document, &artifact, &self.config, self.log)?;
        if decision.skip {
            self.log.line(&label, "up to date");
            return Ok(());
        }

        self.pool
            .install(|| pipeline::run(document, &decision, &self.config, self.log))
    }

    /// Remove the artifact of every document under `root`.
    ///
    /// Already-absent artifacts are skipped silently; other removal errors
    /// are reported and the sweep continues.
    pub fn clean(&self, root: &Path) {
        for document in discover(root, &self.config) {
            let artifact = self.config.artifact_path(&document);
            let label = artifact_label(&artifact);
            match fs::remove_file(&artifact) {
                Ok(()) => self.log.line(&label, "deleted"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => self.log.warn(&label, &format!("failed to delete: {e}")),
            }
        }
    }
}

/// Every source document under `root`, in traversal order.
///
/// Entries that error during traversal are skipped; the walk continues.
pub fn discover(root: &Path, config: &BuildConfig) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension() == Some(OsStr::new(&config.source_ext)))
        .collect()
}
