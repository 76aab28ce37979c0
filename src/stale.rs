//! Staleness oracle.
//!
//! Decides, from filesystem modification times, whether a document's
//! artifact must be rebuilt and which bibliography backend (if any) the
//! build needs. Comparisons happen at whole-second granularity; sub-second
//! differences are not distinguished.

use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::config::{BuildConfig, ToolSet};
use crate::error::BuildError;
use crate::logger::{artifact_label, BuildLog};
use crate::scan::{self, CompilerBackend};

/// Bibliography generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BibBackend {
    /// Preferred backend; reads a `.bcf` control file.
    Biber,
    /// Legacy backend; reads the `.aux` file.
    Bibtex,
}

impl BibBackend {
    /// Executable for this backend from the tool set.
    pub fn executable<'t>(&self, tools: &'t ToolSet) -> &'t str {
        match self {
            Self::Biber => &tools.biber,
            Self::Bibtex => &tools.bibtex,
        }
    }

    /// Control file read by this backend, derived from the document's stem.
    pub fn control_file(&self, stem: &str) -> String {
        match self {
            Self::Biber => format!("{stem}.bcf"),
            Self::Bibtex => format!("{stem}.aux"),
        }
    }
}

/// The per-document build decision.
///
/// Computed exactly once per run and used unchanged by the whole pipeline;
/// staleness is never re-checked mid-build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildDecision {
    /// The artifact is up to date; no pipeline run is needed.
    pub skip: bool,
    /// Bibliography backend to invoke, if the document declares resources.
    pub bibliography: Option<BibBackend>,
    /// Typesetting compiler backend.
    pub compiler: CompilerBackend,
}

/// Decide whether `artifact` is stale relative to `document` and the
/// bibliography resources it declares.
///
/// The build is skippable only when the artifact exists and is at least as
/// new as the document and every declared dependency. A missing dependency
/// is warned about and forces a rebuild attempt.
pub fn decide(
    document: &Path,
    artifact: &Path,
    config: &BuildConfig,
    log: &dyn BuildLog,
) -> Result<BuildDecision, BuildError> {
    let label = artifact_label(artifact);
    let report = scan::scan(document, &config.patterns)?;

    let bibliography = if report.bib_resources.is_empty() {
        None
    } else if report.bibtex_directive {
        Some(BibBackend::Bibtex)
    } else {
        Some(BibBackend::Biber)
    };

    let skip = match mtime_secs(artifact, &label, log) {
        None => false,
        Some(artifact_time) => match mtime_secs(document, &label, log) {
            None => false,
            Some(doc_time) if doc_time > artifact_time => false,
            Some(_) => report.bib_resources.iter().all(|dep| {
                match mtime_secs(dep, &label, log) {
                    Some(dep_time) => dep_time <= artifact_time,
                    None => {
                        log.warn(
                            &label,
                            &format!(
                                "warning: missing bibliography dependency {}",
                                artifact_label(dep)
                            ),
                        );
                        false
                    }
                }
            }),
        },
    };

    Ok(BuildDecision {
        skip,
        bibliography,
        compiler: report.compiler(),
    })
}

/// Modification time of `path` as whole Unix seconds.
///
/// A missing path yields `None` silently; any other stat failure is
/// reported and likewise treated as "no information".
fn mtime_secs(path: &Path, label: &str, log: &dyn BuildLog) -> Option<u64> {
    match fs::metadata(path) {
        Ok(meta) => match meta.modified() {
            Ok(time) => time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs()),
            Err(e) => {
                log.warn(
                    label,
                    &format!("warning: no modification time for {}: {e}", path.display()),
                );
                None
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            log.warn(
                label,
                &format!("warning: failed to stat {}: {e}", path.display()),
            );
            None
        }
    }
}
