//! Build configuration.
//!
//! [`ScanPatterns`] holds the compiled line patterns the dependency scanner
//! recognizes; [`BuildConfig`] carries everything else a build run needs:
//! file extensions, the worker-pool bound, and the external tool names.
//! Both are plain values passed where needed — no process-global state.

use std::path::{Path, PathBuf};

use regex::Regex;
use rustc_hash::FxHashSet;

/// Line patterns recognized by the dependency scanner.
///
/// The base set knows bibliography resource declarations, the legacy
/// bibliography directive, and package inclusions. Two package names force
/// the alternate compiler backend out of the box; more can be registered.
///
/// # Example
///
/// ```ignore
/// let patterns = ScanPatterns::default()
///     .with_alt_backend_package("luacode");
/// ```
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    pub(crate) bib_resource: Regex,
    pub(crate) bib_legacy: Regex,
    pub(crate) use_package: Regex,
    alt_backend_packages: Vec<String>,
}

impl Default for ScanPatterns {
    fn default() -> Self {
        Self {
            bib_resource: Regex::new(r"\\addbibresource\{(.+)\}").unwrap(),
            bib_legacy: Regex::new(r"\\bibliography\{(.+)\}").unwrap(),
            use_package: Regex::new(r"\\usepackage\{(.+)\}").unwrap(),
            alt_backend_packages: vec!["unicode-math".into(), "fontspec".into()],
        }
    }
}

impl ScanPatterns {
    /// Register another package name that forces the alternate compiler
    /// backend.
    pub fn with_alt_backend_package(mut self, name: impl Into<String>) -> Self {
        self.alt_backend_packages.push(name.into());
        self
    }

    pub(crate) fn is_alt_backend_package(&self, name: &str) -> bool {
        self.alt_backend_packages.iter().any(|pkg| pkg == name)
    }
}

/// Names (or paths) of the external executables the pipeline drives.
///
/// Overridable so embedders and tests can substitute their own tools.
#[derive(Debug, Clone)]
pub struct ToolSet {
    /// Default typesetting compiler.
    pub pdflatex: String,
    /// Alternate compiler for documents using lualatex-only packages.
    pub lualatex: String,
    /// Preferred bibliography backend.
    pub biber: String,
    /// Legacy bibliography backend.
    pub bibtex: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            pdflatex: "pdflatex".into(),
            lualatex: "lualatex".into(),
            biber: "biber".into(),
            bibtex: "bibtex".into(),
        }
    }
}

/// Configuration for a build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Extension of source documents, without the dot.
    pub source_ext: String,
    /// Extension of compiled artifacts, without the dot.
    pub artifact_ext: String,
    /// Intermediate extensions a single clean pass is expected to leave
    /// behind. Anything else sharing a document's base name signals that
    /// another pass is needed.
    pub intermediate_exts: Vec<String>,
    /// Worker-pool size; `None` uses rayon's default.
    pub jobs: Option<usize>,
    /// External tool names.
    pub tools: ToolSet,
    /// Scanner line patterns.
    pub patterns: ScanPatterns,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_ext: "tex".into(),
            artifact_ext: "pdf".into(),
            intermediate_exts: vec!["aux".into(), "log".into()],
            jobs: None,
            tools: ToolSet::default(),
            patterns: ScanPatterns::default(),
        }
    }
}

impl BuildConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the worker pool to `jobs` concurrent document builds.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Replace the external tool names.
    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Replace the scanner patterns.
    pub fn with_patterns(mut self, patterns: ScanPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Default artifact path for a document: same stem, artifact extension.
    pub fn artifact_path(&self, document: &Path) -> PathBuf {
        document.with_extension(&self.artifact_ext)
    }

    /// Extensions a single clean pass is expected to leave behind,
    /// including the source and artifact extensions themselves.
    pub(crate) fn expected_exts(&self) -> FxHashSet<&str> {
        let mut set: FxHashSet<&str> = self
            .intermediate_exts
            .iter()
            .map(String::as_str)
            .collect();
        set.insert(self.source_ext.as_str());
        set.insert(self.artifact_ext.as_str());
        set
    }
}
