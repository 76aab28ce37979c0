//! Dependency scanner.
//!
//! Extracts, from a source document's text, the bibliography resources it
//! references and which backends its build needs. The matching is
//! deliberately line-oriented and naive: patterns are recognized wherever
//! they appear, comments included, and the document grammar is never
//! parsed. Documents are re-scanned on every run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::config::{ScanPatterns, ToolSet};
use crate::error::BuildError;

/// Typesetting compiler backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerBackend {
    /// Default backend.
    Pdflatex,
    /// Required by documents using fontspec-style packages.
    Lualatex,
}

impl CompilerBackend {
    /// Executable for this backend from the tool set.
    pub fn executable<'t>(&self, tools: &'t ToolSet) -> &'t str {
        match self {
            Self::Pdflatex => &tools.pdflatex,
            Self::Lualatex => &tools.lualatex,
        }
    }
}

/// What a scan of one document found.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Bibliography resources, resolved relative to the document's
    /// directory, in order of appearance.
    pub bib_resources: Vec<PathBuf>,
    /// A legacy bibliography directive was seen.
    pub bibtex_directive: bool,
    /// A package requiring the alternate compiler backend was seen.
    pub requires_alt_backend: bool,
}

impl ScanReport {
    /// Compiler backend this document needs.
    pub fn compiler(&self) -> CompilerBackend {
        if self.requires_alt_backend {
            CompilerBackend::Lualatex
        } else {
            CompilerBackend::Pdflatex
        }
    }
}

/// Scan a document for bibliography resources and backend requirements.
///
/// An unreadable document is fatal to that document's build.
pub fn scan(document: &Path, patterns: &ScanPatterns) -> Result<ScanReport, BuildError> {
    let file = File::open(document).map_err(|e| BuildError::source_read(document, e))?;
    let dir = document.parent().unwrap_or_else(|| Path::new("."));

    let mut report = ScanReport::default();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| BuildError::source_read(document, e))?;
        if let Some(caps) = patterns.bib_resource.captures(&line) {
            report.bib_resources.push(dir.join(&caps[1]));
        } else if let Some(caps) = patterns.bib_legacy.captures(&line) {
            report.bib_resources.push(dir.join(&caps[1]));
            report.bibtex_directive = true;
        }
        if let Some(caps) = patterns.use_package.captures(&line)
            && patterns.is_alt_backend_package(&caps[1])
        {
            report.requires_alt_backend = true;
        }
    }
    Ok(report)
}
